// Cell slots are released through `CellLock::release`, which is unsafe for
// the mutex strategy.
#![allow(unsafe_code)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::float_cmp)]

//! Spatial mutual-exclusion grid for parallel mesh refinement.
//!
//! A bounding box is split into `R × R × R` cells, each with its own lock.
//! Worker threads lock the cells around the points they are about to
//! refine and release them when the task is done, so threads working on
//! distant parts of the mesh never touch the same lock.
//!
//! # Key Concepts
//!
//! - **Cell**: one sub-cube of the box, addressed by a [`CellCoord`] or a
//!   linear [`CellId`] (`z·R² + y·R + x`)
//! - **Region lock**: [`LockingGrid::try_lock`] with a radius locks the cube
//!   of `(2r + 1)³` cells around a point, all or nothing
//! - **Held-set**: each thread privately tracks what it holds, making
//!   locks re-entrant and enabling [`LockingGrid::unlock_all_held`]
//! - **Strategy**: the per-cell primitive, one of [`FlagLock`],
//!   [`OwnerLock`] or [`MutexLock`]
//!
//! # Usage
//!
//! ```
//! use spatial_lock::{Bbox3, GridConfig, OwnerLock};
//!
//! let config = GridConfig::new(Bbox3::cube(0.0, 10.0), 10);
//! let grid = config.build::<OwnerLock>()?;
//!
//! std::thread::scope(|s| {
//!     for worker in 0..4 {
//!         let grid = &grid;
//!         s.spawn(move || {
//!             let point = [1.0 + 2.0 * f64::from(worker), 5.0, 5.0];
//!             while !grid.try_lock(&point, 0).success {
//!                 grid.unlock_all_held();
//!                 std::thread::yield_now();
//!             }
//!             // ... modify the mesh around `point` ...
//!             grid.unlock_all_held();
//!             assert!(grid.all_released());
//!         });
//!     }
//! });
//! # Ok::<(), spatial_lock::GridError>(())
//! ```

mod bbox;
mod cell;
mod config;
mod error;
mod grid;
mod local;
mod lock;

pub use bbox::{Axis, Bbox3, Point3};
pub use cell::{CellCoord, CellId, CellIndexer, Region};
pub use config::GridConfig;
pub use error::{GridError, GridResult};
pub use grid::{LockingGrid, RefinementGrid, RegionLock};
pub use lock::{CellLock, FlagLock, MutexLock, OwnerId, OwnerLock};
