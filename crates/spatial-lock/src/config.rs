//! Grid configuration.

use serde::{Deserialize, Serialize};

use crate::{Bbox3, CellIndexer, CellLock, GridResult, LockingGrid};

/// Bounding box and resolution of a locking grid.
///
/// Both are fixed for the grid's lifetime. Deserializes from e.g.
///
/// ```json
/// {
///   "bbox": { "xmin": 0, "ymin": 0, "zmin": 0, "xmax": 10, "ymax": 10, "zmax": 10 },
///   "resolution": 10
/// }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    pub bbox: Bbox3,
    /// Cells per axis.
    pub resolution: u32,
}

impl GridConfig {
    /// Config for `resolution` cells per axis over `bbox`.
    #[must_use]
    pub const fn new(bbox: Bbox3, resolution: u32) -> Self {
        Self { bbox, resolution }
    }

    /// Check the configuration describes a buildable grid.
    pub fn validate(&self) -> GridResult<()> {
        CellIndexer::new(self.bbox, self.resolution).map(|_| ())
    }

    /// Build a grid with lock strategy `L`.
    pub fn build<L: CellLock>(&self) -> GridResult<LockingGrid<L>> {
        LockingGrid::new(self.bbox, self.resolution)
    }
}
