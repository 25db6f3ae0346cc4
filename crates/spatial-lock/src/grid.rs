//! The spatial locking grid.

use std::fmt;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::local::{LocalCells, ThreadCells};
use crate::{
    Bbox3, CellCoord, CellId, CellIndexer, CellLock, FlagLock, GridResult, OwnerId, Point3, Region,
};

/// Outcome of [`LockingGrid::try_lock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct RegionLock {
    /// Every cell of the region is now held by the calling thread.
    pub success: bool,
    /// Cell containing the query point, reported on failure too.
    pub cell: CellId,
}

impl From<RegionLock> for (bool, CellId) {
    fn from(lock: RegionLock) -> Self {
        (lock.success, lock.cell)
    }
}

/// Result of claiming one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Claim {
    /// This thread already held it.
    Reentered,
    /// Newly taken by this call.
    Acquired,
    /// Held by another thread.
    Contended,
}

/// Grid of per-cell locks over a bounding box.
///
/// Worker threads lock the cells around the points they are about to
/// modify, do their work, then release. Every lock call is a *try*: on
/// contention it returns `false` and leaves nothing behind, and the caller
/// decides whether to retry.
///
/// Each thread's held cells are tracked privately, which makes locking
/// re-entrant per thread and lets [`unlock_all_held`](Self::unlock_all_held)
/// release everything a task acquired.
///
/// ```
/// use spatial_lock::{Bbox3, RefinementGrid};
///
/// let grid = RefinementGrid::new(Bbox3::cube(0.0, 10.0), 10)?;
/// let lock = grid.try_lock(&[5.5, 5.5, 5.5], 1);
/// assert!(lock.success);
/// assert_eq!(grid.held_count(), 27);
///
/// grid.unlock_all_held();
/// assert!(grid.all_released());
/// # Ok::<(), spatial_lock::GridError>(())
/// ```
pub struct LockingGrid<L: CellLock = FlagLock> {
    indexer: CellIndexer,
    cells: Box<[L]>,
    threads: ThreadCells,
}

/// The grid used by default for parallel refinement.
pub type RefinementGrid = LockingGrid<FlagLock>;

impl<L: CellLock> LockingGrid<L> {
    /// Create a grid of `resolution³` free cells covering `bbox`.
    pub fn new(bbox: Bbox3, resolution: u32) -> GridResult<Self> {
        let indexer = CellIndexer::new(bbox, resolution)?;
        let num_cells = indexer.num_cells();
        let cells = (0..num_cells).map(|_| L::new()).collect();

        debug!(
            strategy = L::NAME,
            resolution, num_cells, "created spatial locking grid"
        );

        Ok(Self {
            indexer,
            cells,
            threads: ThreadCells::new(num_cells),
        })
    }

    /// Cells per axis.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.indexer.resolution()
    }

    /// Total number of cells.
    #[must_use]
    pub const fn num_cells(&self) -> usize {
        self.indexer.num_cells()
    }

    /// Bounding box the grid partitions.
    #[must_use]
    pub const fn bbox(&self) -> &Bbox3 {
        self.indexer.bbox()
    }

    /// Point-to-cell mapping used by every lock call.
    #[must_use]
    pub const fn indexer(&self) -> &CellIndexer {
        &self.indexer
    }

    /// Cell coordinate containing `point`, clamped to the grid.
    pub fn cell_coord<P: Point3>(&self, point: &P) -> CellCoord {
        self.indexer.coord_of(point)
    }

    /// Cell containing `point`, clamped to the grid.
    pub fn cell_of<P: Point3>(&self, point: &P) -> CellId {
        self.indexer.cell_of(point)
    }

    /// World-space bounds of `cell`.
    #[must_use]
    pub fn cell_bounds(&self, cell: CellId) -> Bbox3 {
        self.indexer.cell_bounds(cell)
    }

    /// Cells a `try_lock(point, radius)` call would attempt, in scan order.
    pub fn region<P: Point3>(&self, point: &P, radius: u32) -> Region {
        self.indexer.region(self.indexer.coord_of(point), radius)
    }

    /// The calling thread's precedence id on this grid.
    pub fn owner_id(&self) -> OwnerId {
        self.threads.current().borrow().owner
    }

    fn claim(&self, local: &mut LocalCells, cell: CellId) -> Claim {
        if local.holds(cell) {
            return Claim::Reentered;
        }
        if self.cells[cell.index()].try_acquire(local.owner) {
            local.insert(cell);
            Claim::Acquired
        } else {
            Claim::Contended
        }
    }

    fn release(&self, local: &mut LocalCells, cell: CellId) -> bool {
        if !local.holds(cell) {
            return false;
        }
        // SAFETY: the held-set only marks cells acquired under this slot's
        // owner id, and `send_guard` lets any thread unlock a held mutex.
        unsafe { self.cells[cell.index()].release(local.owner) };
        local.remove(cell);
        true
    }

    /// Try to lock a single cell for the calling thread.
    ///
    /// Returns `true` immediately if the thread already holds it. Only the
    /// [`OwnerLock`](crate::OwnerLock) strategy ever waits, and only on a
    /// holder with a higher id.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not below [`num_cells`](Self::num_cells).
    pub fn try_lock_cell(&self, cell: CellId) -> bool {
        let mut local = self.threads.current().borrow_mut();
        self.claim(&mut local, cell) != Claim::Contended
    }

    /// Try to lock every cell within `radius` cells of `point`'s cell.
    ///
    /// All or nothing: on the first contended cell, every cell of the cube
    /// claimed so far is released again in scan order and `success` is
    /// `false`. That includes cells the thread already held before the call,
    /// so after a failure the thread holds none of the cube and a plain
    /// retry cannot keep a waiting lower-id thread out.
    pub fn try_lock<P: Point3>(&self, point: &P, radius: u32) -> RegionLock {
        let center = self.indexer.coord_of(point);
        let cell = self.indexer.linearize(center);

        if radius == 0 {
            return RegionLock {
                success: self.try_lock_cell(cell),
                cell,
            };
        }

        let mut local = self.threads.current().borrow_mut();
        let mut claimed: SmallVec<[CellId; 27]> = SmallVec::new();

        for target in self.indexer.region(center, radius) {
            match self.claim(&mut local, target) {
                Claim::Acquired | Claim::Reentered => claimed.push(target),
                Claim::Contended => {
                    trace!(
                        %cell,
                        %target,
                        radius,
                        rolled_back = claimed.len(),
                        "region lock contended"
                    );
                    for &held in &claimed {
                        self.release(&mut local, held);
                    }
                    return RegionLock {
                        success: false,
                        cell,
                    };
                }
            }
        }

        RegionLock {
            success: true,
            cell,
        }
    }

    /// Release the cell containing `point`.
    ///
    /// Only that one cell is released, even if it was locked as part of a
    /// region. Use [`unlock_all_held`](Self::unlock_all_held) to drop a
    /// whole region.
    pub fn unlock<P: Point3>(&self, point: &P) {
        self.unlock_cell(self.indexer.cell_of(point));
    }

    /// Release a cell held by the calling thread.
    ///
    /// Releasing a cell this thread does not hold does nothing.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not below [`num_cells`](Self::num_cells).
    pub fn unlock_cell(&self, cell: CellId) {
        let mut local = self.threads.current().borrow_mut();
        if !self.release(&mut local, cell) {
            warn!(%cell, owner = local.owner, "unlock of a cell not held by this thread");
        }
    }

    /// Release every cell the calling thread holds.
    pub fn unlock_all_held(&self) {
        let mut local = self.threads.current().borrow_mut();
        let order = local.take_order();
        let mut released = 0_usize;

        for &cell in &order {
            // Skip anything already released individually.
            if local.forget(cell) {
                // SAFETY: the flag was set, so this slot's owner holds the cell.
                unsafe { self.cells[cell.index()].release(local.owner) };
                released += 1;
            }
        }

        trace!(owner = local.owner, released, "released all held cells");
    }

    /// Whether the calling thread holds no cell at all.
    ///
    /// Scans the thread's whole map; meant for assertions, not hot paths.
    pub fn all_released(&self) -> bool {
        self.threads.current().borrow().none_held()
    }

    /// Whether the calling thread holds `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not below [`num_cells`](Self::num_cells).
    pub fn holds(&self, cell: CellId) -> bool {
        self.threads.current().borrow().holds(cell)
    }

    /// Number of cells the calling thread holds.
    pub fn held_count(&self) -> usize {
        self.threads.current().borrow().len()
    }

    /// Cells the calling thread holds, in acquisition order.
    pub fn held_cells(&self) -> Vec<CellId> {
        self.threads.current().borrow().order().to_vec()
    }

    /// Whether any thread holds `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not below [`num_cells`](Self::num_cells).
    #[must_use]
    pub fn is_locked(&self, cell: CellId) -> bool {
        self.cells[cell.index()].is_locked()
    }

    /// Number of cells held by any thread.
    #[must_use]
    pub fn locked_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_locked()).count()
    }

    /// Number of threads that have used this grid.
    pub fn thread_count(&mut self) -> usize {
        self.threads.registered()
    }
}

impl<L: CellLock> fmt::Debug for LockingGrid<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockingGrid")
            .field("strategy", &L::NAME)
            .field("resolution", &self.resolution())
            .field("bbox", self.bbox())
            .finish_non_exhaustive()
    }
}
