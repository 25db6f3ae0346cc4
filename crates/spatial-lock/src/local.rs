//! Per-thread record of held cells.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};

use thread_local::ThreadLocal;

use crate::{CellId, OwnerId};

/// Cells held by one thread.
///
/// `held` answers "do I hold this cell" in O(1); `order` lists the same
/// cells in acquisition order for bulk release.
#[derive(Debug)]
pub(crate) struct LocalCells {
    pub(crate) owner: OwnerId,
    held: Box<[bool]>,
    order: Vec<CellId>,
}

impl LocalCells {
    fn new(owner: OwnerId, num_cells: usize) -> Self {
        Self {
            owner,
            held: vec![false; num_cells].into_boxed_slice(),
            order: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn holds(&self, cell: CellId) -> bool {
        self.held[cell.index()]
    }

    pub(crate) fn insert(&mut self, cell: CellId) {
        debug_assert!(!self.held[cell.index()]);
        self.held[cell.index()] = true;
        self.order.push(cell);
    }

    /// Clear the held flag only. Returns `false` if it was not set.
    pub(crate) fn forget(&mut self, cell: CellId) -> bool {
        std::mem::replace(&mut self.held[cell.index()], false)
    }

    /// Forget `cell` entirely. Returns `false` if it was not held.
    pub(crate) fn remove(&mut self, cell: CellId) -> bool {
        if !self.forget(cell) {
            return false;
        }
        // Releases usually hit the most recent acquisitions.
        if let Some(pos) = self.order.iter().rposition(|&c| c == cell) {
            self.order.remove(pos);
        }
        true
    }

    /// Take the acquisition list, leaving it empty.
    pub(crate) fn take_order(&mut self) -> Vec<CellId> {
        std::mem::take(&mut self.order)
    }

    pub(crate) fn order(&self) -> &[CellId] {
        &self.order
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Full scan of the held map.
    pub(crate) fn none_held(&self) -> bool {
        !self.held.iter().any(|&h| h)
    }
}

/// Lazily created per-thread [`LocalCells`] for one grid.
///
/// Each thread gets its own state on first access, along with an owner id
/// from a grid-wide counter. A slot left by an exited thread may be reused
/// by a later thread, which then continues with that slot's cells and id.
pub(crate) struct ThreadCells {
    inner: ThreadLocal<RefCell<LocalCells>>,
    next_owner: AtomicU32,
    num_cells: usize,
}

impl ThreadCells {
    pub(crate) fn new(num_cells: usize) -> Self {
        Self {
            inner: ThreadLocal::new(),
            next_owner: AtomicU32::new(1),
            num_cells,
        }
    }

    /// The calling thread's state.
    #[inline]
    pub(crate) fn current(&self) -> &RefCell<LocalCells> {
        self.inner.get_or(|| {
            let owner = self.next_owner.fetch_add(1, Ordering::Relaxed);
            RefCell::new(LocalCells::new(owner, self.num_cells))
        })
    }

    /// Number of per-thread slots created so far.
    pub(crate) fn registered(&mut self) -> usize {
        self.inner.iter_mut().count()
    }
}
