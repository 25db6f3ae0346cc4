//! Per-cell lock strategies.
//!
//! A [`LockingGrid`](crate::LockingGrid) stores one slot per cell and only
//! ever touches it through [`CellLock`]. Three strategies ship with the
//! crate:
//!
//! | strategy      | slot                  | contention behaviour                        |
//! |---------------|-----------------------|---------------------------------------------|
//! | [`FlagLock`]  | `AtomicBool`          | fails immediately                           |
//! | [`OwnerLock`] | `AtomicU32` owner id  | lower id waits for higher id, else fails    |
//! | [`MutexLock`] | `parking_lot` mutex   | fails immediately (`try_lock`)              |
//!
//! Re-entrancy is never handled here: the grid checks the calling thread's
//! held-set before asking the slot.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crossbeam::utils::Backoff;
use parking_lot::lock_api::RawMutex as _;

/// Identity of a thread within one grid. `0` is never handed out.
pub type OwnerId = u32;

/// Lock primitive stored once per grid cell.
pub trait CellLock: Send + Sync {
    /// Short name used in logs and benchmarks.
    const NAME: &'static str;

    /// A free slot.
    fn new() -> Self;

    /// Try to claim the slot for `owner`. Returns `true` on success.
    fn try_acquire(&self, owner: OwnerId) -> bool;

    /// Free the slot.
    ///
    /// # Safety
    ///
    /// The slot must currently be held by `owner` through a successful
    /// [`try_acquire`](CellLock::try_acquire).
    unsafe fn release(&self, owner: OwnerId);

    /// Whether any thread currently holds the slot.
    fn is_locked(&self) -> bool;
}

/// Boolean slot claimed with a compare-and-swap.
#[derive(Debug, Default)]
pub struct FlagLock(AtomicBool);

impl CellLock for FlagLock {
    const NAME: &'static str = "flag";

    fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    #[inline]
    fn try_acquire(&self, _owner: OwnerId) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    unsafe fn release(&self, _owner: OwnerId) {
        self.0.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Slot holding the owner's id, with id precedence on contention.
///
/// A thread that finds the cell held by a *higher* id keeps retrying with
/// [`Backoff`] until the holder lets go. Against a lower-id holder it fails
/// at once. Waits only ever point from a lower id to a higher one, so no
/// cycle of waiting threads can form; the highest contender never waits.
#[derive(Debug, Default)]
pub struct OwnerLock(AtomicU32);

impl OwnerLock {
    /// Current holder, `None` when free.
    pub fn owner(&self) -> Option<OwnerId> {
        match self.0.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        }
    }
}

impl CellLock for OwnerLock {
    const NAME: &'static str = "owner";

    fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    fn try_acquire(&self, owner: OwnerId) -> bool {
        debug_assert_ne!(owner, 0, "owner id 0 marks a free cell");
        let backoff = Backoff::new();
        loop {
            match self
                .0
                .compare_exchange(0, owner, Ordering::Acquire, Ordering::Relaxed)
            {
                Ok(_) => return true,
                Err(holder) if holder > owner => backoff.snooze(),
                Err(_) => return false,
            }
        }
    }

    #[inline]
    unsafe fn release(&self, owner: OwnerId) {
        debug_assert_eq!(self.0.load(Ordering::Relaxed), owner);
        self.0.store(0, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.0.load(Ordering::Relaxed) != 0
    }
}

/// Slot backed by a `parking_lot` raw mutex.
///
/// `thread_local` hands an exited thread's per-grid slot to the next new
/// thread, and that thread inherits whatever cells were still held. It may
/// then unlock mutexes locked on a thread that no longer exists. The crate
/// builds `parking_lot` with `send_guard`, which makes that a valid unlock.
/// Workers should still call
/// [`unlock_all_held`](crate::LockingGrid::unlock_all_held) before exiting.
pub struct MutexLock(parking_lot::RawMutex);

/// Compiles only while `parking_lot` allows unlocking from another thread.
const _: fn() = unlock_from_any_thread::<parking_lot::RawMutex>;

const fn unlock_from_any_thread<M>()
where
    M: parking_lot::lock_api::RawMutex<GuardMarker = parking_lot::lock_api::GuardSend>,
{
}

impl CellLock for MutexLock {
    const NAME: &'static str = "mutex";

    fn new() -> Self {
        Self(parking_lot::RawMutex::INIT)
    }

    #[inline]
    fn try_acquire(&self, _owner: OwnerId) -> bool {
        self.0.try_lock()
    }

    #[inline]
    unsafe fn release(&self, _owner: OwnerId) {
        // SAFETY: forwarded from the caller, the mutex is held. With
        // `send_guard` it need not have been locked on this thread.
        unsafe { self.0.unlock() };
    }

    fn is_locked(&self) -> bool {
        self.0.is_locked()
    }
}

impl std::fmt::Debug for MutexLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MutexLock").field(&self.is_locked()).finish()
    }
}
