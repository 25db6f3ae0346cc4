//! Shared helpers for the integration tests.

use spatial_lock::{Bbox3, CellLock, LockingGrid};
use tracing_subscriber::EnvFilter;

/// Route grid traces to the test output; `RUST_LOG=spatial_lock=trace`
/// shows every rollback.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `[0, 10]³` split into unit cells.
pub fn unit_grid<L: CellLock>() -> LockingGrid<L> {
    init_tracing();
    LockingGrid::new(Bbox3::cube(0.0, 10.0), 10).unwrap()
}

/// Deterministic xorshift stream for picking test points.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1)
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform value in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + unit * (hi - lo)
    }
}
