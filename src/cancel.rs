use core::sync::atomic::{AtomicBool, Ordering};

/// Aborts an in-flight blocking measurement.
///
/// The token only needs atomic loads and stores, so it can live in a `static` and be
/// set from an interrupt handler or the other core while a measurement spins on the
/// echo pin. A cancelled measurement reports [`Error::Cancelled`](crate::Error::Cancelled).
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Re-arm the token for the next measurement.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
