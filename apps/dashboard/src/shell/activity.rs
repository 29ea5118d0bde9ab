use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

/// The shell's global loading flag: a count of long-running operations
/// (uploads, match requests) currently in flight.
#[derive(Clone, Default)]
pub struct ActivityTracker {
    in_flight: Arc<AtomicUsize>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an operation as running until the returned guard drops.
    pub fn begin(&self, operation: &'static str) -> ActivityGuard {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(operation, in_flight = now, "operation started");
        ActivityGuard {
            in_flight: self.in_flight.clone(),
            operation,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

pub struct ActivityGuard {
    in_flight: Arc<AtomicUsize>,
    operation: &'static str,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        let left = self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(operation = self.operation, in_flight = left, "operation finished");
    }
}
