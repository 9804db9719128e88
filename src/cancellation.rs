/*!
 * Cooperative cancellation token.
 *
 * A single shared flag passed explicitly into every long-running call.
 * Cancellation is cooperative: in-flight API calls run to completion, but
 * no new work is submitted and no new attempts are started once the token
 * is set.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle over a shared stop flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag at the start of a new run
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
