//! Cooperative cancellation token.
//!
//! One token is owned by the pipeline per invocation and shared with
//! the retrieval and generation stages. Setting it is idempotent and
//! never cleared within an invocation; stages check it at defined
//! checkpoints and short-circuit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, settable cancellation flag.
///
/// Cloning is cheap and all clones observe the same flag. Cancellation
/// is advisory: an in-flight remote call is not forcibly terminated,
/// but subsequent checkpoints short-circuit and late results are
/// discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new token in the not-cancelled state.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}
