use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Holds the token of the latest call of one kind. Issuing a new call
/// cancels the previous one first, so at most one call per slot is live.
#[derive(Default)]
pub struct CancelSlot {
    current: Mutex<Option<CancellationToken>>,
}

impl CancelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the in-flight call, if any, and hand out a child of `parent`.
    /// The child is cancelled by either the caller or the next call.
    pub fn replace(&self, parent: &CancellationToken) -> CancellationToken {
        let token = parent.child_token();
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }

        token
    }

    /// Cancel the in-flight call without starting a new one
    pub fn cancel(&self) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = current.take() {
            previous.cancel();
        }
    }
}
