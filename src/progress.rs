//! Cooperative cancellation for long-running store operations.

use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};

use crate::store::StoreError;

/// Shared cancellation flag.
///
/// Clones observe the same flag. Stores and suppliers check it between units
/// of work (files, stores) and stop with [`StoreError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    /// Set once [`CancellationToken::cancel`] has been called
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// # Errors
    /// [`StoreError::Cancelled`] once the token has been cancelled.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.is_cancelled() { Err(StoreError::Cancelled) } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();

        expect_that!(clone.check(), ok(anything()));

        token.cancel();

        expect_that!(clone.is_cancelled(), eq(true));
        expect_that!(clone.check(), err(anything()));
    }
}
