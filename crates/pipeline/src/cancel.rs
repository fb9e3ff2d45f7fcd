//! Cooperative cancellation between time steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cyclone_common::{CycloneError, CycloneResult, Stamp};

/// Shared cancel flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with [`CycloneError::Cancelled`] once cancellation was requested.
    pub fn check(&self, next: &Stamp) -> CycloneResult<()> {
        if self.is_cancelled() {
            return Err(CycloneError::Cancelled(next.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let token = CancelToken::new();
        let worker = token.clone();
        let stamp = Stamp::new(1979, 1, 1, 6);
        assert!(worker.check(&stamp).is_ok());
        token.cancel();
        let err = worker.check(&stamp).unwrap_err();
        assert!(err.to_string().contains("1979010106"));
        assert_eq!(err.exit_code(), 2);
    }
}
