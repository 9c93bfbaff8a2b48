//! Task bookkeeping for spawned commands.
//!
//! A `TaskHandle` pairs the generation of a command run with the
//! `CancellationToken` of that run. The owning command is implied by where
//! the handle is stored.

use tokio_util::sync::CancellationToken;

/// Handle to a spawned command run with cooperative cancellation.
///
/// Cancelling only signals the token; the run stops at its next await point
/// because `StateCtx` races every command future against `cancelled()`.
/// Of two runs of the same command, the higher generation is the more recent.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    generation: u64,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(generation: u64, cancel_token: CancellationToken) -> Self {
        Self {
            generation,
            cancel_token,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_reaches_the_running_token() {
        let token = CancellationToken::new();
        let handle = TaskHandle::new(3, token.clone());

        assert!(!token.is_cancelled());
        handle.cancel();

        assert!(token.is_cancelled());
        assert_eq!(handle.generation(), 3);
    }

    #[test]
    fn clones_share_the_token() {
        let token = CancellationToken::new();
        let handle = TaskHandle::new(1, token.clone());

        handle.clone().cancel();
        assert!(token.is_cancelled());
    }
}
