//! Cancellable execution context for periodic loops.
//!
//! An [`ExecContext`] pairs a [`CancellationToken`] with an optional
//! deadline. Loops wait on [`ExecContext::done`], which resolves with the
//! cause: [`Error::Cancelled`] for an explicit cancel (or a cancelled parent),
//! [`Error::DeadlineExceeded`] once the deadline passes.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use devnode_core::{ExecContext, Error};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ctx = ExecContext::with_timeout(Duration::from_millis(5));
//! let cause = ctx.done().await;
//! assert!(matches!(cause, Error::DeadlineExceeded));
//! # }
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::Error;

/// Cancellation signal and optional deadline threaded into periodic loops.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecContext {
    /// Context that ends only when cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that ends after `timeout` or when cancelled.
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// Context that ends at `deadline` or when cancelled.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context cancelled together with this one.
    ///
    /// Cancelling the child does not cancel the parent. The child inherits
    /// the parent's deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context whose deadline is the earlier of the parent's
    /// and `now + timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Request cancellation of this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cause of termination if the context has already ended.
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Wait until the context ends and return the cause.
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Error::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Error::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                Error::Cancelled
            }
        }
    }
}
