//! # Cancellation scope with an optional deadline.
//!
//! [`Context`] pairs a [`CancellationToken`] with an optional monotonic deadline.
//! It is what every suspending operation in this crate observes:
//! - [`poll`](crate::poll) returns `Cancelled` once the context is done;
//! - [`Throttle::process`](crate::Throttle::process) uses the deadline for its
//!   feasibility pre-check and aborts a pending admission when the context ends.
//!
//! ## Derivation
//! ```text
//! Context::background()           (no deadline)
//!   └─► with_timeout(50ms)        child token, deadline = now + 50ms
//!         └─► with_deadline(at)   child token, deadline = min(parent, at)
//! ```
//!
//! ## Rules
//! - Cancelling a parent cancels every child; cancelling a child leaves the parent untouched.
//! - A child never outlives its parent's deadline.
//! - When both apply, explicit cancellation is reported over the deadline.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use waitline::{Context, ContextError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ctx = Context::with_timeout(Duration::from_millis(10));
//! ctx.done().await;
//! assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
//!
//! let ctx = Context::background();
//! ctx.cancel();
//! assert_eq!(ctx.err(), Some(ContextError::Cancelled));
//! # }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ContextError;

/// Cancellation token plus optional deadline.
///
/// Cloning is cheap; clones share the same token and deadline.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Returns a context that is only done when cancelled explicitly.
    pub fn background() -> Self {
        Self::default()
    }

    /// Adopts an existing token (no deadline).
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Returns a fresh context that is done after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// Returns a fresh context that is done at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline_at(deadline)
    }

    /// Derives a child that additionally ends after `timeout`.
    ///
    /// The deadline saturates at a far-future instant for huge timeouts.
    pub fn timeout(&self, timeout: Duration) -> Self {
        self.deadline_at(deadline_after(timeout))
    }

    /// Derives a child whose deadline is the earlier of the parent's and `deadline`.
    pub fn deadline_at(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derives a child sharing the parent's deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns time left until the deadline (`None` without deadline).
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Reports why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Returns `true` once cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Completes when the context is cancelled or its deadline passes.
    ///
    /// Cancel-safe: dropping the future has no side effects.
    pub async fn done(&self) {
        if self.is_done() {
            return;
        }
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

/// Now plus `timeout`, saturating at a far-future instant.
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        // Roughly 30 years; tokio timers cannot represent much more.
        .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30))
}

impl From<CancellationToken> for Context {
    fn from(token: CancellationToken) -> Self {
        Self::from_token(token)
    }
}
