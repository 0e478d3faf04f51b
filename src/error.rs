//! Error types returned by polling and throttling.
//!
//! This module defines three error enums:
//!
//! - [`ContextError`]: why a [`Context`](crate::Context) is done.
//! - [`PollError`]: terminal failures of [`poll`](crate::poll).
//! - [`ThrottleError`]: rejections and event failures of [`Throttle::process`](crate::Throttle::process).
//!
//! `PollError` and `ThrottleError` provide `as_label` (stable snake_case label for
//! logs/metrics) and `as_message` helpers. Display strings are stable as well and
//! may be matched on in tests.

use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by caller-supplied conditions and events.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Reason a context is done.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context (or one of its parents) was cancelled explicitly.
    #[error("context canceled")]
    Cancelled,

    /// The context deadline has passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// # Errors produced by the poll engine.
///
/// Exactly one of these is returned when polling ends without the condition
/// being satisfied. Nothing is retried internally.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PollError {
    /// The caller's context ended before the condition succeeded.
    #[error("context has been cancelled with error: {source}")]
    Cancelled {
        /// Why the context is done.
        source: ContextError,
    },

    /// The ticker closed its pulse stream before the condition succeeded.
    #[error("ticker exceeded while waiting for the condition")]
    Exceeded,

    /// The condition returned an error.
    #[error("poll condition returned error: {error}")]
    Condition {
        /// The error returned by the condition.
        error: BoxError,
    },

    /// The condition panicked; the panic was caught at the check boundary.
    #[error("panic during condition check: {info}")]
    Panicked {
        /// The panic payload rendered as text.
        info: String,
    },
}

impl PollError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use waitline::PollError;
    ///
    /// assert_eq!(PollError::Exceeded.as_label(), "poll_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PollError::Cancelled { .. } => "poll_cancelled",
            PollError::Exceeded => "poll_exceeded",
            PollError::Condition { .. } => "poll_condition_failed",
            PollError::Panicked { .. } => "poll_condition_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PollError::Cancelled { source } => format!("cancelled: {source}"),
            PollError::Exceeded => "ticker exhausted".to_string(),
            PollError::Condition { error } => format!("condition: {error}"),
            PollError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Returns `true` if polling stopped because the caller's context ended.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PollError::Cancelled { .. })
    }

    /// Returns `true` if the ticker gave up before the condition succeeded.
    pub fn is_exceeded(&self) -> bool {
        matches!(self, PollError::Exceeded)
    }
}

/// # Errors produced by the throttle.
///
/// All variants except [`ThrottleError::EventFailed`] are rejections: they are
/// returned before any event of the batch has been started.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ThrottleError {
    /// The batch can never fit: it is larger than the burst capacity.
    #[error("{events} event(s) exceed throttle burst capacity {burst}")]
    BurstExceeded {
        /// Number of events in the rejected batch.
        events: usize,
        /// Configured burst capacity.
        burst: usize,
    },

    /// The context was already done when the batch was submitted.
    #[error("event(s) throttle context already done")]
    ContextDone,

    /// Waiting for enough tokens would outlive the context deadline.
    #[error("event(s) would exceed throttle context deadline")]
    WouldExceedDeadline {
        /// The wait the batch would need (`None` if tokens never refill).
        wait: Option<Duration>,
    },

    /// The context was cancelled or timed out while the batch was waiting.
    #[error("event(s) throttle context timed out or cancelled")]
    Cancelled,

    /// An admitted event returned an error; later events were not started.
    #[error("processing event {index} returned error: {error}")]
    EventFailed {
        /// Position of the failing event in its batch (0-based).
        index: usize,
        /// The error returned by the event.
        error: BoxError,
    },
}

impl ThrottleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use waitline::ThrottleError;
    ///
    /// let err = ThrottleError::BurstExceeded { events: 5, burst: 1 };
    /// assert_eq!(err.as_label(), "throttle_burst_exceeded");
    /// assert!(err.is_rejection());
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ThrottleError::BurstExceeded { .. } => "throttle_burst_exceeded",
            ThrottleError::ContextDone => "throttle_context_done",
            ThrottleError::WouldExceedDeadline { .. } => "throttle_deadline_infeasible",
            ThrottleError::Cancelled => "throttle_cancelled",
            ThrottleError::EventFailed { .. } => "throttle_event_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ThrottleError::BurstExceeded { events, burst } => {
                format!("batch too large: events={events} burst={burst}")
            }
            ThrottleError::ContextDone => "context already done".to_string(),
            ThrottleError::WouldExceedDeadline { wait: Some(wait) } => {
                format!("deadline infeasible: wait={wait:?}")
            }
            ThrottleError::WouldExceedDeadline { wait: None } => {
                "deadline infeasible: tokens never refill".to_string()
            }
            ThrottleError::Cancelled => "cancelled while waiting".to_string(),
            ThrottleError::EventFailed { index, error } => format!("event {index}: {error}"),
        }
    }

    /// Indicates whether the batch was rejected before any event ran.
    ///
    /// Returns `false` only for [`ThrottleError::EventFailed`].
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ThrottleError::EventFailed { .. })
    }
}
