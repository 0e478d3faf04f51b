//! # Poll engine.
//!
//! Drives a [`Ticker`] and a [`Condition`] to a terminal outcome.
//!
//! ## State machine
//! ```text
//!             ┌──── Ok(false) ─────┐
//!             ▼                    │
//!  start ──► Waiting ── pulse ──► Checking ── Ok(true) ──► Success
//!             │                    ├──────── Err(e) ────► Failure (Condition)
//!             │                    └──────── panic ─────► Failure (Panicked)
//!             ├── ctx done ──────► Cancelled
//!             └── stream closed ─► Exceeded
//! ```
//!
//! ## Rules
//! - Checks run strictly one after another, in pulse order.
//! - The ticker runs under its own token, independent of the caller's context;
//!   that token is cancelled on every exit path (including drop of the poll future).
//! - A done context wins over a pending pulse: once the caller cancels, no
//!   further check is started.
//! - A panic inside the condition is caught at the check boundary and counted
//!   as a failed check; it never unwinds out of [`poll`].

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    condition::Condition,
    context::Context,
    error::{ContextError, PollError},
    ticker::Ticker,
};

/// Checks `condition` on every pulse of `ticker` until it holds, fails, the
/// ticker is exhausted, or `ctx` is done.
///
/// ### Outcomes
/// - `Ok(())` the condition returned `Ok(true)`
/// - [`PollError::Condition`] the condition returned an error
/// - [`PollError::Panicked`] the condition panicked
/// - [`PollError::Exceeded`] the ticker closed its stream first
/// - [`PollError::Cancelled`] `ctx` was cancelled or hit its deadline first
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use waitline::{Context, ConditionFn, interval, poll};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut checks = 0;
/// poll(
///     &Context::background(),
///     interval(Duration::from_millis(10)),
///     ConditionFn::new(|| {
///         checks += 1;
///         Ok(checks == 5)
///     }),
/// )
/// .await
/// .unwrap();
/// assert_eq!(checks, 5);
/// # }
/// ```
pub async fn poll<T, C>(ctx: &Context, ticker: T, mut condition: C) -> Result<(), PollError>
where
    T: Ticker,
    C: Condition,
{
    let tick_token = CancellationToken::new();
    let _stop_ticker = tick_token.clone().drop_guard();
    let mut pulses = ticker.start(tick_token);
    let mut checks: u64 = 0;

    loop {
        select! {
            biased;

            _ = ctx.done() => {
                let source = ctx.err().unwrap_or(ContextError::Cancelled);
                tracing::debug!(checks, %source, "poll cancelled");
                return Err(PollError::Cancelled { source });
            }

            pulse = pulses.recv() => {
                if pulse.is_none() {
                    tracing::debug!(checks, "poll ticker exceeded");
                    return Err(PollError::Exceeded);
                }

                checks += 1;
                tracing::trace!(checks, "checking condition");
                match check(&mut condition).await {
                    Ok(true) => {
                        tracing::debug!(checks, "poll condition satisfied");
                        return Ok(());
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::debug!(checks, error = %e, "poll condition failed");
                        return Err(e);
                    }
                }
            }
        }
    }
}

/// Runs one check, turning a panic into [`PollError::Panicked`].
async fn check<C: Condition>(condition: &mut C) -> Result<bool, PollError> {
    match AssertUnwindSafe(condition.check()).catch_unwind().await {
        Ok(Ok(ok)) => Ok(ok),
        Ok(Err(error)) => Err(PollError::Condition { error }),
        Err(panic) => Err(PollError::Panicked {
            info: panic_info(panic.as_ref()),
        }),
    }
}

fn panic_info(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
