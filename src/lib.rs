//! # waitline
//!
//! **Waitline** waits for asynchronously-true conditions without busy-looping,
//! and throttles batches of work to a bounded rate and concurrency.
//!
//! It is built on tokio: every wait is an interruptible timer or channel wait,
//! and every suspending operation observes an explicit [`Context`]
//! (cancellation token plus optional deadline).
//!
//! ## Architecture
//! ### Polling
//! ```text
//!     ┌──────────────┐        ┌──────────────┐
//!     │    Ticker    │        │  Condition   │
//!     │ (when to     │        │ (what to     │
//!     │   check)     │        │   check)     │
//!     └──────┬───────┘        └──────┬───────┘
//!            ▼                       ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  poll(ctx, ticker, condition)                            │
//! │  - starts ticker under its own token (stopped on return) │
//! │  - select { ctx.done(), pulse }                          │
//! │  - checks condition with panic containment               │
//! └──────┬──────────────┬──────────────┬──────────────┬──────┘
//!        ▼              ▼              ▼              ▼
//!    Ok(())        Condition /     Exceeded       Cancelled
//!                  Panicked       (ticker done)   (ctx done)
//! ```
//!
//! ### Tickers
//! ```text
//! IntervalTicker(change: prev delay -> Option<next delay>)
//!   ├─ interval(d)                          always d
//!   ├─ max_intervals(d, n)                  d, n times
//!   ├─ deadlined(d, at) / expiring(d, t)    d, until a deadline
//!   ├─ max_intervals_with_timeout(d, t, n)  whichever limit first
//!   └─ jittering(interval, offset, t)       offset + random[0, interval)
//! TickerFn(token -> Pulses)                 anything else
//! ```
//!
//! ### Throttling
//! ```text
//! Throttle { rate, burst }
//!   process(ctx, events)
//!     ├─► reject: batch > burst │ ctx done │ wait beyond ctx deadline
//!     ├─► wait for tokens (rate) and slots (burst), cancellable
//!     └─► run events in order, release slots
//! ```
//!
//! ## Features
//! | Area          | Description                                               | Key types / functions                       |
//! |---------------|-----------------------------------------------------------|---------------------------------------------|
//! | **Polling**   | Check a condition on every pulse until it holds.          | [`poll`], [`Condition`], [`ConditionFn`]    |
//! | **Tickers**   | Fixed, bounded, deadline, jittered or custom schedules.   | [`Ticker`], [`IntervalTicker`], [`TickerFn`]|
//! | **Throttle**  | Rate- and burst-bounded batch admission.                  | [`Throttle`], [`Rate`], [`ThrottleConfig`]  |
//! | **Context**   | Explicit cancellation with optional deadline.             | [`Context`]                                 |
//! | **Errors**    | Typed errors with stable labels.                          | [`PollError`], [`ThrottleError`]            |
//!
//! Diagnostics are emitted through [`tracing`]; install any subscriber to see them.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//! use waitline::{ConditionFn, Context, PollError, max_intervals, poll};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), PollError> {
//!     let ready = Arc::new(AtomicBool::new(false));
//!
//!     let flag = ready.clone();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(30)).await;
//!         flag.store(true, Ordering::Release);
//!     });
//!
//!     let ctx = Context::with_timeout(Duration::from_secs(5));
//!     poll(
//!         &ctx,
//!         max_intervals(Duration::from_millis(10), 100),
//!         ConditionFn::new(move || Ok(ready.load(Ordering::Acquire))),
//!     )
//!     .await
//! }
//! ```
mod condition;
mod config;
mod context;
mod error;
mod poll;
mod throttle;
mod ticker;

// ---- Public re-exports ----

pub use condition::{AsyncConditionFn, Condition, ConditionFn};
pub use config::ThrottleConfig;
pub use context::Context;
pub use error::{BoxError, ContextError, PollError, ThrottleError};
pub use poll::{poll, with_deadline, with_interval, with_jitter, with_max_intervals, with_timeout};
pub use throttle::{Rate, Throttle};
pub use ticker::{
    IntervalTicker, JitterChange, Pulses, Ticker, TickerFn, deadlined, expiring, interval,
    jittering, max_intervals, max_intervals_with_timeout,
};
