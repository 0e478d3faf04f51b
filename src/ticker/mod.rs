//! Tickers: strategies deciding **when** a condition is checked.
//!
//! A ticker is started once per poll with a [`CancellationToken`] and returns a
//! [`Pulses`] receiver. Every `()` received means "check now". The ticker ends in
//! one of two ways, and the poll engine tells them apart:
//! - the receiver yields `None` → the ticker is **exhausted**;
//! - the token is cancelled → the poll engine abandoned it.
//!
//! ## Contents
//! - [`Ticker`] the protocol every strategy implements
//! - [`TickerFn`] adapter for hand-written (non-interval) tickers
//! - [`IntervalTicker`] generic ticker driven by a change function
//! - constructors: [`interval`], [`max_intervals`], [`deadlined`], [`expiring`],
//!   [`max_intervals_with_timeout`], [`jittering`]
//!
//! ## Quick wiring
//! ```text
//! change fn (prev delay) ──► Option<next delay>
//!      └─► IntervalTicker::start(token)
//!           └─► spawned loop: sleep(delay) ─► send(()) ─► repeat
//!                              └─ token cancelled ─► exit (sender dropped)
//! ```

mod interval;
mod jitter;
mod strategies;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use interval::IntervalTicker;
pub use jitter::{JitterChange, jittering};
pub use strategies::{deadlined, expiring, interval, max_intervals, max_intervals_with_timeout};

/// Stream of pulses produced by a started ticker.
///
/// A closed channel signals exhaustion.
pub type Pulses = mpsc::Receiver<()>;

/// # Strategy emitting "check now" pulses.
///
/// Implementors spawn their own background activity and must stop it once
/// `token` is cancelled. Tickers carry timing state captured at construction,
/// so a fresh ticker is built for every poll.
pub trait Ticker: Send + 'static {
    /// Starts the ticker; pulses arrive on the returned receiver.
    fn start(self, token: CancellationToken) -> Pulses;
}

/// Function-backed ticker for strategies that are not interval shaped.
///
/// ## Example
/// ```rust
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
/// use waitline::{Context, ConditionFn, TickerFn, poll};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// // Three immediate pulses, then exhaustion.
/// let ticker = TickerFn::new(|token: CancellationToken| {
///     let (tx, rx) = mpsc::channel(1);
///     tokio::spawn(async move {
///         for _ in 0..3 {
///             tokio::select! {
///                 res = tx.send(()) => {
///                     if res.is_err() {
///                         return;
///                     }
///                 }
///                 _ = token.cancelled() => return,
///             }
///         }
///     });
///     rx
/// });
///
/// let err = poll(&Context::background(), ticker, ConditionFn::new(|| Ok(false)))
///     .await
///     .unwrap_err();
/// assert!(err.is_exceeded());
/// # }
/// ```
#[derive(Debug)]
pub struct TickerFn<F> {
    f: F,
}

impl<F> TickerFn<F>
where
    F: FnOnce(CancellationToken) -> Pulses + Send + 'static,
{
    /// Wraps `f` as a ticker.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Ticker for TickerFn<F>
where
    F: FnOnce(CancellationToken) -> Pulses + Send + 'static,
{
    fn start(self, token: CancellationToken) -> Pulses {
        (self.f)(token)
    }
}
