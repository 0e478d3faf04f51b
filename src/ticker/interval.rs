//! # Generic interval ticker.
//!
//! [`IntervalTicker`] is the primitive every interval-based strategy reduces to.
//! It repeatedly asks a *change function* for the next delay:
//!
//! ```text
//! prev = 0
//! loop {
//!   ├─► change(prev) ── None ──► drop sender (exhausted), exit
//!   │        └─ Some(delay)
//!   ├─► sleep(delay)      ◄── races token.cancelled() ─► exit
//!   ├─► send(())          ◄── races token.cancelled() ─► exit
//!   └─► prev = delay
//! }
//! ```
//!
//! ## Rules
//! - The change function is called from the ticker task only, never concurrently.
//! - A zero delay pulses as soon as the receiver has room.
//! - The pulse channel holds at most one pending pulse; a slow consumer stalls the
//!   ticker instead of piling up pulses.

use std::time::Duration;

use tokio::{select, sync::mpsc, time};
use tokio_util::sync::CancellationToken;

use crate::ticker::{Pulses, Ticker};

/// Ticker driven by a change function `prev delay -> Option<next delay>`.
///
/// Returning `None` exhausts the ticker. State the strategy needs (counters,
/// deadlines, running fire times) lives in the closure.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use waitline::IntervalTicker;
///
/// // Doubling delays starting at 5ms, giving up above one second.
/// let ticker = IntervalTicker::new(|prev: Duration| {
///     if prev.is_zero() {
///         return Some(Duration::from_millis(5));
///     }
///     let next = prev * 2;
///     (next <= Duration::from_secs(1)).then_some(next)
/// });
/// # drop(ticker);
/// ```
pub struct IntervalTicker<F> {
    change: F,
}

impl<F> IntervalTicker<F>
where
    F: FnMut(Duration) -> Option<Duration> + Send + 'static,
{
    /// Creates a ticker from a change function.
    pub fn new(change: F) -> Self {
        Self { change }
    }
}

impl<F> Ticker for IntervalTicker<F>
where
    F: FnMut(Duration) -> Option<Duration> + Send + 'static,
{
    fn start(self, token: CancellationToken) -> Pulses {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(run(self.change, tx, token));
        rx
    }
}

async fn run<F>(mut change: F, tx: mpsc::Sender<()>, token: CancellationToken)
where
    F: FnMut(Duration) -> Option<Duration>,
{
    let mut prev = Duration::ZERO;
    loop {
        let Some(delay) = change(prev) else {
            tracing::trace!(?prev, "ticker exhausted");
            return;
        };

        if !delay.is_zero() {
            select! {
                _ = time::sleep(delay) => {}
                _ = token.cancelled() => return,
            }
        }

        select! {
            res = tx.send(()) => {
                if res.is_err() {
                    // Receiver gone.
                    return;
                }
            }
            _ = token.cancelled() => return,
        }
        prev = delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_change_fn_sees_previous_delay() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = seen.clone();
        let ticker = IntervalTicker::new(move |prev: Duration| {
            log.lock().unwrap().push(prev);
            match prev.as_millis() {
                0 => Some(Duration::from_millis(1)),
                ms if ms < 8 => Some(prev * 2),
                _ => None,
            }
        });

        let mut pulses = ticker.start(CancellationToken::new());
        let mut count = 0;
        while pulses.recv().await.is_some() {
            count += 1;
        }

        assert_eq!(count, 4);
        let ms: Vec<u128> = seen.lock().unwrap().iter().map(|d| d.as_millis()).collect();
        assert_eq!(ms, vec![0, 1, 2, 4, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticker() {
        let token = CancellationToken::new();
        let mut pulses =
            IntervalTicker::new(|_| Some(Duration::from_secs(3600))).start(token.clone());

        token.cancel();
        // The task exits and drops the sender instead of sleeping for an hour.
        assert_eq!(pulses.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_exhaustion_closes_stream() {
        let mut pulses = IntervalTicker::new(|_| None).start(CancellationToken::new());
        assert_eq!(pulses.recv().await, None);
    }
}
