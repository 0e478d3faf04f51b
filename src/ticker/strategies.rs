//! # Interval ticker strategies.
//!
//! Each constructor is a change function plugged into [`IntervalTicker`]:
//!
//! | Constructor                     | Delay      | Stops when                                  |
//! |---------------------------------|------------|---------------------------------------------|
//! | [`interval`]                    | `interval` | never                                       |
//! | [`max_intervals`]               | `interval` | `max` pulses were scheduled                 |
//! | [`deadlined`]                   | `interval` | next pulse would land after `deadline`      |
//! | [`expiring`]                    | `interval` | next pulse would land after creation+timeout|
//! | [`max_intervals_with_timeout`]  | `interval` | whichever of the two limits is hit first    |
//!
//! Deadlines are captured when the ticker is constructed, so build the ticker
//! right before polling.

use std::time::Duration;

use tokio::time::Instant;

use crate::{context::deadline_after, ticker::IntervalTicker};

/// Pulses every `interval`, forever.
pub fn interval(
    interval: Duration,
) -> IntervalTicker<impl FnMut(Duration) -> Option<Duration> + Send + 'static> {
    IntervalTicker::new(move |_| Some(interval))
}

/// Pulses every `interval`, at most `max` times.
pub fn max_intervals(
    interval: Duration,
    max: usize,
) -> IntervalTicker<impl FnMut(Duration) -> Option<Duration> + Send + 'static> {
    let mut count = 0usize;
    IntervalTicker::new(move |_| {
        if count >= max {
            return None;
        }
        count += 1;
        Some(interval)
    })
}

/// Pulses every `interval` as long as the pulse lands before `deadline`.
pub fn deadlined(
    interval: Duration,
    deadline: Instant,
) -> IntervalTicker<impl FnMut(Duration) -> Option<Duration> + Send + 'static> {
    IntervalTicker::new(move |_| within(deadline, interval).then_some(interval))
}

/// Pulses every `interval` until `timeout` after construction.
pub fn expiring(
    interval: Duration,
    timeout: Duration,
) -> IntervalTicker<impl FnMut(Duration) -> Option<Duration> + Send + 'static> {
    deadlined(interval, deadline_after(timeout))
}

/// Pulses every `interval`, at most `max` times and until `timeout` after construction.
pub fn max_intervals_with_timeout(
    interval: Duration,
    timeout: Duration,
    max: usize,
) -> IntervalTicker<impl FnMut(Duration) -> Option<Duration> + Send + 'static> {
    let deadline = deadline_after(timeout);
    let mut count = 0usize;
    IntervalTicker::new(move |_| {
        if count >= max || !within(deadline, interval) {
            return None;
        }
        count += 1;
        Some(interval)
    })
}

/// `true` if a pulse scheduled `delay` from now lands no later than `deadline`.
fn within(deadline: Instant, delay: Duration) -> bool {
    match Instant::now().checked_add(delay) {
        Some(at) => at <= deadline,
        None => false,
    }
}
