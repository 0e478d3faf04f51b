//! # Jittering ticker.
//!
//! Pulses at randomized intervals so that independent pollers do not converge
//! on the same schedule (thundering herd). Every gap between two pulses is
//! `offset + jitter` with `jitter` drawn uniformly from `[0, interval)`.
//!
//! ```text
//! created ──┬── offset+j1 ──┬── offset+j2 ──┬── ... ──┤ deadline = created + timeout
//!         start           pulse 1         pulse 2            no pulse after here
//! ```
//!
//! ## Rules
//! - Fire times advance from a running schedule, not from "now", so a slow
//!   consumer does not stretch later gaps; a late pulse fires immediately.
//! - Near the deadline the jitter range shrinks to what remains; when nothing
//!   remains the ticker is exhausted.
//! - `interval` is floored to 1ms and capped so `offset + interval` cannot overflow.
//! - Randomness comes from the thread-local ChaCha-based CSPRNG (`rand::rng()`),
//!   seeded from the operating system.

use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::{context::deadline_after, ticker::IntervalTicker};

/// Smallest accepted jitter interval.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Pulses at `offset + random[0, interval)` gaps until `timeout` after construction.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use waitline::{Context, ConditionFn, jittering, poll};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut checks = 0;
/// let res = poll(
///     &Context::background(),
///     jittering(Duration::from_millis(5), Duration::from_millis(1), Duration::from_secs(1)),
///     ConditionFn::new(move || {
///         checks += 1;
///         Ok(checks == 3)
///     }),
/// )
/// .await;
/// assert!(res.is_ok());
/// # }
/// ```
pub fn jittering(
    interval: Duration,
    offset: Duration,
    timeout: Duration,
) -> IntervalTicker<impl FnMut(Duration) -> Option<Duration> + Send + 'static> {
    let mut change = JitterChange::new(interval, offset, timeout);
    IntervalTicker::new(move |_| change.next_at(Instant::now()))
}

/// Change function state of the jittering ticker.
///
/// Exposed so the schedule can be driven with explicit clock readings.
#[derive(Debug, Clone)]
pub struct JitterChange {
    interval: Duration,
    offset: Duration,
    deadline: Instant,
    next: Instant,
}

impl JitterChange {
    /// Sanitizes the parameters and starts the schedule now.
    pub fn new(interval: Duration, offset: Duration, timeout: Duration) -> Self {
        let start = Instant::now();
        Self::starting_at(start, deadline_after(timeout), interval, offset)
    }

    /// Starts the schedule at `start` with an absolute `deadline`.
    pub fn starting_at(start: Instant, deadline: Instant, interval: Duration, offset: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL).min(Duration::MAX - offset);
        Self {
            interval,
            offset,
            deadline,
            next: start,
        }
    }

    /// The sanitized interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The deadline after which no pulse is scheduled.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The currently scheduled fire time.
    pub fn scheduled(&self) -> Instant {
        self.next
    }

    /// Advances the schedule as seen at `now`; returns the delay until the next pulse.
    pub fn next_at(&mut self, now: Instant) -> Option<Duration> {
        if now > self.deadline {
            return None;
        }

        let remaining = self.deadline - now;
        let mut range = self.interval;
        if remaining < self.offset.saturating_add(range) {
            range = remaining.checked_sub(self.offset)?;
            if range.is_zero() {
                return None;
            }
        }

        let nanos = u64::try_from(range.as_nanos()).unwrap_or(u64::MAX);
        let jitter = Duration::from_nanos(rand::rng().random_range(0..nanos));
        let wait = self.offset + jitter;

        self.next += wait;
        Some(self.next.saturating_duration_since(now))
    }
}
