//! # Token bucket with reservations.
//!
//! Capacity `burst`, refilled at `rate`, starting full. A reservation takes its
//! tokens immediately, even if that drives the level negative; the deficit is
//! the time the caller must wait before acting. Later reservations queue up
//! behind the deficit, which is what spaces admissions at `1/rate`.
//!
//! ```text
//! tokens ──────────────┐
//!   burst ┤████        │ reserve(n): tokens -= n
//!         │            │ wait = max(0, -tokens) / rate
//!       0 ┼────────────│ cancel(n):  tokens += n (capped at burst)
//!         │░░ deficit  │
//! ```
//!
//! Not synchronized itself; the throttle keeps it behind a mutex.

use std::time::Duration;

use tokio::time::Instant;

use crate::throttle::Rate;

#[derive(Debug)]
pub(super) struct Bucket {
    rate: Rate,
    burst: f64,
    tokens: f64,
    last: Instant,
}

/// Why a reservation was refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Refused {
    /// The wait is longer than allowed.
    TooLong(Duration),
    /// Tokens never refill.
    Never,
}

impl Bucket {
    pub(super) fn new(rate: Rate, burst: usize, now: Instant) -> Self {
        Self {
            rate,
            burst: burst as f64,
            tokens: burst as f64,
            last: now,
        }
    }

    /// Refills for the time elapsed since the last update.
    fn advance(&mut self, now: Instant) {
        if now <= self.last {
            return;
        }
        let elapsed = now - self.last;
        self.tokens = (self.tokens + self.rate.tokens_in(elapsed)).min(self.burst);
        self.last = now;
    }

    /// Takes `n` tokens and returns how long to wait before acting.
    ///
    /// Nothing is taken when the wait exceeds `max_wait` or is infinite.
    pub(super) fn reserve(
        &mut self,
        now: Instant,
        n: usize,
        max_wait: Option<Duration>,
    ) -> Result<Duration, Refused> {
        self.advance(now);
        let tokens = self.tokens - n as f64;
        let wait = match self.rate.time_for(-tokens) {
            Some(wait) => wait,
            None => return Err(Refused::Never),
        };
        if let Some(max) = max_wait {
            if wait > max {
                return Err(Refused::TooLong(wait));
            }
        }
        self.tokens = tokens;
        Ok(wait)
    }

    /// Gives back the tokens of an abandoned reservation.
    pub(super) fn cancel(&mut self, now: Instant, n: usize) {
        self.advance(now);
        self.tokens = (self.tokens + n as f64).min(self.burst);
    }

    /// Current level; negative while reservations are pending.
    pub(super) fn level(&mut self, now: Instant) -> f64 {
        self.advance(now);
        self.tokens
    }
}
