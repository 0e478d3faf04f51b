//! # Throttle configuration.
//!
//! Provides [`ThrottleConfig`], the settings a [`Throttle`](crate::Throttle) is built from.
//!
//! ## Sentinel values
//! - `rate = Rate::INFINITE` → no rate limiting (only burst applies)
//! - `burst = 0` → nothing is ever admitted

use crate::throttle::Rate;

/// Settings for a [`Throttle`](crate::Throttle).
///
/// ## Field semantics
/// - `rate`: steady-state admissions per second once the burst is spent
/// - `burst`: maximum number of concurrently admitted events, also the largest batch
///
/// ## Notes
/// Fields are public; prefer the accessors below over sprinkling sentinel checks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThrottleConfig {
    /// Admissions per second.
    pub rate: Rate,

    /// Maximum concurrently admitted events.
    pub burst: usize,
}

impl ThrottleConfig {
    /// Returns the rate limit as an `Option`.
    ///
    /// - `None` → unlimited rate
    /// - `Some(r)` → at most `r` admissions per second after the burst
    #[inline]
    pub fn rate_limit(&self) -> Option<Rate> {
        if self.rate.is_infinite() {
            None
        } else {
            Some(self.rate)
        }
    }

    /// Returns `false` if the configuration can never admit an event.
    #[inline]
    pub fn admits_any(&self) -> bool {
        self.burst > 0
    }
}

impl Default for ThrottleConfig {
    /// Default configuration:
    ///
    /// - `rate = Rate::INFINITE` (no rate limit)
    /// - `burst = 1` (one event at a time)
    fn default() -> Self {
        Self {
            rate: Rate::INFINITE,
            burst: 1,
        }
    }
}
