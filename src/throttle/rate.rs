//! # Admission rate.
//!
//! [`Rate`] is the steady-state number of admissions per second. Two sentinels:
//! - [`Rate::INFINITE`] disables rate limiting (burst still bounds concurrency);
//! - [`Rate::ZERO`] never refills, only the initial burst is ever admitted.
//!
//! Negative and NaN inputs sanitize to [`Rate::ZERO`].

use std::fmt;
use std::time::Duration;

/// Admissions per second.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Rate(f64);

impl Rate {
    /// No rate limit.
    pub const INFINITE: Rate = Rate(f64::INFINITY);

    /// No refill at all.
    pub const ZERO: Rate = Rate(0.0);

    /// `per_second` admissions per second.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use waitline::Rate;
    ///
    /// assert_eq!(Rate::per_second(2.0), Rate::every(Duration::from_millis(500)));
    /// assert_eq!(Rate::per_second(-1.0), Rate::ZERO);
    /// ```
    pub fn per_second(per_second: f64) -> Self {
        if per_second.is_nan() || per_second <= 0.0 {
            Self::ZERO
        } else {
            Rate(per_second)
        }
    }

    /// One admission per `interval`; a zero interval means [`Rate::INFINITE`].
    pub fn every(interval: Duration) -> Self {
        if interval.is_zero() {
            Self::INFINITE
        } else {
            Rate(1.0 / interval.as_secs_f64())
        }
    }

    /// Admissions per second as a float (`inf` for [`Rate::INFINITE`]).
    pub fn as_per_second(&self) -> f64 {
        self.0
    }

    /// Returns `true` for [`Rate::INFINITE`].
    pub fn is_infinite(&self) -> bool {
        self.0.is_infinite()
    }

    /// Returns `true` for [`Rate::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Tokens accumulated over `elapsed`.
    pub(crate) fn tokens_in(&self, elapsed: Duration) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        elapsed.as_secs_f64() * self.0
    }

    /// Time needed to accumulate `tokens`; `None` if that never happens.
    pub(crate) fn time_for(&self, tokens: f64) -> Option<Duration> {
        if tokens <= 0.0 || self.is_infinite() {
            return Some(Duration::ZERO);
        }
        if self.is_zero() {
            return None;
        }
        Duration::try_from_secs_f64(tokens / self.0).ok()
    }
}

impl From<u32> for Rate {
    fn from(per_second: u32) -> Self {
        Self::per_second(f64::from(per_second))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            f.write_str("inf/s")
        } else {
            write!(f, "{}/s", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert!(Rate::INFINITE.is_infinite());
        assert!(Rate::ZERO.is_zero());
        assert_eq!(Rate::every(Duration::ZERO), Rate::INFINITE);
        assert_eq!(Rate::per_second(f64::NAN), Rate::ZERO);
        assert_eq!(Rate::from(20).as_per_second(), 20.0);
    }

    #[test]
    fn test_time_for_tokens() {
        let rate = Rate::per_second(2.0);
        assert_eq!(rate.time_for(1.0), Some(Duration::from_millis(500)));
        assert_eq!(rate.time_for(0.0), Some(Duration::ZERO));
        assert_eq!(Rate::ZERO.time_for(1.0), None);
        assert_eq!(Rate::INFINITE.time_for(1e9), Some(Duration::ZERO));
        assert_eq!(rate.tokens_in(Duration::from_secs(3)), 6.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Rate::INFINITE.to_string(), "inf/s");
        assert_eq!(Rate::per_second(2.5).to_string(), "2.5/s");
    }
}
