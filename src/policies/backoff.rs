//! # Backoff between callback delivery attempts.
//!
//! [`BackoffPolicy`] computes the pause after the `n`-th failed attempt as
//! `first × factor^n`, clamped to `max`, with jitter applied on top. The base is
//! derived from the attempt index alone, so jitter never compounds across attempts.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use ticketvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//! assert_eq!(backoff.next(2), Duration::from_millis(400));
//! assert_eq!(backoff.next(9), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delay schedule for retries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied to each delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 100ms delay, capped at 30s, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// A policy that never waits; handy in tests.
    pub const fn immediate() -> Self {
        Self {
            first: Duration::ZERO,
            max: Duration::ZERO,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the delay following the given (0-indexed) failed attempt.
    ///
    /// Non-finite or negative intermediate values clamp to `max`.
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let raw = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !raw.is_finite() || raw < 0.0 || raw > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(raw)
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doubling(jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter,
        }
    }

    #[test]
    fn test_exponential_growth_no_jitter() {
        let policy = doubling(JitterPolicy::None);
        assert_eq!(policy.next(0), Duration::from_millis(100));
        assert_eq!(policy.next(1), Duration::from_millis(200));
        assert_eq!(policy.next(3), Duration::from_millis(800));
    }

    #[test]
    fn test_clamped_to_max() {
        let policy = doubling(JitterPolicy::None);
        assert_eq!(policy.next(10), Duration::from_secs(5));
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_first_exceeds_max() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(2),
            factor: 1.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_secs(2));
    }

    #[test]
    fn test_immediate_never_waits() {
        let policy = BackoffPolicy::immediate();
        for attempt in 0..5 {
            assert_eq!(policy.next(attempt), Duration::ZERO);
        }
    }

    #[test]
    fn test_equal_jitter_stays_within_half_and_base() {
        let policy = doubling(JitterPolicy::Equal);
        for attempt in 0..8 {
            let base_ms = (100.0 * 2.0f64.powi(attempt as i32)).min(5_000.0);
            let delay = policy.next(attempt);
            assert!(delay >= Duration::from_millis((base_ms / 2.0) as u64));
            assert!(delay <= Duration::from_millis(base_ms as u64));
        }
    }

    #[test]
    fn test_full_jitter_never_exceeds_base() {
        let policy = doubling(JitterPolicy::Full);
        for attempt in 0..8 {
            let base_ms = (100.0 * 2.0f64.powi(attempt as i32)).min(5_000.0);
            assert!(policy.next(attempt) <= Duration::from_millis(base_ms as u64));
        }
    }

    #[test]
    fn test_decorrelated_respects_floor_and_cap() {
        let policy = doubling(JitterPolicy::Decorrelated);
        for _ in 0..50 {
            let delay = policy.next(6);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_secs(5));
        }
    }
}
