// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff with additive jitter.

use std::time::Duration;

use rand::Rng;

/// `delay(n) = base * 2^(n-1) + uniform[0, jitter)` for 1-indexed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    jitter: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// Builds a policy from seconds. Negative or non-finite values become zero.
    pub fn from_secs(base: f64, jitter: f64) -> Self {
        Self::new(
            Duration::try_from_secs_f64(base).unwrap_or(Duration::ZERO),
            Duration::try_from_secs_f64(jitter).unwrap_or(Duration::ZERO),
        )
    }

    /// No delay at all. Useful in tests.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// The deterministic part of the delay: `base * 2^(attempt-1)`.
    ///
    /// Attempt 0 is treated as attempt 1; the exponent saturates at 31.
    pub fn floor(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << exponent)
    }

    /// Delay before retrying after failed attempt `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with_rng(attempt, &mut rand::thread_rng())
    }

    pub fn delay_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let floor = self.floor(attempt);
        let jitter_nanos = u64::try_from(self.jitter.as_nanos()).unwrap_or(u64::MAX);
        if jitter_nanos == 0 {
            return floor;
        }
        floor.saturating_add(Duration::from_nanos(rng.gen_range(0..jitter_nanos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn floor_doubles_per_attempt() {
        let policy = BackoffPolicy::from_secs(0.75, 0.5);
        assert_eq!(policy.floor(1), Duration::from_millis(750));
        assert_eq!(policy.floor(2), Duration::from_millis(1500));
        assert_eq!(policy.floor(3), Duration::from_millis(3000));
        assert_eq!(policy.floor(0), policy.floor(1));
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let policy = BackoffPolicy::from_secs(1.0, 0.0);
        assert_eq!(policy.delay(3), Duration::from_secs(4));
    }

    #[test]
    fn invalid_seconds_clamp_to_zero() {
        let policy = BackoffPolicy::from_secs(-1.0, f64::NAN);
        assert_eq!(policy, BackoffPolicy::none());
    }

    proptest! {
        #[test]
        fn delay_stays_within_jitter_window(
            attempt in 1u32..8,
            base_ms in 0u64..2_000,
            jitter_ms in 0u64..1_000,
        ) {
            let policy = BackoffPolicy::new(
                Duration::from_millis(base_ms),
                Duration::from_millis(jitter_ms),
            );
            let floor = Duration::from_millis(base_ms) * 2u32.pow(attempt - 1);
            let delay = policy.delay(attempt);
            prop_assert!(delay >= floor);
            if jitter_ms == 0 {
                prop_assert_eq!(delay, floor);
            } else {
                prop_assert!(delay < floor + Duration::from_millis(jitter_ms));
            }
        }
    }
}
