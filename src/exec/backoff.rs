// src/exec/backoff.rs

//! Exponential backoff with decorrelated jitter.
//!
//! Each wait is drawn uniformly from `[min_wait, previous * 3]` and capped at
//! `max_wait`, so waits grow on average but are rarely identical.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bounds for backoff waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            min_wait: Duration::from_secs(3),
            max_wait: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    pub fn new(min_wait: Duration, max_wait: Duration) -> Self {
        Self { min_wait, max_wait }
    }

    /// Every wait is exactly `wait`.
    pub fn fixed(wait: Duration) -> Self {
        Self::new(wait, wait)
    }

    /// Fresh jitter state seeded from the OS.
    pub fn jitter(&self) -> Jitter {
        Jitter::new(*self, StdRng::from_os_rng())
    }

    /// Fresh jitter state with a reproducible sequence.
    pub fn seeded_jitter(&self, seed: u64) -> Jitter {
        Jitter::new(*self, StdRng::seed_from_u64(seed))
    }
}

/// Per-invocation backoff state.
#[derive(Debug, Clone)]
pub struct Jitter {
    policy: BackoffPolicy,
    previous: Duration,
    rng: StdRng,
}

impl Jitter {
    fn new(policy: BackoffPolicy, rng: StdRng) -> Self {
        Self {
            policy,
            previous: policy.min_wait,
            rng,
        }
    }

    /// Draw the next wait.
    pub fn next_delay(&mut self) -> Duration {
        let min = self.policy.min_wait;
        let max = self.policy.max_wait.max(min);

        let lo = min.as_secs_f64();
        let hi = self.previous.saturating_mul(3).as_secs_f64();
        let secs = if hi > lo {
            self.rng.random_range(lo..=hi)
        } else {
            lo
        };

        let delay = Duration::from_secs_f64(secs).clamp(min, max);
        self.previous = delay;
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_is_deterministic() {
        let mut jitter = BackoffPolicy::fixed(Duration::from_secs(2)).jitter();
        for _ in 0..5 {
            assert_eq!(jitter.next_delay(), Duration::from_secs(2));
        }
    }

    #[test]
    fn delays_stay_within_bounds() {
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(2));
        let mut jitter = policy.seeded_jitter(7);
        for _ in 0..100 {
            let d = jitter.next_delay();
            assert!(d >= policy.min_wait && d <= policy.max_wait, "{d:?} out of bounds");
        }
    }

    #[test]
    fn successive_waits_vary() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(600));
        let mut jitter = policy.seeded_jitter(42);
        let waits: Vec<_> = (0..6).map(|_| jitter.next_delay()).collect();
        assert!(waits.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn same_seed_same_sequence() {
        let policy = BackoffPolicy::default();
        let mut a = policy.seeded_jitter(3);
        let mut b = policy.seeded_jitter(3);
        for _ in 0..5 {
            assert_eq!(a.next_delay(), b.next_delay());
        }
    }

    #[test]
    fn inverted_bounds_collapse_to_min() {
        let policy = BackoffPolicy::new(Duration::from_secs(5), Duration::from_secs(1));
        let mut jitter = policy.seeded_jitter(1);
        assert_eq!(jitter.next_delay(), Duration::from_secs(5));
    }
}
