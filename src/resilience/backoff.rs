//! Exponential backoff with jitter.
//!
//! Only used while polling for an SSH tunnel to come up. Admin API requests
//! themselves are never retried.

use rand::Rng;
use std::time::Duration;

/// Bounded sequence of jittered, exponentially growing delays.
#[derive(Debug, Clone)]
pub struct Backoff {
    attempt: u32,
    max_attempts: u32,
    base_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub fn new(max_attempts: u32, base_ms: u64, max_ms: u64) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            base_ms,
            max_ms,
        }
    }

    /// Attempts handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;
        Some(delay_for(self.attempt, self.base_ms, self.max_ms))
    }
}

/// Delay before the given attempt (1-based), capped at `max_ms` plus up to 10% jitter.
pub fn delay_for(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}
