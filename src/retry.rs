use std::time::Duration;

/// Bounded retry configuration for connection attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Ceiling for the exponential delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Calculate delay for retry with exponential backoff
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry_count);
        let delay = self.base_delay.saturating_mul(factor);

        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }
}

/// Bookkeeping for one connection sequence against a single target.
///
/// Created when a connect call begins and dropped once it resolves.
#[derive(Debug)]
pub struct ConnectionAttempt {
    target: String,
    attempt: u32,
    policy: RetryPolicy,
}

impl ConnectionAttempt {
    pub fn new<S: Into<String>>(target: S, policy: RetryPolicy) -> Self {
        Self {
            target: target.into(),
            attempt: 0,
            policy,
        }
    }

    /// Advance to the next attempt. Returns `false` once the budget is spent.
    pub fn begin(&mut self) -> bool {
        if self.attempt >= self.policy.max_attempts.max(1) {
            return false;
        }
        self.attempt += 1;
        true
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Attempts started so far
    pub fn count(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts.max(1)
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts()
    }

    /// Delay to wait before the next attempt
    pub fn backoff(&self) -> Duration {
        self.policy.delay_for(self.attempt.saturating_sub(1))
    }
}
