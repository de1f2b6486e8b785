// CAS retry policy for the engine's optimistic write loop
use tracing::{debug, warn};

/// Retry decision after a lost compare-and-swap
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-read and retry (after a backoff delay in ms)
    Retry(u64),
    /// Attempt budget spent; surface `ConcurrencyExhausted`
    Exhausted,
}

/// Bounded retry policy for version conflicts
///
/// Backoff formula:
/// delay = base_delay * 2^(attempts - 1) * (1.0 ± 0.1)
#[derive(Debug, Clone, Copy)]
pub struct CasRetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
}

impl CasRetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_attempts` - Total CAS attempts per request (clamped to at least 1)
    /// * `base_delay_ms` - Base backoff delay in milliseconds (0 disables sleeping)
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what to do after `attempts` CAS attempts have all conflicted
    ///
    /// `jitter_key` (the participant id) spreads competing writers apart
    /// deterministically.
    pub fn after_conflict(&self, attempts: u32, jitter_key: &str) -> RetryDecision {
        if attempts >= self.max_attempts {
            warn!(
                attempts = attempts,
                max_attempts = self.max_attempts,
                "CAS retry budget exhausted"
            );
            return RetryDecision::Exhausted;
        }

        let exponent = attempts.saturating_sub(1).min(10);
        let base = self.base_delay_ms as f64 * 2f64.powi(exponent as i32);

        // ±10% jitter to avoid lockstep retries ("Thundering Herd")
        let jitter_seed = jitter_key.chars().map(|c| c as u32).sum::<u32>();
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0); // 0.9 to 1.1

        let delay_ms = (base * jitter_factor) as u64;

        debug!(
            attempt = attempts,
            max_attempts = self.max_attempts,
            delay_ms = delay_ms,
            "Retrying after version conflict"
        );

        RetryDecision::Retry(delay_ms)
    }
}
