//! Rate Limiter (Token Bucket Algorithm)
//!
//! Caps mutating waitlist calls (join, leave, remove, queue admin) per
//! second. Lock-free: the bucket state is one packed atomic word.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Token bucket shared by all connections of one server
pub struct RateLimiter {
    // Upper 32 bits: available tokens
    // Lower 32 bits: last refill, in ms since `created_at`, modulo 2^32
    packed: AtomicU64,
    created_at: Instant,
    max_tokens: u32,
    refill_per_sec: u32,
}

impl RateLimiter {
    /// Create a full bucket
    ///
    /// # Arguments
    /// * `max_tokens` - Maximum burst size
    /// * `refill_per_sec` - Tokens added per second
    ///
    /// # Example
    /// Allow 100 requests/sec with burst of 200:
    /// `RateLimiter::new(200, 100)`
    pub fn new(max_tokens: u32, refill_per_sec: u32) -> Self {
        Self {
            packed: AtomicU64::new(pack(max_tokens, 0)),
            created_at: Instant::now(),
            max_tokens,
            refill_per_sec,
        }
    }

    /// Take one token; false means the caller is throttled
    pub fn try_acquire(&self) -> bool {
        loop {
            let current = self.packed.load(Ordering::Acquire);
            let (tokens, last_refill_ms) = unpack(current);

            // Truncation wraps every ~49.7 days; `refill` works modulo 2^32
            let now_ms = self.created_at.elapsed().as_millis() as u32;
            let (refilled, refill_ms) = self.refill(tokens, last_refill_ms, now_ms);

            let (next, allowed) = if refilled >= 1 {
                (pack(refilled - 1, refill_ms), true)
            } else {
                (pack(refilled, refill_ms), false)
            };

            // CAS: retry if another caller moved the bucket meanwhile
            if self
                .packed
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return allowed;
            }
        }
    }

    /// Tokens left as of the last acquire (for logging)
    pub fn available(&self) -> u32 {
        unpack(self.packed.load(Ordering::Acquire)).0
    }

    /// Returns the refilled token count and the new refill mark
    ///
    /// The mark only advances by the time actually converted into tokens,
    /// so frequent callers do not discard partial refills.
    fn refill(&self, tokens: u32, last_refill_ms: u32, now_ms: u32) -> (u32, u32) {
        let elapsed_ms = now_ms.wrapping_sub(last_refill_ms) as u64;
        let added = elapsed_ms * self.refill_per_sec as u64 / 1000;
        if added == 0 {
            return (tokens, last_refill_ms);
        }

        let total = tokens as u64 + added;
        if total >= self.max_tokens as u64 {
            (self.max_tokens, now_ms)
        } else {
            let consumed_ms = added * 1000 / self.refill_per_sec as u64;
            (total as u32, last_refill_ms.wrapping_add(consumed_ms as u32))
        }
    }
}

fn pack(tokens: u32, refill_ms: u32) -> u64 {
    ((tokens as u64) << 32) | refill_ms as u64
}

fn unpack(packed: u64) -> (u32, u32) {
    ((packed >> 32) as u32, (packed & 0xFFFF_FFFF) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::{sleep, Duration};

    #[test]
    fn test_allows_burst_then_denies() {
        let limiter = RateLimiter::new(10, 10);

        for _ in 0..10 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.available(), 0);
    }

    #[test]
    fn test_partial_refills_accumulate() {
        let limiter = RateLimiter::new(10, 10);
        for _ in 0..10 {
            assert!(limiter.try_acquire());
        }

        // 150ms is 1.5 tokens: one now, the half token is kept
        let (tokens, mark) = limiter.refill(0, 0, 150);
        assert_eq!((tokens, mark), (1, 100));
        let (tokens, mark) = limiter.refill(tokens - 1, mark, 200);
        assert_eq!((tokens, mark), (1, 200));
    }

    #[test]
    fn test_refill_continues_across_clock_wrap() {
        let limiter = RateLimiter::new(10, 10);
        let mark = u32::MAX - 50;

        // 100ms elapsed, straddling the wrap point
        assert_eq!(limiter.refill(0, mark, 49), (1, 49));
        // Partial refill whose new mark lands past the wrap
        assert_eq!(limiter.refill(0, mark, 120), (1, 49));
        // Long enough to fill the bucket
        assert_eq!(limiter.refill(9, mark, 149), (10, 149));
        // Just before the wrap behaves as before
        assert_eq!(limiter.refill(0, mark, u32::MAX), (0, mark));
    }

    #[tokio::test]
    async fn test_refills_over_time() {
        let limiter = RateLimiter::new(5, 10); // 10 tokens/sec

        for _ in 0..5 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());

        sleep(Duration::from_millis(300)).await;

        // ~3 tokens back
        assert!(limiter.try_acquire());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_bucket() {
        let limiter = Arc::new(RateLimiter::new(100, 1)); // burst 100, slow refill

        let mut handles = vec![];
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                (0..20).filter(|_| limiter.try_acquire()).count()
            }));
        }

        let mut total_allowed = 0;
        for handle in handles {
            total_allowed += handle.await.unwrap();
        }

        // 200 attempts against a burst of 100
        assert!(
            (100..=101).contains(&total_allowed),
            "Expected about 100 allowed, got {}",
            total_allowed
        );
    }
}
