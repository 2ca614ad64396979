//! Token bucket implementation.

use std::time::Instant;

/// Policy parameters for a token bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketPolicy {
    /// Tokens granted per second of elapsed time.
    pub refill_rate: f64,
    /// Maximum tokens bankable (largest instantaneous burst allowed).
    pub burst_capacity: f64,
}

/// Default sustained rate: 2 requests per second.
pub const DEFAULT_REFILL_RATE: f64 = 2.0;
/// Default burst size: 4 requests.
pub const DEFAULT_BURST_CAPACITY: f64 = 4.0;

impl Default for BucketPolicy {
    fn default() -> Self {
        Self {
            refill_rate: DEFAULT_REFILL_RATE,
            burst_capacity: DEFAULT_BURST_CAPACITY,
        }
    }
}

/// A single client's token bucket.
///
/// Tokens accrue at `refill_rate` per second up to `burst_capacity`; each
/// admitted request consumes one token. The caller supplies `now` so that
/// refill arithmetic is deterministic under test.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    /// Remaining tokens, always within `[0, burst_capacity]`.
    tokens: f64,
    /// When tokens were last accrued.
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket, as seen on a client's first request.
    pub fn new(policy: &BucketPolicy, now: Instant) -> Self {
        Self {
            tokens: policy.burst_capacity,
            last_refill: now,
        }
    }

    /// Refill tokens for the time elapsed since the last refill, then try to
    /// consume one.
    ///
    /// Returns `true` if a token was consumed. A denied attempt does not
    /// change the token count beyond what the refill added. A `now` earlier
    /// than the last refill counts as zero elapsed time; tokens are never
    /// deducted for a backwards clock.
    pub fn try_acquire(&mut self, policy: &BucketPolicy, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed * policy.refill_rate).min(policy.burst_capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Get the current token count.
    pub fn tokens(&self) -> f64 {
        self.tokens
    }
}
