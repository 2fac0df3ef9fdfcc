//! Rate Limiting Infrastructure
//!
//! Policy types and the storage trait for the fixed-window counter.
//! The counter itself lives in a shared external store; concurrent
//! requests may race on the same key, so increments must be atomic at
//! the store level.

use std::time::Duration;
use thiserror::Error;

/// Rate limit policy: N attempts per window
///
/// An explicit, enumerated configuration constructed once at startup —
/// never per-call free-form options.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    /// Maximum attempts allowed in the window
    pub points: u32,
    /// Window length
    pub duration: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        // 10 attempts per 5 minutes
        Self {
            points: 10,
            duration: Duration::from_secs(5 * 60),
        }
    }
}

impl RateLimitPolicy {
    pub fn new(points: u32, duration_secs: u64) -> Self {
        Self {
            points,
            duration: Duration::from_secs(duration_secs),
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration.as_millis() as i64
    }

    /// Start of the window containing `now_ms`, aligned to the window length
    pub fn window_start_ms(&self, now_ms: i64) -> i64 {
        now_ms - now_ms.rem_euclid(self.duration_ms())
    }
}

/// Outcome of a consume attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Budget remains; request may proceed
    Allowed { remaining: u32 },
    /// Budget exceeded within the active window
    Limited,
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Store-level failure while consuming
///
/// Callers treat this as a limiter failure and fail closed (429) —
/// an unreachable counter store must never silently disable protection.
#[derive(Debug, Error)]
#[error("rate limit store unavailable: {0}")]
pub struct RateLimitStoreError(pub String);

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Atomically increment the counter for `key` and decide
    ///
    /// The post-increment count is compared against `policy.points`
    /// within the active window.
    async fn consume(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitStoreError>;
}
