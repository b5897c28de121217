//! Retry policy for WDQS calls.

use std::time::Duration;

/// Explicit retry policy shared by every query path.
///
/// Two backoff schedules. Rate limiting (HTTP 429) backs off from an
/// elevated floor: WDQS expects clients to go quiet for a while once told
/// off. Transient transport failures back off exponentially from the
/// configured call delay.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts before giving up.
    pub max_attempts: u32,
    /// Base unit for backoff; normally the inter-call delay.
    pub base_delay: Duration,
    /// Minimum wait after a 429.
    pub rate_limit_floor: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            rate_limit_floor: Duration::from_secs(10),
        }
    }

    /// Wait before retrying a rate-limited call. `attempt` is zero-based.
    pub fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt + 2).min(16);
        self.base_delay.saturating_mul(factor).max(self.rate_limit_floor)
    }

    /// Wait before retrying after a transient transport failure.
    pub fn transport_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt + 1).min(16);
        self.base_delay.saturating_mul(factor)
    }

    /// Whether a transport error is worth retrying. Connection resets and
    /// timeouts are; anything else (TLS, redirect loops, body decoding) is
    /// not, because a garbled response must not be retried into the caches.
    pub fn is_retryable(&self, err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }
}
