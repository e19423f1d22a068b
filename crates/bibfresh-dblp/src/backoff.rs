//! Retry schedule for DBLP's rate policy.

use std::time::Duration;

/// Maximum lookup attempts per title before giving up.
pub const MAX_ATTEMPTS: u32 = 5;

/// Courtesy pause before every request to dblp.org, unconditional.
pub const COURTESY_DELAY: Duration = Duration::from_secs(1);

/// Pause after a transient failure before the next attempt.
pub const TRANSIENT_DELAY: Duration = Duration::from_secs(2);

/// Bounded exponential backoff for 429 responses.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

impl Backoff {
    /// Delay before retrying after the given zero-based attempt:
    /// `2^attempt + 1` seconds.
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(attempt) + 1)
    }
}
