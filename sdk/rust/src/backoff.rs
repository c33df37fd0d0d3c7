//! Exponential backoff between attempts.

use std::time::Duration;

/// Delay to wait after the zero-based `attempt` failed: `base * 2^attempt`.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base.saturating_mul(factor)
}
