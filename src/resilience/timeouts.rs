//! Timeout enforcement for upstream calls.
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the in-flight future is dropped
//! - Timeout errors are distinct from other upstream errors

use std::future::Future;
use std::time::Duration;

use crate::error::RelayError;

/// Run `fut` with a deadline of `secs` seconds.
pub async fn with_timeout<F, T>(secs: u64, fut: F) -> Result<T, RelayError>
where
    F: Future<Output = Result<T, RelayError>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(RelayError::Timeout(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_future_times_out() {
        let result: Result<(), _> = with_timeout(1, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(RelayError::Timeout(1))));
    }

    #[tokio::test]
    async fn fast_future_passes_through() {
        let result = with_timeout(1, async { Ok::<_, RelayError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
