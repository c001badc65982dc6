//! Bounded retry for transient remote failures

use std::future::Future;

use tracing::warn;

use docqa_core::{Result, RetryConfig};

/// Run `operation` until it succeeds, fails with a non-transient error, or
/// `policy.max_attempts` is reached. The last error is returned unchanged.
pub async fn with_retry<T, F, Fut>(policy: &RetryConfig, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let wait = policy.backoff_for(attempt, e.retry_after());
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    backoff_ms = wait.as_millis() as u64,
                    error = %e,
                    "Retrying after transient error"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
