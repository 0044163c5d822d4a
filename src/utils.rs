use std::time::Duration;

use tracing::{debug, error, warn};

use crate::errors::constants::MAX_RETRY_DELAY_MS;

/// Retry logic with exponential backoff.
///
/// Errors for which `is_retryable` returns false are returned at once.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    mut operation: F,
    is_retryable: P,
    max_attempts: u32,
    initial_delay: Duration,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempts = 0;
    let mut delay = initial_delay;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    debug!(attempts = attempts, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                if !is_retryable(&error) {
                    debug!(attempts = attempts, error = %error, "Operation failed, not retryable");
                    return Err(error);
                }

                if attempts >= max_attempts {
                    error!(
                        attempts = attempts,
                        error = %error,
                        "Operation failed after maximum retry attempts"
                    );
                    return Err(error);
                }

                warn!(
                    attempt = attempts,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "Operation failed, retrying with backoff"
                );

                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_millis(MAX_RETRY_DELAY_MS));
            }
        }
    }
}
