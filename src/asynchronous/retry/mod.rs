use crate::config::AdapterConfig;
use crate::error::{AdapterError, BoxError};
use log::{info, warn};
use std::fmt::Debug;
use tokio::time::{sleep, timeout};

/// Retries an asynchronous operation according to `config`.
///
/// Every attempt is raced against `config.timeout` when one is set. The losing attempt
/// is dropped, which cancels it at its next suspension point. Between failed attempts
/// the task sleeps for the backoff delay of `config.backoff`.
///
/// # Arguments
/// * `input` - The input being executed, used to describe the failure on exhaustion.
/// * `config` - Attempt budget, timeout, and backoff settings.
/// * `operation` - A closure producing one attempt's future.
///
/// # Returns
/// * `Ok(O)` if an attempt succeeds within the budget.
/// * `Err(AdapterError::RetriesExhausted)` wrapping the final attempt's cause otherwise.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use resilient_adapters::asynchronous::retry::retry;
/// use resilient_adapters::config::{AdapterConfig, ConfigOverrides};
/// use resilient_adapters::error::BoxError;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let config = AdapterConfig::with_overrides(
///         &ConfigOverrides::default().base_delay(Duration::from_millis(1)),
///     );
///     let result = retry(&"ping", &config, || async { Ok::<_, BoxError>("pong") }).await;
///     assert_eq!(result.unwrap(), "pong");
/// }
/// ```
pub async fn retry<I, O, F, Fut>(
    input: &I,
    config: &AdapterConfig,
    mut operation: F,
) -> Result<O, AdapterError>
where
    I: Debug + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<O, BoxError>>,
{
    let max_attempts = config.effective_retries();
    let mut attempts = 0;

    loop {
        let attempt = operation();
        let outcome = match config.timeout {
            Some(limit) => match timeout(limit, attempt).await {
                Ok(result) => result.map_err(AdapterError::Execution),
                Err(_) => Err(AdapterError::Timeout(limit)),
            },
            None => attempt.await.map_err(AdapterError::Execution),
        };

        let err = match outcome {
            Ok(output) => {
                info!("Operation succeeded after {} attempts", attempts + 1);
                return Ok(output);
            }
            Err(err) => err,
        };

        if attempts + 1 < max_attempts {
            let delay = config.backoff.calculate_delay(config.base_delay, attempts);
            warn!(
                "Operation failed (attempt {}/{}): {}, retrying after {:?}...",
                attempts + 1,
                max_attempts,
                err,
                delay
            );
            sleep(delay).await;
        } else {
            warn!(
                "Operation failed after {} attempts, giving up.",
                attempts + 1
            );
            return Err(AdapterError::RetriesExhausted {
                input: format!("{input:?}"),
                attempts: attempts + 1,
                source: Box::new(err),
            });
        }

        attempts += 1;
    }
}
