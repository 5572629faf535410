use crate::Metadata;
use crate::config::AdapterConfig;
use crate::error::{AdapterError, BoxError};
use log::{info, warn};
use std::fmt::Debug;
use std::thread::sleep;
use std::time::Instant;

/// A blocking capability unit.
///
/// The manager first asks [`can_handle`](SyncAdapter::can_handle) and only calls
/// [`execute_with_retry`](SyncAdapter::execute_with_retry) when the answer is `Ok(true)`.
/// An error from the probe counts as "cannot handle".
///
/// Bare implementations execute once; wrap one in [`RetryingSyncAdapter`] to get
/// retries, backoff, and a wall-clock cap.
pub trait SyncAdapter<I, O>: Send + Sync {
    fn can_handle(&self, input: &I) -> Result<bool, BoxError>;

    fn execute(&self, input: &I) -> Result<O, BoxError>;

    /// Descriptive data about the adapter. Empty unless overridden.
    fn metadata(&self) -> Metadata {
        Metadata::new()
    }

    /// Dispatch priority; higher is tried first.
    fn priority(&self) -> i32 {
        1
    }

    /// The entry point the manager calls. Defaults to a single bare `execute`.
    fn execute_with_retry(&self, input: &I) -> Result<O, AdapterError> {
        self.execute(input).map_err(AdapterError::Execution)
    }
}

/// Retries a blocking operation according to `config`.
///
/// Each attempt is timed; when `config.max_execution_time` is set and an attempt runs
/// longer, its result is discarded and the attempt counts as a failure. Between failed
/// attempts the thread sleeps for the backoff delay.
///
/// # Returns
/// * `Ok(O)` from the first attempt that succeeds within its time budget.
/// * `Err(AdapterError::RetriesExhausted)` wrapping the final attempt's cause otherwise.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use resilient_adapters::config::AdapterConfig;
/// use resilient_adapters::error::AdapterError;
/// use resilient_adapters::synchronous::retry;
///
/// let mut config = AdapterConfig::default();
/// config.base_delay = Duration::from_millis(1);
///
/// let result: Result<u32, AdapterError> = retry(&7, &config, |_| Err("Temporary failure".into()));
/// assert!(matches!(result, Err(AdapterError::RetriesExhausted { attempts: 3, .. })));
/// ```
pub fn retry<I, O, F>(input: &I, config: &AdapterConfig, mut operation: F) -> Result<O, AdapterError>
where
    I: Debug + ?Sized,
    F: FnMut(&I) -> Result<O, BoxError>,
{
    let max_attempts = config.effective_retries();
    let mut attempts = 0;

    loop {
        let started = Instant::now();
        let outcome = operation(input);
        let elapsed = started.elapsed();

        let err = match outcome {
            Ok(output) => match config.max_execution_time {
                Some(limit) if elapsed > limit => {
                    AdapterError::ExecutionTimeExceeded { elapsed, limit }
                }
                _ => {
                    info!("Operation succeeded after {} attempts", attempts + 1);
                    return Ok(output);
                }
            },
            Err(err) => AdapterError::Execution(err),
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
            sleep(delay);
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

/// Wraps a [`SyncAdapter`] with retries, backoff, and a wall-clock cap.
///
/// Probes, metadata, and bare execution are forwarded to the inner adapter; priority
/// comes from the configuration.
#[derive(Debug)]
pub struct RetryingSyncAdapter<A> {
    inner: A,
    config: AdapterConfig,
}

impl<A> RetryingSyncAdapter<A> {
    pub fn new(inner: A, config: AdapterConfig) -> Self {
        RetryingSyncAdapter { inner, config }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<I, O, A> SyncAdapter<I, O> for RetryingSyncAdapter<A>
where
    I: Debug,
    A: SyncAdapter<I, O>,
{
    fn can_handle(&self, input: &I) -> Result<bool, BoxError> {
        self.inner.can_handle(input)
    }

    fn execute(&self, input: &I) -> Result<O, BoxError> {
        self.inner.execute(input)
    }

    fn metadata(&self) -> Metadata {
        self.inner.metadata()
    }

    fn priority(&self) -> i32 {
        self.config.priority
    }

    fn execute_with_retry(&self, input: &I) -> Result<O, AdapterError> {
        retry(input, &self.config, |input| self.inner.execute(input))
    }
}
