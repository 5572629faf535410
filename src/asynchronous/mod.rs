use crate::Metadata;
use crate::config::AdapterConfig;
use crate::error::{AdapterError, BoxError};
use async_trait::async_trait;
use log::debug;
use std::fmt::Debug;

/// The FIFO admission queue bounding in-flight executions.
pub mod queue;
/// The timeout-racing retry loop.
pub mod retry;

pub use queue::{ConcurrencyQueue, SlotPermit};

/// A non-blocking capability unit.
///
/// The manager probes [`can_handle`](AsyncAdapter::can_handle) and, on `Ok(true)`, calls
/// [`execute_with_retry`](AsyncAdapter::execute_with_retry). Bare implementations run
/// `execute` once; wrap one in [`QueuedAsyncAdapter`] for queueing, a concurrency limit,
/// per-attempt timeouts, and retries.
#[async_trait]
pub trait AsyncAdapter<I, O>: Send + Sync
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    async fn can_handle(&self, input: &I) -> Result<bool, BoxError>;

    async fn execute(&self, input: &I) -> Result<O, BoxError>;

    /// Descriptive data about the adapter. Empty unless overridden.
    async fn metadata(&self) -> Metadata {
        Metadata::new()
    }

    /// Dispatch priority; higher is tried first.
    fn priority(&self) -> i32 {
        1
    }

    /// The entry point the manager calls. Defaults to a single bare `execute`.
    async fn execute_with_retry(&self, input: &I) -> Result<O, AdapterError> {
        self.execute(input).await.map_err(AdapterError::Execution)
    }
}

/// Wraps an [`AsyncAdapter`] with an admission queue and a retry loop.
///
/// One call to `execute_with_retry` occupies one concurrency slot for its whole retry
/// sequence, backoff sleeps included. Calls beyond the queue capacity fail immediately
/// with [`AdapterError::QueueFull`].
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use resilient_adapters::asynchronous::{AsyncAdapter, QueuedAsyncAdapter};
/// use resilient_adapters::config::AdapterConfig;
/// use resilient_adapters::error::BoxError;
///
/// struct Doubler;
///
/// #[async_trait]
/// impl AsyncAdapter<u32, u32> for Doubler {
///     async fn can_handle(&self, input: &u32) -> Result<bool, BoxError> {
///         Ok(*input < 1000)
///     }
///
///     async fn execute(&self, input: &u32) -> Result<u32, BoxError> {
///         Ok(input * 2)
///     }
/// }
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let adapter = QueuedAsyncAdapter::new(Doubler, AdapterConfig::default());
///     assert_eq!(adapter.execute_with_retry(&21).await.unwrap(), 42);
/// }
/// ```
#[derive(Debug)]
pub struct QueuedAsyncAdapter<A> {
    inner: A,
    config: AdapterConfig,
    queue: ConcurrencyQueue,
}

impl<A> QueuedAsyncAdapter<A> {
    pub fn new(inner: A, config: AdapterConfig) -> Self {
        let queue = ConcurrencyQueue::new(config.effective_concurrency(), config.queue_capacity);
        QueuedAsyncAdapter {
            inner,
            config,
            queue,
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn queue(&self) -> &ConcurrencyQueue {
        &self.queue
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<I, O, A> AsyncAdapter<I, O> for QueuedAsyncAdapter<A>
where
    I: Debug + Send + Sync + 'static,
    O: Send + 'static,
    A: AsyncAdapter<I, O>,
{
    async fn can_handle(&self, input: &I) -> Result<bool, BoxError> {
        self.inner.can_handle(input).await
    }

    async fn execute(&self, input: &I) -> Result<O, BoxError> {
        self.inner.execute(input).await
    }

    async fn metadata(&self) -> Metadata {
        self.inner.metadata().await
    }

    fn priority(&self) -> i32 {
        self.config.priority
    }

    async fn execute_with_retry(&self, input: &I) -> Result<O, AdapterError> {
        let _permit = self.queue.acquire().await?;
        debug!(
            "Admitted execution ({}/{} slots in use)",
            self.queue.active(),
            self.queue.limit()
        );
        retry::retry(input, &self.config, || self.inner.execute(input)).await
    }
}
