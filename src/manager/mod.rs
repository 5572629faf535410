use crate::Metadata;
use crate::asynchronous::AsyncAdapter;
use crate::error::{AdapterError, ExecutionMode};
use crate::synchronous::SyncAdapter;
use futures::future::join_all;
use log::{debug, info, warn};
use std::cmp::Reverse;
use std::fmt::Debug;
use std::sync::Arc;

/// A registry entry: the adapter plus the ordering key it was inserted with.
struct Registered<A: ?Sized> {
    priority: i32,
    sequence: u64,
    adapter: Arc<A>,
}

/// Outcome of offering an input to one adapter.
enum Attempt<O> {
    Handled(O),
    Declined,
    Failed(AdapterError),
}

/// Metadata of every registered adapter, in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterMetadata {
    pub sync: Vec<Metadata>,
    pub r#async: Vec<Metadata>,
}

/// Dispatches inputs across priority-ordered synchronous and asynchronous adapters.
///
/// Each registry is kept sorted by descending priority; adapters of equal priority
/// keep their registration order. Dispatch offers the input to each adapter in turn
/// and returns the first successful result. A declined probe, a failing probe, or a
/// failed execution moves on to the next adapter; only when the whole registry is
/// exhausted does the caller see [`AdapterError::NoSuitableAdapter`].
///
/// # Example
/// ```
/// use resilient_adapters::error::BoxError;
/// use resilient_adapters::manager::AdapterManager;
/// use resilient_adapters::synchronous::SyncAdapter;
///
/// struct Upper;
///
/// impl SyncAdapter<String, String> for Upper {
///     fn can_handle(&self, input: &String) -> Result<bool, BoxError> {
///         Ok(input.is_ascii())
///     }
///
///     fn execute(&self, input: &String) -> Result<String, BoxError> {
///         Ok(input.to_uppercase())
///     }
/// }
///
/// let mut manager: AdapterManager<String, String> = AdapterManager::new();
/// manager.register_sync(Upper);
/// assert_eq!(manager.execute_sync(&"hello".to_string()).unwrap(), "HELLO");
/// ```
pub struct AdapterManager<I, O>
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    sync_adapters: Vec<Registered<dyn SyncAdapter<I, O>>>,
    async_adapters: Vec<Registered<dyn AsyncAdapter<I, O>>>,
    next_sequence: u64,
}

impl<I, O> Default for AdapterManager<I, O>
where
    I: Debug + Send + Sync + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        AdapterManager::new()
    }
}

impl<I, O> AdapterManager<I, O>
where
    I: Debug + Send + Sync + 'static,
    O: Send + 'static,
{
    pub fn new() -> Self {
        AdapterManager {
            sync_adapters: Vec::new(),
            async_adapters: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Registers a synchronous adapter at the position its priority dictates.
    pub fn register_sync<A>(&mut self, adapter: A)
    where
        A: SyncAdapter<I, O> + 'static,
    {
        self.register_sync_shared(Arc::new(adapter));
    }

    /// Registers an already shared synchronous adapter.
    pub fn register_sync_shared(&mut self, adapter: Arc<dyn SyncAdapter<I, O>>) {
        let entry = Registered {
            priority: adapter.priority(),
            sequence: self.next_sequence(),
            adapter,
        };
        debug!(
            "Registering sync adapter with priority {}",
            entry.priority
        );
        insert_sorted(&mut self.sync_adapters, entry);
    }

    /// Registers an asynchronous adapter at the position its priority dictates.
    pub fn register_async<A>(&mut self, adapter: A)
    where
        A: AsyncAdapter<I, O> + 'static,
    {
        self.register_async_shared(Arc::new(adapter));
    }

    /// Registers an already shared asynchronous adapter.
    pub fn register_async_shared(&mut self, adapter: Arc<dyn AsyncAdapter<I, O>>) {
        let entry = Registered {
            priority: adapter.priority(),
            sequence: self.next_sequence(),
            adapter,
        };
        debug!(
            "Registering async adapter with priority {}",
            entry.priority
        );
        insert_sorted(&mut self.async_adapters, entry);
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    pub fn sync_len(&self) -> usize {
        self.sync_adapters.len()
    }

    pub fn async_len(&self) -> usize {
        self.async_adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sync_adapters.is_empty() && self.async_adapters.is_empty()
    }

    /// Offers `input` to the synchronous adapters in priority order.
    ///
    /// # Returns
    /// * `Ok(O)` from the first adapter that accepts the input and succeeds.
    /// * `Err(AdapterError::NoSuitableAdapter { mode: Sync, .. })` otherwise.
    pub fn execute_sync(&self, input: &I) -> Result<O, AdapterError> {
        let mut last_error = None;

        for (position, entry) in self.sync_adapters.iter().enumerate() {
            let attempt = match entry.adapter.can_handle(input) {
                Ok(true) => match entry.adapter.execute_with_retry(input) {
                    Ok(output) => Attempt::Handled(output),
                    Err(err) => Attempt::Failed(err),
                },
                Ok(false) => Attempt::Declined,
                Err(err) => Attempt::Failed(AdapterError::Execution(err)),
            };

            match attempt {
                Attempt::Handled(output) => {
                    info!("Sync adapter #{} handled the input", position);
                    return Ok(output);
                }
                Attempt::Declined => debug!("Sync adapter #{} declined the input", position),
                Attempt::Failed(err) => {
                    warn!("Sync adapter #{} failed: {}, trying next", position, err);
                    last_error = Some(Box::new(err));
                }
            }
        }

        Err(AdapterError::NoSuitableAdapter {
            mode: ExecutionMode::Sync,
            input: format!("{input:?}"),
            last_error,
        })
    }

    /// Offers `input` to the asynchronous adapters in priority order.
    ///
    /// # Returns
    /// * `Ok(O)` from the first adapter that accepts the input and succeeds.
    /// * `Err(AdapterError::NoSuitableAdapter { mode: Async, .. })` otherwise.
    pub async fn execute_async(&self, input: &I) -> Result<O, AdapterError> {
        let mut last_error = None;

        for (position, entry) in self.async_adapters.iter().enumerate() {
            let attempt = match entry.adapter.can_handle(input).await {
                Ok(true) => match entry.adapter.execute_with_retry(input).await {
                    Ok(output) => Attempt::Handled(output),
                    Err(err) => Attempt::Failed(err),
                },
                Ok(false) => Attempt::Declined,
                Err(err) => Attempt::Failed(AdapterError::Execution(err)),
            };

            match attempt {
                Attempt::Handled(output) => {
                    info!("Async adapter #{} handled the input", position);
                    return Ok(output);
                }
                Attempt::Declined => debug!("Async adapter #{} declined the input", position),
                Attempt::Failed(err) => {
                    warn!("Async adapter #{} failed: {}, trying next", position, err);
                    last_error = Some(Box::new(err));
                }
            }
        }

        Err(AdapterError::NoSuitableAdapter {
            mode: ExecutionMode::Async,
            input: format!("{input:?}"),
            last_error,
        })
    }

    /// Tries the whole synchronous registry, then the whole asynchronous one.
    ///
    /// The asynchronous registry is only consulted when no synchronous adapter produced
    /// a result. If both are exhausted the asynchronous failure is returned.
    ///
    /// Synchronous adapters block the calling task while they run, backoff sleeps
    /// included. Give retrying sync adapters used here a near-zero `base_delay`.
    pub async fn execute_auto(&self, input: &I) -> Result<O, AdapterError> {
        match self.execute_sync(input) {
            Ok(output) => Ok(output),
            Err(err) => {
                info!("Sync dispatch exhausted ({}), falling back to async", err);
                self.execute_async(input).await
            }
        }
    }

    /// Collects metadata from every adapter.
    ///
    /// Synchronous adapters are queried one after another, asynchronous adapters
    /// concurrently. Both lists follow registry order.
    pub async fn metadata(&self) -> AdapterMetadata {
        let sync = self
            .sync_adapters
            .iter()
            .map(|entry| entry.adapter.metadata())
            .collect();
        let r#async = join_all(
            self.async_adapters
                .iter()
                .map(|entry| entry.adapter.metadata()),
        )
        .await;

        AdapterMetadata { sync, r#async }
    }
}

/// Inserts `entry` keeping the registry ordered by `(Reverse(priority), sequence)`.
fn insert_sorted<A: ?Sized>(registry: &mut Vec<Registered<A>>, entry: Registered<A>) {
    let key = (Reverse(entry.priority), entry.sequence);
    let position = registry.partition_point(|existing| {
        (Reverse(existing.priority), existing.sequence) <= key
    });
    registry.insert(position, entry);
}
