use crate::strategies::RetryStrategy;
use std::time::Duration;

/// Configuration shared by synchronous and asynchronous adapters.
///
/// Built-in defaults come from [`Default`]; adapter-level and call-site settings are
/// layered on top with [`AdapterConfig::merge`] using a [`ConfigOverrides`]. Fields that
/// only matter for one adapter kind are ignored by the other.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    /// Per-attempt timeout for asynchronous adapters. `None` disables the race.
    pub timeout: Option<Duration>,

    /// The maximum number of attempts, including the first one.
    ///
    /// A value of `0` is treated as `1`: at least one attempt is always performed.
    pub retries: usize,

    /// The maximum number of executions an asynchronous adapter runs at once.
    pub concurrency: usize,

    /// The maximum number of executions allowed to wait for a free slot.
    ///
    /// Submissions beyond this are rejected immediately rather than queued.
    pub queue_capacity: usize,

    /// The strategy used to compute the delay between attempts.
    pub backoff: RetryStrategy,

    /// The unit the backoff strategy multiplies. Defaults to one second.
    pub base_delay: Duration,

    /// Dispatch priority. Higher values are tried first by the manager.
    pub priority: i32,

    /// Wall-clock cap for a single synchronous attempt.
    ///
    /// A blocking call cannot be preempted, so an attempt that exceeds this is
    /// counted as failed once it returns, even if it produced a value.
    pub max_execution_time: Option<Duration>,
}

impl Default for AdapterConfig {
    /// Provides the built-in defaults:
    /// - `timeout`: 30 seconds
    /// - `retries`: 3
    /// - `concurrency`: 5
    /// - `queue_capacity`: 100
    /// - `backoff`: `ExponentialBackoff`
    /// - `base_delay`: 1 second
    /// - `priority`: 1
    /// - `max_execution_time`: 5 seconds
    fn default() -> Self {
        AdapterConfig {
            timeout: Some(Duration::from_secs(30)),
            retries: 3,
            concurrency: 5,
            queue_capacity: 100,
            backoff: RetryStrategy::ExponentialBackoff,
            base_delay: Duration::from_millis(1000),
            priority: 1,
            max_execution_time: Some(Duration::from_secs(5)),
        }
    }
}

impl AdapterConfig {
    /// Creates the built-in defaults with caller overrides applied on top.
    ///
    /// # Examples
    /// ```
    /// use resilient_adapters::config::{AdapterConfig, ConfigOverrides};
    ///
    /// let config = AdapterConfig::with_overrides(&ConfigOverrides::default().retries(5));
    /// assert_eq!(config.retries, 5);
    /// assert_eq!(config.priority, 1);
    /// ```
    pub fn with_overrides(overrides: &ConfigOverrides) -> Self {
        AdapterConfig::default().merge(overrides)
    }

    /// Returns a copy of `self` where every value set in `overrides` wins.
    ///
    /// Chaining merges gives the precedence order
    /// `defaults < adapter-level < call-site`.
    pub fn merge(&self, overrides: &ConfigOverrides) -> Self {
        AdapterConfig {
            timeout: overrides.timeout.unwrap_or(self.timeout),
            retries: overrides.retries.unwrap_or(self.retries),
            concurrency: overrides.concurrency.unwrap_or(self.concurrency),
            queue_capacity: overrides.queue_capacity.unwrap_or(self.queue_capacity),
            backoff: overrides.backoff.unwrap_or(self.backoff),
            base_delay: overrides.base_delay.unwrap_or(self.base_delay),
            priority: overrides.priority.unwrap_or(self.priority),
            max_execution_time: overrides
                .max_execution_time
                .unwrap_or(self.max_execution_time),
        }
    }

    /// The number of attempts actually performed, never less than one.
    pub fn effective_retries(&self) -> usize {
        self.retries.max(1)
    }

    /// The concurrency limit actually enforced, never less than one.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// Sets the backoff strategy and returns the modified `AdapterConfig`.
    pub fn with_backoff(mut self, backoff: RetryStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the dispatch priority and returns the modified `AdapterConfig`.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the attempt budget and returns the modified `AdapterConfig`.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }
}

/// Optional values layered over an [`AdapterConfig`].
///
/// Unset fields leave the underlying value alone. The per-attempt timeout and the
/// execution cap are `Option<Option<Duration>>` so a caller can explicitly disable them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub timeout: Option<Option<Duration>>,
    pub retries: Option<usize>,
    pub concurrency: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub backoff: Option<RetryStrategy>,
    pub base_delay: Option<Duration>,
    pub priority: Option<i32>,
    pub max_execution_time: Option<Option<Duration>>,
}

impl ConfigOverrides {
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = Some(queue_capacity);
        self
    }

    pub fn backoff(mut self, backoff: RetryStrategy) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = Some(base_delay);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn max_execution_time(mut self, max_execution_time: Option<Duration>) -> Self {
        self.max_execution_time = Some(max_execution_time);
        self
    }
}
