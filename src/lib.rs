/// The `asynchronous` module provides the asynchronous adapter contract together with
/// the machinery that makes it resilient: a FIFO admission queue that bounds the number
/// of in-flight executions, and a retry loop that races every attempt against a timeout.
pub mod asynchronous;

/// The `config` module holds the adapter configuration and the override layer used to
/// merge built-in defaults with adapter-level and call-site settings.
pub mod config;

/// Error types raised by adapters, the dispatch layer, and the HTTP client.
pub mod error;

/// The `http` module is a small HTTP client built on the same retry and backoff ideas
/// as the adapters. Call-site options are merged over the client defaults, passed
/// through request interceptors, sent by a transport, parsed, and passed through
/// response interceptors; failures are classified, offered to error interceptors,
/// and retried with exponential backoff.
pub mod http;

/// The `manager` module dispatches inputs across a priority-ordered set of synchronous
/// and asynchronous adapters, falling back from one adapter to the next and from the
/// synchronous registry to the asynchronous one.
pub mod manager;

/// The `strategies` module defines the backoff strategies used between retry attempts.
///
/// This module is utilized by both synchronous and asynchronous retry mechanisms.
pub mod strategies;

/// The `synchronous` module provides the blocking adapter contract and its retrying,
/// wall-clock-capped wrapper.
pub mod synchronous;

pub use asynchronous::{AsyncAdapter, ConcurrencyQueue, QueuedAsyncAdapter};
pub use config::{AdapterConfig, ConfigOverrides};
pub use error::{AdapterError, BoxError, ExecutionMode, HttpError, HttpErrorKind};
pub use http::HttpClient;
pub use manager::AdapterManager;
pub use strategies::RetryStrategy;
pub use synchronous::{RetryingSyncAdapter, SyncAdapter};

/// Free-form descriptive data an adapter may expose about itself.
pub type Metadata = std::collections::HashMap<String, serde_json::Value>;
