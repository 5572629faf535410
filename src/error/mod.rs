use crate::http::{RequestConfig, Response};
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The error type adapter implementations return from `can_handle` and `execute`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which registry a dispatch ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sync,
    Async,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sync => write!(f, "sync"),
            ExecutionMode::Async => write!(f, "async"),
        }
    }
}

/// Errors raised by adapters, their retry wrappers, and the adapter manager.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No adapter in the registry accepted the input, or every one that did failed.
    #[error("no suitable {mode} adapter found for input {input}")]
    NoSuitableAdapter {
        mode: ExecutionMode,
        /// `Debug` rendering of the input nobody handled.
        input: String,
        /// The failure of the last adapter that accepted the input, if any did.
        #[source]
        last_error: Option<Box<AdapterError>>,
    },

    /// Every attempt failed. Wraps the cause of the final attempt.
    #[error("adapter failed after {attempts} attempts for input {input}: {source}")]
    RetriesExhausted {
        /// `Debug` rendering of the input that was being executed.
        input: String,
        attempts: usize,
        #[source]
        source: Box<AdapterError>,
    },

    /// The admission queue was already holding `capacity` waiting executions.
    #[error("adapter queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// An asynchronous attempt lost its race against the configured timeout.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    /// A synchronous attempt returned, but only after its wall-clock budget ran out.
    #[error("execution took {elapsed:?}, exceeding the limit of {limit:?}")]
    ExecutionTimeExceeded { elapsed: Duration, limit: Duration },

    /// The adapter's own `execute` or `can_handle` failed.
    #[error("adapter execution failed: {0}")]
    Execution(#[source] BoxError),
}

impl AdapterError {
    /// The cause of the final attempt when this is `RetriesExhausted`.
    pub fn last_cause(&self) -> Option<&AdapterError> {
        match self {
            AdapterError::RetriesExhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Machine-readable classification of an [`HttpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    /// The timeout elapsed before a response arrived.
    Timeout,
    /// The transport failed for a reason other than a timeout.
    Network,
    /// The status validator rejected the response.
    Status,
    /// A request or response shape check failed.
    Validation,
    /// The caller's cancellation token fired.
    Cancelled,
}

impl HttpErrorKind {
    /// Stable string code for logs and telemetry.
    pub fn code(&self) -> &'static str {
        match self {
            HttpErrorKind::Timeout => "TIMEOUT",
            HttpErrorKind::Network => "NETWORK_ERROR",
            HttpErrorKind::Status => "REQUEST_FAILED",
            HttpErrorKind::Validation => "VALIDATION_FAILED",
            HttpErrorKind::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified HTTP failure.
///
/// Carries the request configuration that produced it and, for status and response
/// validation failures, the parsed response.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct HttpError {
    pub kind: HttpErrorKind,
    pub message: String,
    pub config: Box<RequestConfig>,
    pub response: Option<Box<Response>>,
    #[source]
    pub source: Option<BoxError>,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>, config: RequestConfig) -> Self {
        HttpError {
            kind,
            message: message.into(),
            config: Box::new(config),
            response: None,
            source: None,
        }
    }

    pub fn timeout(config: RequestConfig, after: Duration) -> Self {
        HttpError::new(
            HttpErrorKind::Timeout,
            format!("request timed out after {after:?}"),
            config,
        )
    }

    pub fn network(config: RequestConfig, source: BoxError) -> Self {
        let message = format!("network error: {source}");
        HttpError::new(HttpErrorKind::Network, message, config).with_source(source)
    }

    pub fn cancelled(config: RequestConfig) -> Self {
        HttpError::new(HttpErrorKind::Cancelled, "request was cancelled", config)
    }

    /// A status failure for `response`; the config is taken from the response.
    pub fn status(response: Response) -> Self {
        let message = format!(
            "request failed with status code {}",
            response.status.as_u16()
        );
        let config = response.config.clone();
        HttpError::new(HttpErrorKind::Status, message, config).with_response(response)
    }

    pub fn validation(config: RequestConfig, message: impl Into<String>) -> Self {
        HttpError::new(HttpErrorKind::Validation, message, config)
    }

    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(Box::new(response));
        self
    }

    pub fn with_source(mut self, source: BoxError) -> Self {
        self.source = Some(source);
        self
    }

    /// The status of the attached response, if there is one.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.response.as_ref().map(|response| response.status)
    }

    /// Whether the retry loop may resubmit the request after this failure.
    pub fn is_retryable(&self) -> bool {
        self.kind != HttpErrorKind::Cancelled
    }
}
