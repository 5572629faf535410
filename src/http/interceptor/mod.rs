use crate::error::HttpError;
use crate::http::request::RequestConfig;
use crate::http::response::Response;
use async_trait::async_trait;
use log::debug;
use std::fmt;
use std::sync::Arc;

/// Runs before the transport; may rewrite the request or reject it.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn on_request(&self, config: RequestConfig) -> Result<RequestConfig, HttpError>;
}

/// Runs after a successful transport stage; may rewrite the response or reject it.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn on_response(&self, response: Response) -> Result<Response, HttpError>;
}

/// Offered every failure. Returning `Ok` recovers with a substitute response;
/// returning `Err` passes the (possibly replaced) failure on.
#[async_trait]
pub trait ErrorInterceptor: Send + Sync {
    async fn on_error(&self, error: HttpError) -> Result<Response, HttpError>;
}

/// A [`RequestInterceptor`] built from an async closure. See [`request_fn`].
pub struct RequestFn<F>(F);

/// A [`ResponseInterceptor`] built from an async closure. See [`response_fn`].
pub struct ResponseFn<F>(F);

/// An [`ErrorInterceptor`] built from an async closure. See [`error_fn`].
pub struct ErrorFn<F>(F);

/// Wraps an async closure as a request interceptor.
///
/// # Example
/// ```
/// use reqwest::header::HeaderValue;
/// use resilient_adapters::http::interceptor::request_fn;
///
/// let stamp = request_fn(|mut config| async move {
///     config.headers.insert("x-client", HeaderValue::from_static("resilient"));
///     Ok(config)
/// });
/// ```
pub fn request_fn<F, Fut>(f: F) -> RequestFn<F>
where
    F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RequestConfig, HttpError>> + Send + 'static,
{
    RequestFn(f)
}

/// Wraps an async closure as a response interceptor.
pub fn response_fn<F, Fut>(f: F) -> ResponseFn<F>
where
    F: Fn(Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HttpError>> + Send + 'static,
{
    ResponseFn(f)
}

/// Wraps an async closure as an error interceptor.
pub fn error_fn<F, Fut>(f: F) -> ErrorFn<F>
where
    F: Fn(HttpError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HttpError>> + Send + 'static,
{
    ErrorFn(f)
}

#[async_trait]
impl<F, Fut> RequestInterceptor for RequestFn<F>
where
    F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RequestConfig, HttpError>> + Send + 'static,
{
    async fn on_request(&self, config: RequestConfig) -> Result<RequestConfig, HttpError> {
        (self.0)(config).await
    }
}

#[async_trait]
impl<F, Fut> ResponseInterceptor for ResponseFn<F>
where
    F: Fn(Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HttpError>> + Send + 'static,
{
    async fn on_response(&self, response: Response) -> Result<Response, HttpError> {
        (self.0)(response).await
    }
}

#[async_trait]
impl<F, Fut> ErrorInterceptor for ErrorFn<F>
where
    F: Fn(HttpError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HttpError>> + Send + 'static,
{
    async fn on_error(&self, error: HttpError) -> Result<Response, HttpError> {
        (self.0)(error).await
    }
}

/// An ordered list of interceptors, applied in registration order.
pub struct InterceptorChain<T: ?Sized> {
    handlers: Vec<Arc<T>>,
}

impl<T: ?Sized> Default for InterceptorChain<T> {
    fn default() -> Self {
        InterceptorChain {
            handlers: Vec::new(),
        }
    }
}

impl<T: ?Sized> Clone for InterceptorChain<T> {
    fn clone(&self) -> Self {
        InterceptorChain {
            handlers: self.handlers.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for InterceptorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.handlers.len())
            .finish()
    }
}

impl<T: ?Sized> InterceptorChain<T> {
    pub fn new() -> Self {
        InterceptorChain::default()
    }

    /// Appends `handler`; it runs after every handler registered before it.
    pub fn push(&mut self, handler: Arc<T>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Removes every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl InterceptorChain<dyn RequestInterceptor> {
    /// Threads `config` through every interceptor; the first rejection stops the chain.
    pub async fn apply(&self, mut config: RequestConfig) -> Result<RequestConfig, HttpError> {
        for handler in &self.handlers {
            config = handler.on_request(config).await?;
        }
        Ok(config)
    }
}

impl InterceptorChain<dyn ResponseInterceptor> {
    /// Threads `response` through every interceptor; the first rejection stops the chain.
    pub async fn apply(&self, mut response: Response) -> Result<Response, HttpError> {
        for handler in &self.handlers {
            response = handler.on_response(response).await?;
        }
        Ok(response)
    }
}

impl InterceptorChain<dyn ErrorInterceptor> {
    /// Offers `error` to each interceptor until one recovers.
    ///
    /// An interceptor that returns `Err` replaces the current failure for the ones
    /// after it. If nobody recovers, the last failure is returned.
    pub async fn recover(&self, error: HttpError) -> Result<Response, HttpError> {
        let mut current = error;
        for (position, handler) in self.handlers.iter().enumerate() {
            match handler.on_error(current).await {
                Ok(response) => {
                    debug!("Error interceptor #{} recovered the request", position);
                    return Ok(response);
                }
                Err(next) => current = next,
            }
        }
        Err(current)
    }
}

/// The three interceptor chains of an HTTP client.
#[derive(Debug, Clone, Default)]
pub struct Interceptors {
    pub request: InterceptorChain<dyn RequestInterceptor>,
    pub response: InterceptorChain<dyn ResponseInterceptor>,
    pub error: InterceptorChain<dyn ErrorInterceptor>,
}
