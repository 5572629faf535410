use crate::error::BoxError;
use crate::http::response::ResponseBody;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Decides whether a response status counts as success.
pub type StatusValidator = Arc<dyn Fn(StatusCode) -> bool + Send + Sync>;

/// Rewrites the request body (and possibly headers) right before it is serialized.
pub type RequestTransformer = Arc<dyn Fn(RequestBody, &mut HeaderMap) -> RequestBody + Send + Sync>;

/// Rewrites the parsed response body before status validation.
pub type ResponseTransformer = Arc<dyn Fn(ResponseBody) -> ResponseBody + Send + Sync>;

/// A request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized to JSON text; sets `content-type: application/json` unless present.
    Json(Value),
    /// Sent as-is; sets `content-type: text/plain; charset=utf-8` unless present.
    Text(String),
    /// Sent as-is, without touching headers.
    Bytes(Bytes),
}

impl RequestBody {
    /// Encodes the body for the wire, filling in a content type when none was given.
    pub(crate) fn encode(self, headers: &mut HeaderMap) -> Option<Bytes> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(value) => {
                set_default_content_type(headers, "application/json");
                Some(Bytes::from(value.to_string()))
            }
            RequestBody::Text(text) => {
                set_default_content_type(headers, "text/plain; charset=utf-8");
                Some(Bytes::from(text))
            }
            RequestBody::Bytes(bytes) => Some(bytes),
        }
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

fn set_default_content_type(headers: &mut HeaderMap, content_type: &'static str) {
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
}

/// A fully resolved request: client defaults merged with call-site options.
///
/// Request interceptors receive and return this type, so they can rewrite any part of
/// the request before it reaches the transport.
#[derive(Clone)]
pub struct RequestConfig {
    pub method: Method,
    /// The resolved target; absolute once merged against a base URL.
    pub url: String,
    pub base_url: Option<String>,
    pub headers: HeaderMap,
    /// Query parameters appended to the URL. `null` values are skipped.
    pub params: Vec<(String, Value)>,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
    /// How many times the request may be resubmitted after the first failure.
    pub retries: u32,
    /// Base unit of the exponential delay between resubmissions.
    pub retry_delay: Duration,
    pub validate_status: StatusValidator,
    pub transform_request: Option<RequestTransformer>,
    pub transform_response: Option<ResponseTransformer>,
    pub cancel: Option<CancellationToken>,
}

impl Default for RequestConfig {
    /// Client defaults: `GET`, 10 second timeout, 3 retries with a 1 second base
    /// delay, and 2xx statuses treated as success.
    fn default() -> Self {
        RequestConfig {
            method: Method::GET,
            url: String::new(),
            base_url: None,
            headers: HeaderMap::new(),
            params: Vec::new(),
            body: RequestBody::Empty,
            timeout: Some(Duration::from_secs(10)),
            retries: 3,
            retry_delay: Duration::from_millis(1000),
            validate_status: Arc::new(|status: StatusCode| status.is_success()),
            transform_request: None,
            transform_response: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl RequestConfig {
    /// Overlays call-site `options` on `self`. Call-site values win; headers and
    /// params are merged key by key.
    pub fn merge(&self, options: RequestOptions) -> RequestConfig {
        let base_url = options.base_url.or_else(|| self.base_url.clone());
        let url = options.url.unwrap_or_else(|| self.url.clone());
        let url = resolve_url(base_url.as_deref(), &url);

        let mut headers = self.headers.clone();
        for name in options.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in options.headers.iter() {
            headers.append(name, value.clone());
        }

        let mut params: Vec<(String, Value)> = self
            .params
            .iter()
            .filter(|(key, _)| !options.params.iter().any(|(other, _)| other == key))
            .cloned()
            .collect();
        params.extend(options.params);

        RequestConfig {
            method: options.method.unwrap_or_else(|| self.method.clone()),
            url,
            base_url,
            headers,
            params,
            body: options.body.unwrap_or_else(|| self.body.clone()),
            timeout: options.timeout.unwrap_or(self.timeout),
            retries: options.retries.unwrap_or(self.retries),
            retry_delay: options.retry_delay.unwrap_or(self.retry_delay),
            validate_status: options
                .validate_status
                .unwrap_or_else(|| Arc::clone(&self.validate_status)),
            transform_request: options
                .transform_request
                .or_else(|| self.transform_request.clone()),
            transform_response: options
                .transform_response
                .or_else(|| self.transform_response.clone()),
            cancel: options.cancel.or_else(|| self.cancel.clone()),
        }
    }

    /// Parses the target URL and appends the query parameters.
    pub fn full_url(&self) -> Result<Url, BoxError> {
        let mut url = Url::parse(&self.url)?;
        let present: Vec<_> = self
            .params
            .iter()
            .filter(|(_, value)| !value.is_null())
            .collect();

        if !present.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in present {
                match value {
                    Value::String(text) => pairs.append_pair(key, text),
                    other => pairs.append_pair(key, &other.to_string()),
                };
            }
        }
        Ok(url)
    }
}

/// Whether `url` starts with a scheme followed by `://`.
pub fn is_absolute_url(url: &str) -> bool {
    let Some(end) = url.find("://") else {
        return false;
    };
    let mut scheme = url[..end].chars();
    scheme.next().is_some_and(|first| first.is_ascii_alphabetic())
        && scheme.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Joins `url` onto `base_url` with exactly one slash between them.
///
/// Absolute URLs are returned unchanged, as is any URL when there is no base.
///
/// # Examples
/// ```
/// use resilient_adapters::http::request::resolve_url;
///
/// assert_eq!(resolve_url(Some("https://api.x/"), "/v1/users"), "https://api.x/v1/users");
/// assert_eq!(resolve_url(Some("https://api.x"), "v1/users"), "https://api.x/v1/users");
/// assert_eq!(resolve_url(Some("https://api.x"), "https://other.y/z"), "https://other.y/z");
/// ```
pub fn resolve_url(base_url: Option<&str>, url: &str) -> String {
    if is_absolute_url(url) {
        return url.to_string();
    }
    match base_url {
        Some(base) if !base.is_empty() => {
            if url.is_empty() {
                base.to_string()
            } else {
                format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    url.trim_start_matches('/')
                )
            }
        }
        _ => url.to_string(),
    }
}

/// Per-call request settings. Anything left unset falls back to the client defaults.
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub url: Option<String>,
    pub base_url: Option<String>,
    pub headers: HeaderMap,
    pub params: Vec<(String, Value)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Option<Duration>>,
    pub retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub validate_status: Option<StatusValidator>,
    pub transform_request: Option<RequestTransformer>,
    pub transform_response: Option<ResponseTransformer>,
    pub cancel: Option<CancellationToken>,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl RequestOptions {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        RequestOptions {
            method: Some(method),
            url: Some(url.into()),
            ..RequestOptions::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        RequestOptions::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        RequestOptions::new(Method::POST, url)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json(self, value: Value) -> Self {
        self.body(RequestBody::Json(value))
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = Some(retry_delay);
        self
    }

    pub fn validate_status<F>(mut self, validator: F) -> Self
    where
        F: Fn(StatusCode) -> bool + Send + Sync + 'static,
    {
        self.validate_status = Some(Arc::new(validator));
        self
    }

    pub fn transform_request<F>(mut self, transformer: F) -> Self
    where
        F: Fn(RequestBody, &mut HeaderMap) -> RequestBody + Send + Sync + 'static,
    {
        self.transform_request = Some(Arc::new(transformer));
        self
    }

    pub fn transform_response<F>(mut self, transformer: F) -> Self
    where
        F: Fn(ResponseBody) -> ResponseBody + Send + Sync + 'static,
    {
        self.transform_response = Some(Arc::new(transformer));
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
