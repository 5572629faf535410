use crate::error::HttpError;
use crate::http::interceptor::{
    ErrorInterceptor, Interceptors, RequestInterceptor, ResponseInterceptor,
};
use crate::http::request::{RequestBody, RequestConfig, RequestOptions};
use crate::http::response::{Response, ResponseBody};
use crate::http::transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
use crate::http::validation::Validators;
use crate::strategies::RetryStrategy;
use log::{debug, info, warn};
use reqwest::header::{HeaderValue, IntoHeaderName};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// An HTTP client with per-client defaults, interceptor chains, and retries.
///
/// Every request runs the same pipeline: the call-site options are merged over the
/// client defaults, request interceptors rewrite the result, the transport sends it
/// (raced against the timeout and the caller's cancellation token), the body is
/// parsed and its status validated, and response interceptors get the final say.
/// A failure at any stage is offered to the error interceptors; if none of them
/// recovers, the request is resubmitted until its retry budget is spent.
///
/// # Example
/// ```no_run
/// use resilient_adapters::http::{HttpClient, RequestOptions};
///
/// # async fn run() -> Result<(), resilient_adapters::HttpError> {
/// let client = HttpClient::builder()
///     .base_url("https://api.example.com/")
///     .retries(2)
///     .build();
///
/// let response = client
///     .request(RequestOptions::get("/v1/users").param("page", 2))
///     .await?;
/// println!("{} {:?}", response.status, response.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    defaults: RequestConfig,
    transport: Arc<dyn Transport>,
    interceptors: Interceptors,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("defaults", &self.defaults)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        HttpClient::new()
    }
}

impl HttpClient {
    /// A client with default settings, sending through `reqwest`.
    pub fn new() -> Self {
        HttpClient::builder().build()
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// The defaults every request is merged over.
    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    pub fn interceptors_mut(&mut self) -> &mut Interceptors {
        &mut self.interceptors
    }

    pub fn on_request(&mut self, interceptor: impl RequestInterceptor + 'static) -> &mut Self {
        self.interceptors.request.push(Arc::new(interceptor));
        self
    }

    pub fn on_response(&mut self, interceptor: impl ResponseInterceptor + 'static) -> &mut Self {
        self.interceptors.response.push(Arc::new(interceptor));
        self
    }

    pub fn on_error(&mut self, interceptor: impl ErrorInterceptor + 'static) -> &mut Self {
        self.interceptors.error.push(Arc::new(interceptor));
        self
    }

    /// Runs `options` through the full pipeline.
    pub async fn request(&self, options: RequestOptions) -> Result<Response, HttpError> {
        let config = self.defaults.merge(options);
        self.dispatch(config).await
    }

    pub async fn get(&self, url: impl Into<String>) -> Result<Response, HttpError> {
        self.request(RequestOptions::get(url)).await
    }

    pub async fn delete(&self, url: impl Into<String>) -> Result<Response, HttpError> {
        self.request(RequestOptions::new(Method::DELETE, url)).await
    }

    pub async fn head(&self, url: impl Into<String>) -> Result<Response, HttpError> {
        self.request(RequestOptions::new(Method::HEAD, url)).await
    }

    pub async fn post(
        &self,
        url: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<Response, HttpError> {
        self.request(RequestOptions::post(url).body(body)).await
    }

    pub async fn put(
        &self,
        url: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<Response, HttpError> {
        self.request(RequestOptions::new(Method::PUT, url).body(body))
            .await
    }

    pub async fn patch(
        &self,
        url: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<Response, HttpError> {
        self.request(RequestOptions::new(Method::PATCH, url).body(body))
            .await
    }

    /// Like [`request`](Self::request), with shape checks on both ends.
    ///
    /// The request validator sees the merged configuration before anything is sent;
    /// the response validator sees the final response. Either one failing yields a
    /// `Validation` failure. Validation failures are not retried.
    pub async fn request_validated(
        &self,
        options: RequestOptions,
        validators: &Validators,
    ) -> Result<Response, HttpError> {
        let config = self.defaults.merge(options);
        if let Err(reason) = validators.check_request(&config) {
            warn!("Request validation failed for {}: {}", config.url, reason);
            return Err(HttpError::validation(
                config,
                format!("request validation failed: {reason}"),
            ));
        }

        let response = self.dispatch(config).await?;
        match validators.check_response(&response) {
            Ok(()) => Ok(response),
            Err(reason) => {
                warn!("Response validation failed for {}: {}", response.config.url, reason);
                let config = response.config.clone();
                Err(
                    HttpError::validation(config, format!("response validation failed: {reason}"))
                        .with_response(response),
                )
            }
        }
    }

    /// Sends `options` and decodes the body into `T`.
    ///
    /// A body that does not decode is a `Validation` failure carrying the response.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
    ) -> Result<T, HttpError> {
        let response = self.request(options).await?;
        match response.json::<T>() {
            Ok(value) => Ok(value),
            Err(source) => {
                let config = response.config.clone();
                Err(HttpError::validation(
                    config,
                    format!("response body did not match the expected shape: {source}"),
                )
                .with_response(response)
                .with_source(Box::new(source)))
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: impl Into<String>,
    ) -> Result<T, HttpError> {
        self.request_json(RequestOptions::get(url)).await
    }

    /// The retry loop. Each round reruns the whole pipeline from the merged config.
    async fn dispatch(&self, config: RequestConfig) -> Result<Response, HttpError> {
        let mut attempts_used: u32 = 0;

        loop {
            let error = match self.run_once(config.clone()).await {
                Ok(response) => {
                    if attempts_used > 0 {
                        info!(
                            "{} {} succeeded after {} attempts",
                            config.method,
                            config.url,
                            attempts_used + 1
                        );
                    }
                    return Ok(response);
                }
                Err(error) => error,
            };

            let error = match self.interceptors.error.recover(error).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if attempts_used >= config.retries || !error.is_retryable() {
                warn!(
                    "{} {} failed after {} attempts: {}",
                    config.method,
                    config.url,
                    attempts_used + 1,
                    error
                );
                return Err(error);
            }

            let delay = RetryStrategy::ExponentialBackoff
                .calculate_delay(config.retry_delay, attempts_used as usize);
            warn!(
                "{} {} failed (attempt {}/{}): {}. Retrying in {:?}",
                config.method,
                config.url,
                attempts_used + 1,
                config.retries.saturating_add(1),
                error,
                delay
            );
            attempts_used += 1;

            match config.cancel.clone() {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(HttpError::cancelled(config)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }

    async fn run_once(&self, config: RequestConfig) -> Result<Response, HttpError> {
        let config = self.interceptors.request.apply(config).await?;
        let response = self.send(config).await?;
        self.interceptors.response.apply(response).await
    }

    /// The transport stage: serialize, send, parse, validate status.
    async fn send(&self, config: RequestConfig) -> Result<Response, HttpError> {
        let mut headers = config.headers.clone();
        let body = match &config.transform_request {
            Some(transform) => transform(config.body.clone(), &mut headers),
            None => config.body.clone(),
        };
        let body = body.encode(&mut headers);

        let url = match config.full_url() {
            Ok(url) => url,
            Err(source) => return Err(HttpError::network(config, source)),
        };

        debug!("Sending {} {}", config.method, url);
        let request = TransportRequest {
            method: config.method.clone(),
            url,
            headers,
            body,
        };

        let limit = config.timeout;
        let token = config.cancel.clone();
        let raw = tokio::select! {
            biased;
            _ = cancelled(token) => return Err(HttpError::cancelled(config)),
            result = self.transport.send(request) => match result {
                Ok(raw) => raw,
                Err(source) => return Err(HttpError::network(config, source)),
            },
            after = expire(limit) => return Err(HttpError::timeout(config, after)),
        };

        let TransportResponse {
            status,
            headers,
            body,
        } = raw;
        debug!("Received {} from {} {}", status, config.method, config.url);

        let data = match ResponseBody::parse(&headers, body) {
            Ok(data) => data,
            Err(source) => return Err(HttpError::network(config, Box::new(source))),
        };
        let data = match &config.transform_response {
            Some(transform) => transform(data),
            None => data,
        };

        let accept = Arc::clone(&config.validate_status);
        let mut response = Response::new(status, data, config);
        response.headers = headers;

        if accept(status) {
            Ok(response)
        } else {
            Err(HttpError::status(response))
        }
    }
}

async fn cancelled(token: Option<CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn expire(limit: Option<Duration>) -> Duration {
    match limit {
        Some(limit) => {
            tokio::time::sleep(limit).await;
            limit
        }
        None => std::future::pending().await,
    }
}

/// Builds an [`HttpClient`] with custom defaults or a custom transport.
#[derive(Default)]
pub struct HttpClientBuilder {
    defaults: RequestConfig,
    transport: Option<Arc<dyn Transport>>,
    interceptors: Interceptors,
}

impl HttpClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.defaults.base_url = Some(base_url.into());
        self
    }

    /// A header sent with every request unless the call site overrides it.
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.defaults.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.defaults.timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.defaults.retries = retries;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.defaults.retry_delay = retry_delay;
        self
    }

    pub fn validate_status<F>(mut self, validator: F) -> Self
    where
        F: Fn(StatusCode) -> bool + Send + Sync + 'static,
    {
        self.defaults.validate_status = Arc::new(validator);
        self
    }

    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.transport_shared(Arc::new(transport))
    }

    pub fn transport_shared(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn build(self) -> HttpClient {
        HttpClient {
            defaults: self.defaults,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
            interceptors: self.interceptors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpErrorKind;
    use crate::http::interceptor::{error_fn, request_fn, response_fn};
    use crate::http::transport::mock::{MockTransport, Reply, json};
    use bytes::Bytes;
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
    use serde::Deserialize;
    use serde_json::json as value;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn client_with(mock: &Arc<MockTransport>) -> HttpClient {
        HttpClient::builder()
            .base_url("https://api.x/")
            .retry_delay(Duration::from_millis(1000))
            .transport_shared(mock.clone())
            .build()
    }

    mod pipeline_tests {
        use super::*;

        #[tokio::test]
        async fn test_relative_url_joined_with_base() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, r#"{"ok": true}"#)));
            let client = client_with(&mock);

            let response = client.get("/v1/users").await.unwrap();

            assert_eq!(mock.last_request().url.as_str(), "https://api.x/v1/users");
            assert_eq!(response.status, StatusCode::OK);
            assert_eq!(response.status_text, "OK");
            assert_eq!(response.data.as_json().unwrap()["ok"], true);
        }

        #[tokio::test]
        async fn test_call_site_header_overrides_default() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, "{}")));
            let client = HttpClient::builder()
                .header(AUTHORIZATION, HeaderValue::from_static("Bearer default"))
                .transport_shared(mock.clone())
                .build();

            client
                .request(
                    RequestOptions::get("https://api.x/me")
                        .header(AUTHORIZATION, HeaderValue::from_static("Bearer mine")),
                )
                .await
                .unwrap();

            let sent = mock.last_request();
            let values: Vec<&HeaderValue> = sent.headers.get_all(AUTHORIZATION).iter().collect();
            assert_eq!(values, vec![&HeaderValue::from_static("Bearer mine")]);
        }

        #[tokio::test]
        async fn test_params_and_json_body_reach_transport() {
            let mock = Arc::new(MockTransport::new(|_, _| json(201, "{}")));
            let client = client_with(&mock);

            client
                .request(
                    RequestOptions::post("users")
                        .param("dry_run", true)
                        .json(value!({"name": "ada"})),
                )
                .await
                .unwrap();

            let sent = mock.last_request();
            assert_eq!(sent.method, Method::POST);
            assert_eq!(sent.url.as_str(), "https://api.x/users?dry_run=true");
            assert_eq!(sent.headers[CONTENT_TYPE], "application/json");
            assert_eq!(sent.body.unwrap(), Bytes::from_static(br#"{"name":"ada"}"#));
        }

        #[tokio::test]
        async fn test_request_transformer_runs_before_encoding() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, "{}")));
            let client = client_with(&mock);

            client
                .request(
                    RequestOptions::post("echo")
                        .body("plain")
                        .transform_request(|body, headers| {
                            headers.insert("x-transformed", HeaderValue::from_static("1"));
                            match body {
                                RequestBody::Text(text) => RequestBody::Text(text.to_uppercase()),
                                other => other,
                            }
                        }),
                )
                .await
                .unwrap();

            let sent = mock.last_request();
            assert_eq!(sent.body.unwrap(), Bytes::from_static(b"PLAIN"));
            assert!(sent.headers.contains_key("x-transformed"));
        }

        #[tokio::test]
        async fn test_not_found_is_status_failure_with_body() {
            let mock = Arc::new(MockTransport::new(|_, _| {
                json(404, r#"{"error": "no such user"}"#)
            }));
            let client = client_with(&mock);

            let err = client
                .request(RequestOptions::get("/v1/users/9").retries(0))
                .await
                .unwrap_err();

            assert_eq!(err.kind, HttpErrorKind::Status);
            assert_eq!(err.message, "request failed with status code 404");
            assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
            let response = err.response.unwrap();
            assert_eq!(response.data.as_json().unwrap()["error"], "no such user");
            assert_eq!(mock.calls(), 1);
        }

        #[tokio::test]
        async fn test_custom_status_validator_accepts_not_found() {
            let mock = Arc::new(MockTransport::new(|_, _| json(404, "null")));
            let client = client_with(&mock);

            let response = client
                .request(
                    RequestOptions::get("/missing")
                        .validate_status(|status| status.is_success() || status == 404),
                )
                .await
                .unwrap();
            assert_eq!(response.status, StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn test_unparseable_json_is_network_failure() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, "{not json")));
            let client = client_with(&mock);

            let err = client
                .request(RequestOptions::get("/broken").retries(0))
                .await
                .unwrap_err();
            assert_eq!(err.kind, HttpErrorKind::Network);
        }
    }

    mod retry_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_delays_double_between_attempts() {
            let stamps = Arc::new(Mutex::new(Vec::new()));
            let recorded = stamps.clone();
            let start = Instant::now();
            let mock = Arc::new(MockTransport::new(move |_, _| {
                recorded.lock().unwrap().push(start.elapsed().as_millis());
                Reply::Fail("connection reset")
            }));
            let client = client_with(&mock);

            let err = client
                .request(RequestOptions::get("/flaky").retries(2))
                .await
                .unwrap_err();

            assert_eq!(err.kind, HttpErrorKind::Network);
            assert_eq!(mock.calls(), 3);
            assert_eq!(*stamps.lock().unwrap(), vec![0, 1000, 3000]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_recovers_within_budget() {
            let mock = Arc::new(MockTransport::new(|call, _| {
                if call < 2 {
                    json(503, "{}")
                } else {
                    json(200, r#"{"attempt": 3}"#)
                }
            }));
            let client = client_with(&mock);

            let response = client.get("/eventually").await.unwrap();
            assert_eq!(response.data.as_json().unwrap()["attempt"], 3);
            assert_eq!(mock.calls(), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_is_classified() {
            let mock = Arc::new(MockTransport::new(|_, _| Reply::Hang));
            let client = client_with(&mock);
            let start = Instant::now();

            let err = client
                .request(
                    RequestOptions::get("/slow")
                        .timeout(Some(Duration::from_millis(250)))
                        .retries(0),
                )
                .await
                .unwrap_err();

            assert_eq!(err.kind, HttpErrorKind::Timeout);
            assert_eq!(start.elapsed(), Duration::from_millis(250));
        }

        #[tokio::test(start_paused = true)]
        async fn test_cancellation_is_not_retried() {
            let mock = Arc::new(MockTransport::new(|_, _| Reply::Hang));
            let client = client_with(&mock);
            let token = CancellationToken::new();

            let trigger = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                trigger.cancel();
            });

            let err = client
                .request(
                    RequestOptions::get("/stream")
                        .retries(5)
                        .cancel_token(token),
                )
                .await
                .unwrap_err();

            assert_eq!(err.kind, HttpErrorKind::Cancelled);
            assert_eq!(mock.calls(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_failing_response_interceptor_is_offered_and_retried() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, "{}")));
            let offered = Arc::new(AtomicUsize::new(0));
            let seen = offered.clone();

            let mut client = client_with(&mock);
            client
                .on_response(response_fn(|response: Response| async move {
                    Err(HttpError::validation(response.config, "envelope missing"))
                }))
                .on_error(error_fn(move |error: HttpError| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    async move { Err(error) }
                }));

            let err = client
                .request(RequestOptions::get("/wrapped").retries(2))
                .await
                .unwrap_err();

            assert_eq!(err.kind, HttpErrorKind::Validation);
            assert_eq!(mock.calls(), 3);
            assert_eq!(offered.load(Ordering::SeqCst), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_request_interceptors_rerun_on_every_attempt() {
            let mock = Arc::new(MockTransport::new(|call, _| {
                if call < 2 {
                    Reply::Fail("connection refused")
                } else {
                    json(200, "{}")
                }
            }));
            let stamped = Arc::new(AtomicUsize::new(0));
            let counter = stamped.clone();

            let mut client = client_with(&mock);
            client.on_request(request_fn(move |mut config: RequestConfig| {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    config.headers.insert("x-attempt", HeaderValue::from(attempt));
                    Ok(config)
                }
            }));

            client
                .request(RequestOptions::get("/stamped").retries(2))
                .await
                .unwrap();

            assert_eq!(stamped.load(Ordering::SeqCst), 3);
            assert_eq!(mock.calls(), 3);
            assert_eq!(mock.last_request().headers["x-attempt"], "3");
        }

        #[tokio::test(start_paused = true)]
        async fn test_failing_request_interceptor_skips_transport() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, "{}")));
            let mut client = client_with(&mock);
            client.on_request(request_fn(|config: RequestConfig| async move {
                Err(HttpError::validation(config, "no credentials"))
            }));

            let err = client
                .request(RequestOptions::get("/locked").retries(1))
                .await
                .unwrap_err();

            assert_eq!(err.kind, HttpErrorKind::Validation);
            assert_eq!(mock.calls(), 0);
        }
    }

    mod interceptor_tests {
        use super::*;

        #[tokio::test]
        async fn test_request_interceptors_run_in_registration_order() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, "{}")));
            let mut client = client_with(&mock);
            client
                .on_request(request_fn(|mut config: RequestConfig| async move {
                    config.url.push_str("/a");
                    Ok(config)
                }))
                .on_request(request_fn(|mut config: RequestConfig| async move {
                    config.url.push_str("/b");
                    Ok(config)
                }));

            client.get("/root").await.unwrap();
            assert_eq!(mock.last_request().url.as_str(), "https://api.x/root/a/b");
        }

        #[tokio::test]
        async fn test_response_interceptor_rewrites_data() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, r#"{"n": 1}"#)));
            let mut client = client_with(&mock);
            client.on_response(response_fn(|mut response: Response| async move {
                response.data = ResponseBody::Text("rewritten".to_string());
                Ok(response)
            }));

            let response = client.get("/n").await.unwrap();
            assert_eq!(response.data.as_text(), Some("rewritten"));
        }

        #[tokio::test]
        async fn test_error_interceptor_recovers_without_retry() {
            let mock = Arc::new(MockTransport::new(|_, _| Reply::Fail("dns failure")));
            let mut client = client_with(&mock);
            client.on_error(error_fn(|error: HttpError| async move {
                Ok(Response::new(
                    StatusCode::OK,
                    ResponseBody::Json(value!({"cached": true})),
                    *error.config,
                ))
            }));

            let response = client.get("/cached").await.unwrap();
            assert_eq!(response.data.as_json().unwrap()["cached"], true);
            assert_eq!(mock.calls(), 1);
        }

        #[tokio::test]
        async fn test_error_interceptor_replaces_failure() {
            let mock = Arc::new(MockTransport::new(|_, _| json(500, "{}")));
            let mut client = client_with(&mock);
            client.on_error(error_fn(|error: HttpError| async move {
                Err(HttpError::validation(*error.config, "upstream unavailable"))
            }));

            let err = client
                .request(RequestOptions::get("/down").retries(0))
                .await
                .unwrap_err();
            assert_eq!(err.kind, HttpErrorKind::Validation);
            assert_eq!(err.message, "upstream unavailable");
        }
    }

    mod convenience_tests {
        use super::*;

        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u32,
            name: String,
        }

        #[tokio::test]
        async fn test_request_validator_blocks_send() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, "{}")));
            let client = client_with(&mock);
            let validators = Validators::new().request(|config| {
                if config.headers.contains_key(AUTHORIZATION) {
                    Ok(())
                } else {
                    Err("authorization header required".to_string())
                }
            });

            let err = client
                .request_validated(RequestOptions::get("/private"), &validators)
                .await
                .unwrap_err();

            assert_eq!(err.kind, HttpErrorKind::Validation);
            assert_eq!(mock.calls(), 0);
        }

        #[tokio::test]
        async fn test_response_validator_attaches_response() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, r#"{"items": []}"#)));
            let client = client_with(&mock);
            let validators = Validators::new().response(|response| {
                match response.data.as_json().and_then(|body| body.get("total")) {
                    Some(_) => Ok(()),
                    None => Err("missing total".to_string()),
                }
            });

            let err = client
                .request_validated(RequestOptions::get("/items"), &validators)
                .await
                .unwrap_err();

            assert_eq!(err.kind, HttpErrorKind::Validation);
            assert!(err.message.contains("missing total"));
            assert!(err.response.is_some());
        }

        #[tokio::test]
        async fn test_get_json_decodes_typed_body() {
            let mock = Arc::new(MockTransport::new(|_, _| {
                json(200, r#"{"id": 7, "name": "ada"}"#)
            }));
            let client = client_with(&mock);

            let user: User = client.get_json("/users/7").await.unwrap();
            assert_eq!(
                user,
                User {
                    id: 7,
                    name: "ada".to_string()
                }
            );
        }

        #[tokio::test]
        async fn test_shape_mismatch_is_validation_failure() {
            let mock = Arc::new(MockTransport::new(|_, _| json(200, r#"{"id": "seven"}"#)));
            let client = client_with(&mock);

            let err = client.get_json::<User>("/users/7").await.unwrap_err();
            assert_eq!(err.kind, HttpErrorKind::Validation);
            assert!(err.response.is_some());
        }
    }
}
