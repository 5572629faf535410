/// The client, its builder, and the retry loop.
pub mod client;
/// Request, response and error interceptor chains.
pub mod interceptor;
/// Request configuration, call-site options, and URL resolution.
pub mod request;
/// Parsed responses.
pub mod response;
/// The network boundary.
pub mod transport;
/// Request and response shape checks.
pub mod validation;

pub use client::{HttpClient, HttpClientBuilder};
pub use interceptor::{
    ErrorInterceptor, InterceptorChain, Interceptors, RequestInterceptor, ResponseInterceptor,
    error_fn, request_fn, response_fn,
};
pub use request::{RequestBody, RequestConfig, RequestOptions};
pub use response::{Response, ResponseBody};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use validation::Validators;
