use crate::http::request::RequestConfig;
use crate::http::response::Response;
use std::fmt;
use std::sync::Arc;

/// Checks the shape of a request before it is sent. `Err` carries the reason.
pub type RequestValidator = Arc<dyn Fn(&RequestConfig) -> Result<(), String> + Send + Sync>;

/// Checks the shape of a parsed response. `Err` carries the reason.
pub type ResponseValidator = Arc<dyn Fn(&Response) -> Result<(), String> + Send + Sync>;

/// Caller-supplied shape checks for [`HttpClient::request_validated`].
///
/// A failing check surfaces as a `Validation` failure.
///
/// [`HttpClient::request_validated`]: crate::http::HttpClient::request_validated
#[derive(Clone, Default)]
pub struct Validators {
    pub request: Option<RequestValidator>,
    pub response: Option<ResponseValidator>,
}

impl fmt::Debug for Validators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validators")
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .finish()
    }
}

impl Validators {
    pub fn new() -> Self {
        Validators::default()
    }

    pub fn request<F>(mut self, validator: F) -> Self
    where
        F: Fn(&RequestConfig) -> Result<(), String> + Send + Sync + 'static,
    {
        self.request = Some(Arc::new(validator));
        self
    }

    pub fn response<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Response) -> Result<(), String> + Send + Sync + 'static,
    {
        self.response = Some(Arc::new(validator));
        self
    }

    pub(crate) fn check_request(&self, config: &RequestConfig) -> Result<(), String> {
        match &self.request {
            Some(validator) => validator(config),
            None => Ok(()),
        }
    }

    pub(crate) fn check_response(&self, response: &Response) -> Result<(), String> {
        match &self.response {
            Some(validator) => validator(response),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ResponseBody;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn test_empty_validators_accept_everything() {
        let validators = Validators::new();
        let config = RequestConfig::default();
        let response = Response::new(StatusCode::OK, ResponseBody::Json(json!(1)), config.clone());

        assert!(validators.check_request(&config).is_ok());
        assert!(validators.check_response(&response).is_ok());
    }

    #[test]
    fn test_validators_report_reason() {
        let validators = Validators::new()
            .request(|config| {
                if config.url.is_empty() {
                    Err("url is required".to_string())
                } else {
                    Ok(())
                }
            })
            .response(|response| match response.data.as_json() {
                Some(value) if value.get("id").is_some() => Ok(()),
                _ => Err("missing id".to_string()),
            });

        let config = RequestConfig::default();
        assert_eq!(
            validators.check_request(&config),
            Err("url is required".to_string())
        );

        let response = Response::new(StatusCode::OK, ResponseBody::Json(json!({})), config);
        assert_eq!(
            validators.check_response(&response),
            Err("missing id".to_string())
        );
    }
}
