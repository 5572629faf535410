use crate::http::request::RequestConfig;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A response body, parsed according to the declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// `application/json` and `+json` media types. An empty body parses to `null`.
    Json(Value),
    /// `text/*` media types.
    Text(String),
    /// Everything else, including responses without a content type.
    Binary(Bytes),
}

impl ResponseBody {
    /// Parses `body` according to the `content-type` in `headers`.
    pub fn parse(headers: &HeaderMap, body: Bytes) -> Result<ResponseBody, serde_json::Error> {
        let media_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if media_type == "application/json" || media_type.ends_with("+json") {
            if body.is_empty() {
                return Ok(ResponseBody::Json(Value::Null));
            }
            serde_json::from_slice(&body).map(ResponseBody::Json)
        } else if media_type.starts_with("text/") {
            Ok(ResponseBody::Text(String::from_utf8_lossy(&body).into_owned()))
        } else {
            Ok(ResponseBody::Binary(body))
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A response that passed the transport stage.
#[derive(Debug, Clone)]
pub struct Response {
    pub data: ResponseBody,
    pub status: StatusCode,
    /// The canonical reason phrase for `status`, empty when there is none.
    pub status_text: String,
    pub headers: HeaderMap,
    /// The request configuration that produced this response.
    pub config: RequestConfig,
}

impl Response {
    pub fn new(status: StatusCode, data: ResponseBody, config: RequestConfig) -> Self {
        Response {
            data,
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
            config,
        }
    }

    /// Decodes the body into `T`.
    ///
    /// JSON bodies are converted directly; text and binary bodies are parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            ResponseBody::Json(value) => T::deserialize(value),
            ResponseBody::Text(text) => serde_json::from_str(text),
            ResponseBody::Binary(bytes) => serde_json::from_slice(bytes),
        }
    }
}
