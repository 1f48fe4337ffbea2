use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Request};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::args::{DEFAULT_CLIENTS, HttpMethod};
use crate::error::{HttpError, ValidationError};
use crate::http::BodyMode;

const fn default_clients() -> usize {
    DEFAULT_CLIENTS
}

/// What one run sends and how hard. Immutable once a run starts.
///
/// Deserializes from the JSON shape a control plane submits; header values
/// must be strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default = "default_clients")]
    pub clients: usize,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, alias = "data")]
    pub post_data: Option<Value>,
    #[serde(default)]
    pub capture_body: bool,
}

impl LoadConfig {
    #[must_use]
    pub fn new(url: impl Into<String>, method: HttpMethod, clients: usize) -> Self {
        Self {
            url: url.into(),
            method,
            clients,
            headers: BTreeMap::new(),
            post_data: None,
            capture_body: false,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_post_data(mut self, post_data: Value) -> Self {
        self.post_data = Some(post_data);
        self
    }

    #[must_use]
    pub const fn with_capture_body(mut self, capture_body: bool) -> Self {
        self.capture_body = capture_body;
        self
    }

    /// Validates the configuration and precomputes everything the workers
    /// reuse: parsed URL, header map, serialized body.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or malformed URL, a non-http(s) scheme,
    /// zero clients, an invalid header name or value, or a payload that
    /// cannot be serialized.
    pub fn prepare(&self) -> Result<RequestPlan, ValidationError> {
        let url = parse_target_url(&self.url)?;
        let clients =
            NonZeroUsize::new(self.clients).ok_or(ValidationError::ValueTooSmall { min: 1 })?;
        let headers = build_header_map(&self.headers)?;
        let body = if self.method.sends_body() {
            Some(encode_payload(self.post_data.as_ref())?)
        } else {
            None
        };
        let mode = if self.capture_body {
            BodyMode::Capture
        } else {
            BodyMode::Discard
        };

        Ok(RequestPlan {
            method: self.method.to_method(),
            url,
            headers,
            body,
            clients,
            mode,
        })
    }
}

/// A validated [`LoadConfig`], ready for the hot path.
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` for GET; the serialized payload (possibly empty) otherwise.
    pub body: Option<Bytes>,
    pub clients: NonZeroUsize,
    pub mode: BodyMode,
}

impl RequestPlan {
    /// Builds the request every worker clones per attempt.
    ///
    /// # Errors
    ///
    /// Returns an error when the client rejects the request parts.
    pub fn template(&self, client: &Client) -> Result<Request, HttpError> {
        let mut request_builder = client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());
        if let Some(body) = self.body.as_ref() {
            request_builder = request_builder.body(body.clone());
        }
        request_builder
            .build()
            .map_err(|err| HttpError::BuildRequestFailed { source: err })
    }
}

fn parse_target_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    let url = Url::parse(trimmed).map_err(|err| ValidationError::InvalidUrl {
        url: raw.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::UnsupportedScheme {
            scheme: other.to_owned(),
        }),
    }
}

fn build_header_map(
    headers: &BTreeMap<String, String>,
) -> Result<HeaderMap, ValidationError> {
    let mut header_map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|err| {
            ValidationError::InvalidHeaderName {
                header: name.clone(),
                source: err,
            }
        })?;
        let header_value = HeaderValue::from_str(value.trim()).map_err(|err| {
            ValidationError::InvalidHeaderValue {
                header: name.clone(),
                source: err,
            }
        })?;
        header_map.append(header_name, header_value);
    }
    Ok(header_map)
}

/// A missing payload is an empty body, never a JSON `null`.
fn encode_payload(payload: Option<&Value>) -> Result<Bytes, ValidationError> {
    payload.map_or_else(
        || Ok(Bytes::new()),
        |value| {
            serde_json::to_vec(value)
                .map(Bytes::from)
                .map_err(|err| ValidationError::PayloadSerialize { source: err })
        },
    )
}
