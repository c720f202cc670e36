//! Outgoing request construction
//!
//! A [`RequestDescriptor`] describes one HTTP exchange. It is built per call,
//! handed to the transport, and dropped once the exchange completes.
//!
//! Services do not know whether they talk to a provider or to the proxy: they
//! hold a [`RequestBuilder`], which is either a [`DirectRequestBuilder`]
//! (provider origin plus the caller's API key) or a [`ProxiedRequestBuilder`]
//! (proxy origin plus partial key and metadata header).

pub mod direct;
pub mod headers;
pub mod proxied;

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Method, Url};

use crate::defaults;
use crate::error::{AiProxyError, Result};

pub use direct::{DirectAuth, DirectRequestBuilder};
pub use headers::HeaderBuilder;
pub use proxied::{ProxiedRequestBuilder, ProxyConfig, metadata_header};

/// One fully-formed outgoing request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: Method,
    pub body: Option<Bytes>,
    pub timeout: Duration,
    pub headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

/// Join an origin and a path. The caller is responsible for slashes.
///
/// A relative path after an origin without a trailing `/` would merge into
/// the host or the last segment, so it is rejected.
pub(crate) fn join_url(origin: &str, path: &str) -> Result<Url> {
    let raw = format!("{origin}{path}");
    if !path.is_empty() && !path.starts_with('/') && !origin.ends_with('/') {
        return Err(AiProxyError::MalformedUrl(format!(
            "{raw}: path '{path}' is not separated from '{origin}'"
        )));
    }
    Url::parse(&raw).map_err(|e| AiProxyError::MalformedUrl(format!("{raw}: {e}")))
}

/// Serialize a request body to JSON bytes.
pub(crate) fn serialize_body<T: serde::Serialize>(body: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(|e| {
        AiProxyError::SerializationError(format!("Failed to serialize request body: {e}"))
    })
}

/// Per-call options accepted by every service method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Maximum time to wait for the exchange.
    pub timeout: Duration,
    /// Extra headers, applied last so they win on collision.
    pub additional_headers: HashMap<String, String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: defaults::http::REQUEST_TIMEOUT,
            additional_headers: HashMap::new(),
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_seconds_to_wait(self, seconds: u64) -> Self {
        self.with_timeout(Duration::from_secs(seconds))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.insert(name.into(), value.into());
        self
    }
}

/// Builds descriptors for a fixed origin and authentication scheme.
pub trait RequestBuilder: Send + Sync {
    /// Build a request with an arbitrary verb and content type.
    fn build(
        &self,
        path: &str,
        body: Option<Vec<u8>>,
        method: Method,
        content_type: Option<&str>,
        options: &RequestOptions,
    ) -> Result<RequestDescriptor>;

    /// Build a JSON `POST`.
    fn json_post(
        &self,
        path: &str,
        body: Vec<u8>,
        options: &RequestOptions,
    ) -> Result<RequestDescriptor> {
        self.build(
            path,
            Some(body),
            Method::POST,
            Some(defaults::http::JSON_CONTENT_TYPE),
            options,
        )
    }
}
