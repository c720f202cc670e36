//! Transport layer
//!
//! Executes a single [`RequestDescriptor`]. The default implementation is
//! backed by `reqwest`; tests and embedders can supply their own.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::error::{AiProxyError, Result};
use crate::logging::{LogLevel, log_if};
use crate::request::RequestDescriptor;

/// Fully buffered response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Lazily produced byte stream.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Response whose body is read incrementally.
pub struct StreamingResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Executes one request/response exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and buffer the whole body.
    async fn send(&self, request: RequestDescriptor) -> Result<TransportResponse>;

    /// Send the request and hand back the body as a stream.
    async fn send_streaming(&self, request: RequestDescriptor) -> Result<StreamingResponse>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with an ephemeral client: no cookie store, no
    /// client-wide timeout (each descriptor carries its own).
    pub fn new(resolve_dns_over_tls: bool) -> Result<Self> {
        if resolve_dns_over_tls && let Some(logger) = log_if(LogLevel::Warning) {
            logger.warning(
                "DNS-over-TLS was requested; name resolution is left to the system resolver",
            );
        }
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            AiProxyError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
        })?;
        Ok(Self { http_client })
    }

    /// Wrap an existing client.
    pub fn with_http_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn prepare(&self, request: RequestDescriptor) -> (reqwest::RequestBuilder, Duration) {
        let timeout = request.timeout;
        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        (builder, timeout)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<TransportResponse> {
        let (builder, timeout) = self.prepare(request);
        let response = builder
            .send()
            .await
            .map_err(|e| AiProxyError::from_reqwest(e, timeout))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| AiProxyError::from_reqwest(e, timeout))?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    async fn send_streaming(&self, request: RequestDescriptor) -> Result<StreamingResponse> {
        let (builder, timeout) = self.prepare(request);
        let response = builder
            .send()
            .await
            .map_err(|e| AiProxyError::from_reqwest(e, timeout))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| AiProxyError::from_reqwest(e, timeout)))
            .boxed();
        Ok(StreamingResponse {
            status,
            headers,
            body,
        })
    }
}
