//! Request execution shared by every service.
//!
//! Sends a descriptor through the configured [`Transport`], enforces the
//! descriptor's deadline, classifies non-2xx responses and decodes bodies.
//! Failures are returned to the caller as-is; nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use serde::de::DeserializeOwned;

use crate::config::Configuration;
use crate::error::{AiProxyError, Result};
use crate::logging::{LogLevel, log_if, ungated_logger};
use crate::request::RequestDescriptor;
use crate::request::headers::format_headers_for_logging;
use crate::transport::{ByteStream, Transport};

/// Executes requests for a service and decodes their responses.
#[derive(Clone)]
pub struct ServiceNetworker {
    transport: Arc<dyn Transport>,
    config: Arc<Configuration>,
}

impl std::fmt::Debug for ServiceNetworker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceNetworker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ServiceNetworker {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<Configuration>) -> Self {
        Self { transport, config }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Send the request, then decode the body into `T`.
    pub async fn make_request_and_deserialize_response<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<T> {
        let body = self.make_request_and_wait_for_data(request).await?;
        serde_json::from_slice(&body).map_err(|e| {
            if let Some(logger) = log_if(LogLevel::Error) {
                logger.error(format!("Could not decode response body: {e}"));
            }
            AiProxyError::decode_failure(e.to_string(), &body)
        })
    }

    /// Send the request and return the buffered body of a 2xx response.
    pub async fn make_request_and_wait_for_data(&self, request: RequestDescriptor) -> Result<Bytes> {
        self.log_request(&request);
        let timeout = request.timeout;
        let response = with_deadline(timeout, self.transport.send(request)).await?;

        if !response.status.is_success() {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            return Err(self.status_error(response.status.as_u16(), body));
        }

        if self.config.print_response_bodies {
            ungated_logger().emit(
                LogLevel::Info,
                format!("Received response body: {}", String::from_utf8_lossy(&response.body)),
            );
        }
        Ok(response.body)
    }

    /// Send the request and return the body of a 2xx response as a stream.
    ///
    /// The deadline covers the wait for the response head; the transport
    /// bounds the remainder of the body.
    pub async fn make_request_and_wait_for_stream(
        &self,
        request: RequestDescriptor,
    ) -> Result<ByteStream> {
        self.log_request(&request);
        let timeout = request.timeout;
        let response = with_deadline(timeout, self.transport.send_streaming(request)).await?;

        if !response.status.is_success() {
            let status = response.status.as_u16();
            let chunks: Vec<Result<Bytes>> = with_deadline(timeout, async {
                Ok(response.body.collect::<Vec<_>>().await)
            })
            .await?;
            let mut body = Vec::new();
            for chunk in chunks {
                body.extend_from_slice(&chunk?);
            }
            return Err(self.status_error(status, String::from_utf8_lossy(&body).into_owned()));
        }
        Ok(response.body)
    }

    fn status_error(&self, status: u16, body: String) -> AiProxyError {
        if let Some(logger) = log_if(LogLevel::Warning) {
            logger.warning(format!("Received non-200 status code {status} with body: {body}"));
        }
        AiProxyError::from_status(status, body)
    }

    fn log_request(&self, request: &RequestDescriptor) {
        if let Some(logger) = log_if(LogLevel::Debug) {
            logger.debug(format!(
                "{} {} [{}]",
                request.method,
                request.url,
                format_headers_for_logging(&request.headers)
            ));
        }
        if self.config.print_request_bodies && let Some(body) = &request.body {
            ungated_logger().emit(
                LogLevel::Info,
                format!("Sending request body: {}", String::from_utf8_lossy(body)),
            );
        }
    }
}

async fn with_deadline<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            if let Some(logger) = log_if(LogLevel::Warning) {
                logger.warning(format!("Request timed out after {}s", timeout.as_secs_f64()));
            }
            Err(AiProxyError::Timeout(timeout))
        }
    }
}
