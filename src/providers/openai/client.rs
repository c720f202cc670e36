//! `OpenAI` service facade

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{
    OpenAiChatCompletionChunk, OpenAiChatCompletionRequestBody, OpenAiChatCompletionResponseBody,
    OpenAiStreamOptions,
};
use crate::error::Result;
use crate::networker::ServiceNetworker;
use crate::request::{RequestBuilder, RequestOptions, serialize_body};
use crate::streaming::{ChunkStream, decode_json_events};

/// How endpoint paths are laid out on the target host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenAiRequestFormat {
    /// `api.openai.com` style: `/v1/<path>`
    #[default]
    Standard,
    /// Azure deployments: the path is used verbatim, typically a full
    /// deployment route carried in the base URL plus `path`.
    AzureDeployment,
    /// OpenAI-compatible hosts that omit the version segment: `/<path>`
    NoVersionPrefix,
}

impl OpenAiRequestFormat {
    pub fn resolve_path(self, path: &str) -> String {
        match self {
            Self::Standard => format!("/v1/{path}"),
            Self::AzureDeployment => path.to_string(),
            Self::NoVersionPrefix => format!("/{path}"),
        }
    }
}

/// Chat completion capability of an OpenAI-compatible host.
#[async_trait]
pub trait OpenAiService: Send + Sync {
    /// Non-streaming chat completion. Any streaming fields set on `body` are
    /// cleared before it is sent.
    async fn chat_completion_request(
        &self,
        body: OpenAiChatCompletionRequestBody,
        options: RequestOptions,
    ) -> Result<OpenAiChatCompletionResponseBody>;

    /// Streaming chat completion, one item per `chat.completion.chunk`.
    async fn stream_chat_completion_request(
        &self,
        body: OpenAiChatCompletionRequestBody,
        options: RequestOptions,
    ) -> Result<ChunkStream<OpenAiChatCompletionChunk>>;

    /// [`Self::chat_completion_request`] with the default 60 second timeout.
    async fn chat_completion(
        &self,
        body: OpenAiChatCompletionRequestBody,
    ) -> Result<OpenAiChatCompletionResponseBody> {
        self.chat_completion_request(body, RequestOptions::default())
            .await
    }
}

/// OpenAI facade. Direct or proxied depending on the request builder it
/// was constructed with.
#[derive(Clone)]
pub struct OpenAiClient {
    request_format: OpenAiRequestFormat,
    request_builder: Arc<dyn RequestBuilder>,
    networker: ServiceNetworker,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("request_format", &self.request_format)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(
        request_format: OpenAiRequestFormat,
        request_builder: Arc<dyn RequestBuilder>,
        networker: ServiceNetworker,
    ) -> Self {
        Self {
            request_format,
            request_builder,
            networker,
        }
    }

    pub fn request_format(&self) -> OpenAiRequestFormat {
        self.request_format
    }
}

#[async_trait]
impl OpenAiService for OpenAiClient {
    async fn chat_completion_request(
        &self,
        mut body: OpenAiChatCompletionRequestBody,
        options: RequestOptions,
    ) -> Result<OpenAiChatCompletionResponseBody> {
        body.stream = Some(false);
        body.stream_options = None;
        let request = self.request_builder.json_post(
            &self.request_format.resolve_path("chat/completions"),
            serialize_body(&body)?,
            &options,
        )?;
        self.networker
            .make_request_and_deserialize_response(request)
            .await
    }

    async fn stream_chat_completion_request(
        &self,
        mut body: OpenAiChatCompletionRequestBody,
        options: RequestOptions,
    ) -> Result<ChunkStream<OpenAiChatCompletionChunk>> {
        body.stream = Some(true);
        if body.stream_options.is_none() {
            body.stream_options = Some(OpenAiStreamOptions {
                include_usage: true,
            });
        }
        let request = self.request_builder.json_post(
            &self.request_format.resolve_path("chat/completions"),
            serialize_body(&body)?,
            &options,
        )?;
        let bytes = self
            .networker
            .make_request_and_wait_for_stream(request)
            .await?;
        Ok(decode_json_events(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::providers::openai::types::OpenAiChatMessage;
    use crate::request::RequestDescriptor;
    use crate::transport::{StreamingResponse, Transport, TransportResponse};
    use bytes::Bytes;
    use futures::StreamExt;
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;
    use std::sync::Mutex;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            OpenAiRequestFormat::Standard.resolve_path("chat/completions"),
            "/v1/chat/completions"
        );
        assert_eq!(
            OpenAiRequestFormat::NoVersionPrefix.resolve_path("chat/completions"),
            "/chat/completions"
        );
        assert_eq!(
            OpenAiRequestFormat::AzureDeployment.resolve_path("chat/completions"),
            "chat/completions"
        );
        assert_eq!(OpenAiRequestFormat::default(), OpenAiRequestFormat::Standard);
    }

    /// Records the last request and replies with a fixed body.
    struct RecordingTransport {
        last: Mutex<Option<RequestDescriptor>>,
        body: &'static str,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: RequestDescriptor) -> Result<TransportResponse> {
            *self.last.lock().unwrap() = Some(request);
            Ok(TransportResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }

        async fn send_streaming(&self, request: RequestDescriptor) -> Result<StreamingResponse> {
            *self.last.lock().unwrap() = Some(request);
            Ok(StreamingResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: futures::stream::iter([Ok::<_, crate::error::AiProxyError>(
                    Bytes::from_static(sse_body()),
                )])
                .boxed(),
            })
        }
    }

    fn sse_body() -> &'static [u8] {
        b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n"
    }

    fn client(transport: Arc<RecordingTransport>) -> OpenAiClient {
        let builder = crate::request::DirectRequestBuilder::new(
            "https://api.openai.com",
            crate::request::DirectAuth::Bearer(secrecy::SecretString::from("sk-test")),
        );
        OpenAiClient::new(
            OpenAiRequestFormat::Standard,
            Arc::new(builder),
            ServiceNetworker::new(transport, Arc::new(Configuration::default())),
        )
    }

    fn sent_body(transport: &RecordingTransport) -> serde_json::Value {
        let last = transport.last.lock().unwrap();
        let body = last.as_ref().unwrap().body.clone().unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_non_streaming_call_clears_stream_fields() {
        let transport = Arc::new(RecordingTransport {
            last: Mutex::new(None),
            body: r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hello"},"finish_reason":"stop"}]}"#,
        });
        let mut body =
            OpenAiChatCompletionRequestBody::new("gpt-4o-mini", vec![OpenAiChatMessage::user("hi")]);
        body.stream = Some(true);
        body.stream_options = Some(OpenAiStreamOptions {
            include_usage: true,
        });

        let response = client(transport.clone())
            .chat_completion(body)
            .await
            .unwrap();
        assert_eq!(response.first_content(), Some("Hello"));

        let sent = sent_body(&transport);
        assert_eq!(sent["stream"], false);
        assert!(sent.get("stream_options").is_none());

        let last = transport.last.lock().unwrap();
        let request = last.as_ref().unwrap();
        assert_eq!(request.url.as_str(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
    }

    #[tokio::test]
    async fn test_streaming_call_requests_usage() {
        let transport = Arc::new(RecordingTransport {
            last: Mutex::new(None),
            body: "",
        });
        let body =
            OpenAiChatCompletionRequestBody::new("gpt-4o-mini", vec![OpenAiChatMessage::user("hi")]);

        let chunks: Vec<_> = client(transport.clone())
            .stream_chat_completion_request(body, RequestOptions::default())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(chunks.len(), 1);
        let chunk = chunks[0].as_ref().unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));

        let sent = sent_body(&transport);
        assert_eq!(sent["stream"], true);
        assert_eq!(sent["stream_options"]["include_usage"], true);
    }
}
