//! DeepSeek service facade

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{DeepSeekChatCompletionRequestBody, DeepSeekChatCompletionResponseBody};
use crate::error::Result;
use crate::networker::ServiceNetworker;
use crate::request::{RequestBuilder, RequestOptions, serialize_body};

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

#[async_trait]
pub trait DeepSeekService: Send + Sync {
    /// Non-streaming chat completion against `/chat/completions`.
    async fn chat_completion_request(
        &self,
        body: DeepSeekChatCompletionRequestBody,
        options: RequestOptions,
    ) -> Result<DeepSeekChatCompletionResponseBody>;

    async fn chat_completion(
        &self,
        body: DeepSeekChatCompletionRequestBody,
    ) -> Result<DeepSeekChatCompletionResponseBody> {
        self.chat_completion_request(body, RequestOptions::default())
            .await
    }
}

#[derive(Clone)]
pub struct DeepSeekClient {
    request_builder: Arc<dyn RequestBuilder>,
    networker: ServiceNetworker,
}

impl std::fmt::Debug for DeepSeekClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekClient").finish_non_exhaustive()
    }
}

impl DeepSeekClient {
    pub fn new(request_builder: Arc<dyn RequestBuilder>, networker: ServiceNetworker) -> Self {
        Self {
            request_builder,
            networker,
        }
    }
}

#[async_trait]
impl DeepSeekService for DeepSeekClient {
    async fn chat_completion_request(
        &self,
        mut body: DeepSeekChatCompletionRequestBody,
        options: RequestOptions,
    ) -> Result<DeepSeekChatCompletionResponseBody> {
        body.stream = Some(false);
        body.stream_options = None;
        let request =
            self.request_builder
                .json_post(CHAT_COMPLETIONS_PATH, serialize_body(&body)?, &options)?;
        self.networker
            .make_request_and_deserialize_response(request)
            .await
    }
}
