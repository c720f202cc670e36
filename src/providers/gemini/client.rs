//! Gemini service facade

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{GeminiGenerateContentRequestBody, GeminiGenerateContentResponseBody};
use crate::error::Result;
use crate::networker::ServiceNetworker;
use crate::request::{RequestBuilder, RequestOptions, serialize_body};

/// Header carrying the API key on direct requests.
pub const API_KEY_HEADER: &str = "X-Goog-Api-Key";

/// `generateContent` route for a model, e.g. `gemini-2.0-flash`.
pub fn generate_content_path(model: &str) -> String {
    format!("/v1beta/models/{model}:generateContent")
}

/// Google puts chat, transcription and video understanding under one
/// "generate content" call.
#[async_trait]
pub trait GeminiService: Send + Sync {
    async fn generate_content_request(
        &self,
        body: GeminiGenerateContentRequestBody,
        model: &str,
        options: RequestOptions,
    ) -> Result<GeminiGenerateContentResponseBody>;

    async fn generate_content(
        &self,
        body: GeminiGenerateContentRequestBody,
        model: &str,
    ) -> Result<GeminiGenerateContentResponseBody> {
        self.generate_content_request(body, model, RequestOptions::default())
            .await
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    request_builder: Arc<dyn RequestBuilder>,
    networker: ServiceNetworker,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient").finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(request_builder: Arc<dyn RequestBuilder>, networker: ServiceNetworker) -> Self {
        Self {
            request_builder,
            networker,
        }
    }
}

#[async_trait]
impl GeminiService for GeminiClient {
    async fn generate_content_request(
        &self,
        body: GeminiGenerateContentRequestBody,
        model: &str,
        options: RequestOptions,
    ) -> Result<GeminiGenerateContentResponseBody> {
        let request = self.request_builder.json_post(
            &generate_content_path(model),
            serialize_body(&body)?,
            &options,
        )?;
        self.networker
            .make_request_and_deserialize_response(request)
            .await
    }
}
