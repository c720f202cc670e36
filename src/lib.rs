//! # AIProxy - Typed AI Provider Clients
//!
//! Typed request/response clients for OpenAI, Gemini and DeepSeek. Every
//! service can be used in two modes:
//!
//! - **Direct**: requests go straight to the provider with a key the caller
//!   holds.
//! - **Proxied**: requests go to an AIProxy origin with a partial key and a
//!   metadata header; the proxy completes the key server-side.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aiproxy::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let proxy = AiProxy::new(Configuration::default())?;
//!     let deepseek = proxy.deepseek_direct_service("sk-...", None);
//!
//!     let body = DeepSeekChatCompletionRequestBody::new(
//!         "deepseek-chat",
//!         vec![DeepSeekMessage::user("Hello, world!")],
//!     );
//!     let response = deepseek.chat_completion(body).await?;
//!     if let Some(choice) = response.choices.first() {
//!         println!("{}", choice.message.content.as_deref().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Behaviour shared by every call
//!
//! - One HTTP exchange per call; nothing is retried.
//! - Each call is bounded by [`RequestOptions::timeout`] (60 seconds by
//!   default) and fails with [`AiProxyError::Timeout`] when it elapses.
//! - Non-streaming calls force `stream = false` and drop stream options.
//! - Non-2xx responses surface as [`AiProxyError::Unauthorized`] or
//!   [`AiProxyError::ProviderError`] with the provider's raw body.
//!
//! Logging goes through `tracing` under the `aiproxy` target and is gated by
//! [`logging::set_log_level`]. Call [`logging::init_stdout_logging`] to print
//! it without installing a subscriber of your own. Request and response bodies
//! are logged only when enabled on [`Configuration`], and then regardless of
//! the threshold.

#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod defaults;
pub mod error;
pub mod json_value;
pub mod logging;
pub mod networker;
pub mod providers;
pub mod request;
pub mod runtime_info;
pub mod streaming;
pub mod transport;

pub use client::AiProxy;
pub use config::Configuration;
pub use error::{AiProxyError, Result};
pub use json_value::JsonValue;
pub use logging::LogLevel;
pub use request::{ProxyConfig, RequestOptions};

/// Commonly used types
pub mod prelude {
    pub use crate::client::AiProxy;
    pub use crate::config::Configuration;
    pub use crate::error::{AiProxyError, Result};
    pub use crate::json_value::JsonValue;
    pub use crate::logging::{LogLevel, set_log_level};
    pub use crate::request::{ProxyConfig, RequestOptions};

    pub use crate::providers::deepseek::{
        DeepSeekChatCompletionRequestBody, DeepSeekChatCompletionResponseBody, DeepSeekMessage,
        DeepSeekService, DeepSeekUsage,
    };
    pub use crate::providers::gemini::{
        GeminiContent, GeminiGenerateContentRequestBody, GeminiGenerateContentResponseBody,
        GeminiPart, GeminiService,
    };
    pub use crate::providers::openai::{
        OpenAiChatCompletionRequestBody, OpenAiChatCompletionResponseBody, OpenAiChatMessage,
        OpenAiRequestFormat, OpenAiService,
    };
}
