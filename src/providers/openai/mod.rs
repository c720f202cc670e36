//! OpenAI provider
//!
//! Chat completions against `api.openai.com` or any OpenAI-compatible host
//! (Azure deployments, self-hosted gateways), directly or via the proxy.

pub mod client;
pub mod types;

pub use client::{OpenAiClient, OpenAiRequestFormat, OpenAiService};
pub use types::*;
