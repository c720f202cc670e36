//! Google Gemini provider

pub mod client;
pub mod types;

pub use client::{GeminiClient, GeminiService};
pub use types::*;
