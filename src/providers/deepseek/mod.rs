//! DeepSeek provider

pub mod client;
pub mod types;

pub use client::{DeepSeekClient, DeepSeekService};
pub use types::*;
