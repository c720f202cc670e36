//! Provider facades
//!
//! Each provider exposes a service trait and one client type. The client is
//! direct or proxied depending on the request builder it is given; see
//! [`crate::AiProxy`] for the factory methods.

pub mod deepseek;
pub mod gemini;
pub mod openai;
