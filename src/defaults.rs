//! Default Configuration Values
//!
//! Centralizes default values used throughout the library.

use std::time::Duration;

/// Library version reported in the proxy metadata header
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP defaults
pub mod http {
    use super::*;

    /// Maximum time to wait for a single exchange when the caller gives none
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub const JSON_CONTENT_TYPE: &str = "application/json";
}

/// Proxy defaults
pub mod proxy {
    /// Origin used for proxied requests when no service URL is configured
    pub const DEFAULT_ORIGIN: &str = "https://api.aiproxy.com";

    /// Protocol tag leading the metadata header
    pub const METADATA_PROTOCOL_VERSION: &str = "v4";

    pub const PARTIAL_KEY_HEADER: &str = "aiproxy-partial-key";
    pub const CLIENT_ID_HEADER: &str = "aiproxy-client-id";
    pub const METADATA_HEADER: &str = "aiproxy-metadata";
}

/// Provider base URLs for direct mode
pub mod providers {
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
}
