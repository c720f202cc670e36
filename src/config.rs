//! Client configuration
//!
//! A [`Configuration`] is captured by every service created from the same
//! [`crate::AiProxy`] instance. The core only reads it.

use serde::{Deserialize, Serialize};

/// Per-client configuration flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Ask the transport to resolve proxy hostnames over DNS-over-TLS.
    pub resolve_dns_over_tls: bool,

    /// Log outgoing request bodies at info level. The flag is the opt-in, so
    /// bodies are logged even when the threshold is above info.
    pub print_request_bodies: bool,

    /// Log incoming response bodies, under the same rule as request bodies.
    pub print_response_bodies: bool,

    /// Send the stable identifier as the proxy client id when no explicit
    /// client id is given.
    pub use_stable_id: bool,

    /// Opaque long-lived installation identifier.
    pub stable_id: Option<String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from `AIPROXY_*` environment variables.
    ///
    /// Boolean flags accept `1`, `true`, `yes` and `on` (case-insensitive);
    /// anything else, or an unset variable, leaves the flag off.
    pub fn from_env() -> Self {
        Self {
            resolve_dns_over_tls: env_flag("AIPROXY_RESOLVE_DNS_OVER_TLS"),
            print_request_bodies: env_flag("AIPROXY_PRINT_REQUEST_BODIES"),
            print_response_bodies: env_flag("AIPROXY_PRINT_RESPONSE_BODIES"),
            use_stable_id: env_flag("AIPROXY_USE_STABLE_ID"),
            stable_id: std::env::var("AIPROXY_STABLE_ID")
                .ok()
                .filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn with_resolve_dns_over_tls(mut self, enabled: bool) -> Self {
        self.resolve_dns_over_tls = enabled;
        self
    }

    pub fn with_print_request_bodies(mut self, enabled: bool) -> Self {
        self.print_request_bodies = enabled;
        self
    }

    pub fn with_print_response_bodies(mut self, enabled: bool) -> Self {
        self.print_response_bodies = enabled;
        self
    }

    /// Enable the stable identifier and set its value.
    pub fn with_stable_id(mut self, stable_id: impl Into<String>) -> Self {
        self.use_stable_id = true;
        self.stable_id = Some(stable_id.into());
        self
    }

    /// The stable identifier, if enabled and present.
    pub fn effective_stable_id(&self) -> Option<&str> {
        if self.use_stable_id {
            self.stable_id.as_deref()
        } else {
            None
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| parse_flag(&value))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Configuration::default();
        assert!(!config.resolve_dns_over_tls);
        assert!(!config.print_request_bodies);
        assert!(!config.print_response_bodies);
        assert_eq!(config.effective_stable_id(), None);
    }

    #[test]
    fn test_stable_id_requires_flag() {
        let config = Configuration {
            stable_id: Some("install-123".into()),
            ..Default::default()
        };
        assert_eq!(config.effective_stable_id(), None);

        let config = Configuration::new().with_stable_id("install-123");
        assert_eq!(config.effective_stable_id(), Some("install-123"));
    }

    #[test]
    fn test_parse_flag() {
        for truthy in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(parse_flag(truthy), "{truthy}");
        }
        for falsy in ["0", "false", "", "nope"] {
            assert!(!parse_flag(falsy), "{falsy}");
        }
    }

    #[test]
    fn test_deserialize_partial() {
        let config: Configuration =
            serde_json::from_str(r#"{"print_response_bodies": true}"#).unwrap();
        assert!(config.print_response_bodies);
        assert!(!config.print_request_bodies);
    }
}
