//! HTTP header assembly
//!
//! Later insertions replace earlier ones, so callers layer defaults first and
//! caller-supplied headers last.

use std::collections::HashMap;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::error::{AiProxyError, Result};

/// HTTP header builder for outgoing requests
#[derive(Debug, Default)]
pub struct HeaderBuilder {
    headers: HeaderMap,
}

impl HeaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add Bearer token authorization
    pub fn with_bearer_auth(mut self, token: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| AiProxyError::ConfigurationError(format!("Invalid API key format: {e}")))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    /// Add a key-carrying header such as `X-Goog-Api-Key`
    pub fn with_secret_header(mut self, name: &str, secret: &str) -> Result<Self> {
        let name = parse_name(name)?;
        let mut value = HeaderValue::from_str(secret)
            .map_err(|e| AiProxyError::ConfigurationError(format!("Invalid header value for '{name}': {e}")))?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn with_content_type(mut self, content_type: &str) -> Result<Self> {
        let value = HeaderValue::from_str(content_type).map_err(|e| {
            AiProxyError::ConfigurationError(format!("Invalid content type '{content_type}': {e}"))
        })?;
        self.headers.insert(CONTENT_TYPE, value);
        Ok(self)
    }

    /// Add a custom header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name = parse_name(name)?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            AiProxyError::ConfigurationError(format!("Invalid header value for '{name}': {e}"))
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Add multiple custom headers, replacing any already present
    pub fn with_custom_headers(mut self, custom_headers: &HashMap<String, String>) -> Result<Self> {
        for (name, value) in custom_headers {
            self = self.with_header(name, value)?;
        }
        Ok(self)
    }

    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

fn parse_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| AiProxyError::ConfigurationError(format!("Invalid header name '{name}': {e}")))
}

/// Render headers for logs, hiding sensitive values.
pub(crate) fn format_headers_for_logging(headers: &HeaderMap) -> String {
    let mut rendered: Vec<String> = headers
        .iter()
        .map(|(name, value)| {
            let shown = if value.is_sensitive() || name.as_str().ends_with("key") {
                mask_sensitive_value(value.to_str().unwrap_or("<invalid>"))
            } else {
                value.to_str().unwrap_or("<invalid>").to_string()
            };
            format!("{name}: {shown}")
        })
        .collect();
    rendered.sort();
    rendered.join(", ")
}

fn mask_sensitive_value(value: &str) -> String {
    let (prefix, secret) = match value.strip_prefix("Bearer ") {
        Some(token) => ("Bearer ", token),
        None => ("", value),
    };
    if secret.len() > 8 && secret.is_ascii() {
        format!("{prefix}{}...{}", &secret[..4], &secret[secret.len() - 4..])
    } else {
        format!("{prefix}***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_headers_override_defaults() {
        let headers = HeaderBuilder::new()
            .with_content_type("application/json")
            .unwrap()
            .with_custom_headers(&HashMap::from([(
                "Content-Type".to_string(),
                "text/plain".to_string(),
            )]))
            .unwrap()
            .build();

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_invalid_header_name() {
        let result = HeaderBuilder::new().with_header("Invalid Header", "x");
        assert!(matches!(result, Err(AiProxyError::ConfigurationError(_))));
    }

    #[test]
    fn test_masking() {
        let headers = HeaderBuilder::new()
            .with_bearer_auth("sk-1234567890abcdef")
            .unwrap()
            .with_secret_header("x-goog-api-key", "short")
            .unwrap()
            .with_header("Accept", "application/json")
            .unwrap()
            .build();

        let rendered = format_headers_for_logging(&headers);
        assert!(rendered.contains("authorization: Bearer sk-1...cdef"));
        assert!(rendered.contains("x-goog-api-key: ***"));
        assert!(rendered.contains("accept: application/json"));
        assert!(!rendered.contains("1234567890"));
    }
}
