//! Proxied requests: proxy origin plus partial key and metadata header.
//!
//! The proxy completes the provider key and verifies requests server-side;
//! this side only attaches the identifying headers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};

use super::headers::HeaderBuilder;
use super::{RequestBuilder, RequestDescriptor, RequestOptions, join_url};
use crate::defaults::{self, proxy};
use crate::error::Result;
use crate::runtime_info::{RuntimeInfo, RuntimeInfoProvider};

/// Connection details for a proxied service.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Partial key issued by the proxy for this service
    pub partial_key: SecretString,
    /// Proxy origin; defaults to the hosted proxy when absent
    pub service_url: Option<String>,
    /// Caller-chosen client identifier
    pub client_id: Option<String>,
}

impl ProxyConfig {
    pub fn new(partial_key: impl Into<String>) -> Self {
        Self {
            partial_key: SecretString::from(partial_key.into()),
            service_url: None,
            client_id: None,
        }
    }

    pub fn with_service_url(mut self, service_url: impl Into<String>) -> Self {
        self.service_url = Some(service_url.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn origin(&self) -> &str {
        self.service_url
            .as_deref()
            .unwrap_or(proxy::DEFAULT_ORIGIN)
            .trim_end_matches('/')
    }
}

/// Assemble the pipe-separated metadata header.
///
/// Fields: protocol tag, bundle id, app version, library version, Unix
/// timestamp, OS name, OS version, device model, body size. Missing runtime
/// fields become `"unknown"`; characters that cannot appear in a header value
/// or would break the field layout are replaced with `_`.
pub fn metadata_header(info: &RuntimeInfo, body_size: Option<usize>, now: DateTime<Utc>) -> String {
    let field = |value: &Option<String>| {
        value
            .as_deref()
            .map(sanitize_field)
            .unwrap_or_else(|| "unknown".to_string())
    };
    [
        proxy::METADATA_PROTOCOL_VERSION.to_string(),
        field(&info.bundle_id),
        field(&info.app_version),
        defaults::LIBRARY_VERSION.to_string(),
        now.timestamp().to_string(),
        field(&info.system_name),
        field(&info.os_version),
        field(&info.device_model),
        body_size.unwrap_or(0).to_string(),
    ]
    .join("|")
}

fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|c| if (' '..='~').contains(&c) && c != '|' { c } else { '_' })
        .collect()
}

/// Builds requests to the proxy origin.
#[derive(Clone)]
pub struct ProxiedRequestBuilder {
    proxy: ProxyConfig,
    runtime_info: Arc<dyn RuntimeInfoProvider>,
    stable_id: Option<String>,
}

impl ProxiedRequestBuilder {
    pub fn new(proxy: ProxyConfig, runtime_info: Arc<dyn RuntimeInfoProvider>) -> Self {
        Self {
            proxy,
            runtime_info,
            stable_id: None,
        }
    }

    /// Fallback client id used when the proxy config carries none.
    pub fn with_stable_id(mut self, stable_id: Option<String>) -> Self {
        self.stable_id = stable_id;
        self
    }

    fn client_id(&self) -> Option<&str> {
        self.proxy
            .client_id
            .as_deref()
            .or(self.stable_id.as_deref())
    }
}

impl std::fmt::Debug for ProxiedRequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxiedRequestBuilder")
            .field("proxy", &self.proxy)
            .field("stable_id", &self.stable_id)
            .finish_non_exhaustive()
    }
}

impl RequestBuilder for ProxiedRequestBuilder {
    fn build(
        &self,
        path: &str,
        body: Option<Vec<u8>>,
        method: Method,
        content_type: Option<&str>,
        options: &RequestOptions,
    ) -> Result<RequestDescriptor> {
        // The origin never ends in `/`, so relative paths need a separator.
        let url = if path.starts_with('/') {
            join_url(self.proxy.origin(), path)?
        } else {
            join_url(&format!("{}/", self.proxy.origin()), path)?
        };
        let metadata = metadata_header(
            &self.runtime_info.runtime_info(),
            body.as_ref().map(Vec::len),
            Utc::now(),
        );

        let mut headers = HeaderBuilder::new()
            .with_secret_header(proxy::PARTIAL_KEY_HEADER, self.proxy.partial_key.expose_secret())?
            .with_header(proxy::METADATA_HEADER, &metadata)?;
        if let Some(client_id) = self.client_id() {
            headers = headers.with_header(proxy::CLIENT_ID_HEADER, client_id)?;
        }
        if let Some(content_type) = content_type {
            headers = headers.with_content_type(content_type)?;
        }
        let headers = headers
            .with_custom_headers(&options.additional_headers)?
            .build();

        Ok(RequestDescriptor {
            url,
            method,
            body: body.map(Into::into),
            timeout: options.timeout,
            headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::openai::OpenAiRequestFormat;
    use crate::runtime_info::StaticRuntimeInfo;
    use chrono::TimeZone;

    fn runtime() -> RuntimeInfo {
        RuntimeInfo {
            bundle_id: Some("com.example.app".into()),
            app_version: Some("2.1".into()),
            system_name: Some("macOS".into()),
            os_version: None,
            device_model: Some("Mac|Pro \u{2318}".into()),
        }
    }

    #[test]
    fn test_metadata_header_layout() {
        let now = Utc.timestamp_opt(1_737_970_000, 0).unwrap();
        let header = metadata_header(&runtime(), Some(512), now);
        let fields: Vec<&str> = header.split('|').collect();

        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0], "v4");
        assert_eq!(fields[1], "com.example.app");
        assert_eq!(fields[2], "2.1");
        assert_eq!(fields[3], env!("CARGO_PKG_VERSION"));
        assert_eq!(fields[4], "1737970000");
        assert_eq!(fields[5], "macOS");
        assert_eq!(fields[6], "unknown");
        assert_eq!(fields[7], "Mac_Pro _");
        assert_eq!(fields[8], "512");
    }

    #[test]
    fn test_metadata_header_without_body_or_info() {
        let now = Utc.timestamp_opt(0, 0).unwrap();
        let header = metadata_header(&RuntimeInfo::default(), None, now);
        assert_eq!(
            header,
            format!("v4|unknown|unknown|{}|0|unknown|unknown|unknown|0", env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn test_proxied_descriptor() {
        let builder = ProxiedRequestBuilder::new(
            ProxyConfig::new("pk-partial").with_service_url("https://proxy.example.com/"),
            Arc::new(StaticRuntimeInfo(runtime())),
        )
        .with_stable_id(Some("stable-1".into()));

        let descriptor = builder
            .json_post("/chat/completions", b"{\"a\":1}".to_vec(), &RequestOptions::default())
            .unwrap();

        assert_eq!(descriptor.url.as_str(), "https://proxy.example.com/chat/completions");
        assert_eq!(descriptor.header(proxy::PARTIAL_KEY_HEADER), Some("pk-partial"));
        assert_eq!(descriptor.header(proxy::CLIENT_ID_HEADER), Some("stable-1"));
        assert!(
            descriptor
                .header(proxy::METADATA_HEADER)
                .unwrap()
                .ends_with("|7")
        );
        assert_eq!(descriptor.content_type(), Some("application/json"));
    }

    #[test]
    fn test_explicit_client_id_beats_stable_id() {
        let builder = ProxiedRequestBuilder::new(
            ProxyConfig::new("pk").with_client_id("client-9"),
            Arc::new(StaticRuntimeInfo::default()),
        )
        .with_stable_id(Some("stable-1".into()));
        let descriptor = builder
            .json_post("/x", Vec::new(), &RequestOptions::default())
            .unwrap();
        assert_eq!(descriptor.header(proxy::CLIENT_ID_HEADER), Some("client-9"));
        assert_eq!(descriptor.url.as_str(), "https://api.aiproxy.com/x");
    }

    #[test]
    fn test_relative_path_is_separated_from_origin() {
        let path = OpenAiRequestFormat::AzureDeployment.resolve_path("chat/completions");
        for origin in ["https://proxy.example.com", "https://proxy.example.com/"] {
            let builder = ProxiedRequestBuilder::new(
                ProxyConfig::new("pk").with_service_url(origin),
                Arc::new(StaticRuntimeInfo::default()),
            );
            let descriptor = builder
                .json_post(&path, b"{}".to_vec(), &RequestOptions::default())
                .unwrap();
            assert_eq!(
                descriptor.url.as_str(),
                "https://proxy.example.com/chat/completions"
            );
        }
    }
}
