//! Client entry point
//!
//! [`AiProxy`] owns the configuration, transport and runtime-info source
//! shared by every service it creates. Each factory method returns a facade
//! wired either to the provider directly or to the proxy.

use std::sync::Arc;

use secrecy::SecretString;

use crate::config::Configuration;
use crate::defaults;
use crate::error::Result;
use crate::networker::ServiceNetworker;
use crate::providers::deepseek::DeepSeekClient;
use crate::providers::gemini::GeminiClient;
use crate::providers::gemini::client::API_KEY_HEADER;
use crate::providers::openai::{OpenAiClient, OpenAiRequestFormat};
use crate::request::{
    DirectAuth, DirectRequestBuilder, ProxiedRequestBuilder, ProxyConfig, RequestBuilder,
};
use crate::runtime_info::{HostRuntimeInfo, RuntimeInfoProvider};
use crate::transport::{ReqwestTransport, Transport};

/// Azure OpenAI authenticates with this header rather than a bearer token.
const AZURE_API_KEY_HEADER: &str = "api-key";

/// Factory for provider services.
#[derive(Clone)]
pub struct AiProxy {
    config: Arc<Configuration>,
    transport: Arc<dyn Transport>,
    runtime_info: Arc<dyn RuntimeInfoProvider>,
}

impl std::fmt::Debug for AiProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiProxy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AiProxy {
    /// Create a factory backed by the default `reqwest` transport.
    pub fn new(config: Configuration) -> Result<Self> {
        let transport = ReqwestTransport::new(config.resolve_dns_over_tls)?;
        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            runtime_info: Arc::new(HostRuntimeInfo::new()),
        })
    }

    /// Create a factory configured from `AIPROXY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(Configuration::from_env())
    }

    /// Replace the transport, e.g. with a custom `reqwest::Client`.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the source of the metadata header's device fields.
    pub fn with_runtime_info(mut self, runtime_info: Arc<dyn RuntimeInfoProvider>) -> Self {
        self.runtime_info = runtime_info;
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    fn networker(&self) -> ServiceNetworker {
        ServiceNetworker::new(self.transport.clone(), self.config.clone())
    }

    fn proxied(&self, proxy: ProxyConfig) -> Arc<dyn RequestBuilder> {
        let stable_id = self.config.effective_stable_id().map(str::to_string);
        Arc::new(
            ProxiedRequestBuilder::new(proxy, self.runtime_info.clone()).with_stable_id(stable_id),
        )
    }

    /// OpenAI through the proxy.
    pub fn openai_service(
        &self,
        proxy: ProxyConfig,
        request_format: OpenAiRequestFormat,
    ) -> OpenAiClient {
        OpenAiClient::new(request_format, self.proxied(proxy), self.networker())
    }

    /// OpenAI, or an OpenAI-compatible host, called with the caller's key.
    ///
    /// `base_url` defaults to `https://api.openai.com`. Azure deployments
    /// send the key in the `api-key` header and need a `base_url` ending in
    /// the deployment route and a `/`; without one every call fails with
    /// [`AiProxyError::MalformedUrl`](crate::error::AiProxyError::MalformedUrl).
    pub fn openai_direct_service(
        &self,
        api_key: impl Into<String>,
        base_url: Option<&str>,
        request_format: OpenAiRequestFormat,
    ) -> OpenAiClient {
        let key = SecretString::from(api_key.into());
        let auth = match request_format {
            OpenAiRequestFormat::AzureDeployment => DirectAuth::Header {
                name: AZURE_API_KEY_HEADER.to_string(),
                key,
            },
            _ => DirectAuth::Bearer(key),
        };
        let builder = DirectRequestBuilder::new(
            base_url.unwrap_or(defaults::providers::OPENAI_BASE_URL),
            auth,
        );
        OpenAiClient::new(request_format, Arc::new(builder), self.networker())
    }

    /// DeepSeek through the proxy.
    pub fn deepseek_service(&self, proxy: ProxyConfig) -> DeepSeekClient {
        DeepSeekClient::new(self.proxied(proxy), self.networker())
    }

    /// DeepSeek called with the caller's key. `base_url` defaults to
    /// `https://api.deepseek.com`.
    pub fn deepseek_direct_service(
        &self,
        api_key: impl Into<String>,
        base_url: Option<&str>,
    ) -> DeepSeekClient {
        let builder = DirectRequestBuilder::new(
            base_url.unwrap_or(defaults::providers::DEEPSEEK_BASE_URL),
            DirectAuth::Bearer(SecretString::from(api_key.into())),
        )
        .with_default_header("Accept", defaults::http::JSON_CONTENT_TYPE);
        DeepSeekClient::new(Arc::new(builder), self.networker())
    }

    /// Gemini through the proxy.
    pub fn gemini_service(&self, proxy: ProxyConfig) -> GeminiClient {
        GeminiClient::new(self.proxied(proxy), self.networker())
    }

    /// Gemini called with the caller's key. `base_url` defaults to
    /// `https://generativelanguage.googleapis.com`.
    pub fn gemini_direct_service(
        &self,
        api_key: impl Into<String>,
        base_url: Option<&str>,
    ) -> GeminiClient {
        let builder = DirectRequestBuilder::new(
            base_url.unwrap_or(defaults::providers::GEMINI_BASE_URL),
            DirectAuth::Header {
                name: API_KEY_HEADER.to_string(),
                key: SecretString::from(api_key.into()),
            },
        );
        GeminiClient::new(Arc::new(builder), self.networker())
    }
}
