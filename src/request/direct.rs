//! Direct requests: provider origin plus a caller-held API key.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};

use super::headers::HeaderBuilder;
use super::{RequestBuilder, RequestDescriptor, RequestOptions, join_url};
use crate::error::Result;

impl RequestDescriptor {
    /// Build a request against a provider's native base URL.
    ///
    /// `base_url` and `path` are concatenated verbatim. Headers are layered as
    /// content type first, then `additional_headers`, which win on collision.
    pub fn direct(
        base_url: &str,
        path: &str,
        body: Option<Vec<u8>>,
        method: Method,
        timeout: Duration,
        content_type: Option<&str>,
        additional_headers: &HashMap<String, String>,
    ) -> Result<Self> {
        let url = join_url(base_url, path)?;

        let mut headers = HeaderBuilder::new();
        if let Some(content_type) = content_type {
            headers = headers.with_content_type(content_type)?;
        }
        let headers = headers.with_custom_headers(additional_headers)?.build();

        Ok(Self {
            url,
            method,
            body: body.map(Bytes::from),
            timeout,
            headers,
        })
    }
}

/// How a direct request proves its identity to the provider.
#[derive(Debug, Clone)]
pub enum DirectAuth {
    /// `Authorization: Bearer <key>`
    Bearer(SecretString),
    /// Key sent in a provider-specific header, e.g. `X-Goog-Api-Key`
    Header { name: String, key: SecretString },
    None,
}

/// Builds requests straight to a provider.
#[derive(Debug, Clone)]
pub struct DirectRequestBuilder {
    base_url: String,
    auth: DirectAuth,
    default_headers: HashMap<String, String>,
}

impl DirectRequestBuilder {
    pub fn new(base_url: impl Into<String>, auth: DirectAuth) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            default_headers: HashMap::new(),
        }
    }

    /// Add a header sent with every request unless the caller overrides it.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl RequestBuilder for DirectRequestBuilder {
    fn build(
        &self,
        path: &str,
        body: Option<Vec<u8>>,
        method: Method,
        content_type: Option<&str>,
        options: &RequestOptions,
    ) -> Result<RequestDescriptor> {
        let mut descriptor = RequestDescriptor::direct(
            &self.base_url,
            path,
            body,
            method,
            options.timeout,
            content_type,
            &HashMap::new(),
        )?;

        let mut headers = HeaderBuilder::new();
        headers = match &self.auth {
            DirectAuth::Bearer(key) => headers.with_bearer_auth(key.expose_secret())?,
            DirectAuth::Header { name, key } => headers.with_secret_header(name, key.expose_secret())?,
            DirectAuth::None => headers,
        };
        let layered = headers
            .with_custom_headers(&self.default_headers)?
            .with_custom_headers(&options.additional_headers)?
            .build();

        for (name, value) in &layered {
            descriptor.headers.insert(name.clone(), value.clone());
        }
        Ok(descriptor)
    }
}
