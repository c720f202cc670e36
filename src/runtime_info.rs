//! Runtime environment information
//!
//! Feeds the proxy metadata header. Collection is best-effort: anything that
//! cannot be determined is left as `None` and rendered as `"unknown"` where
//! the header is assembled.

use std::collections::HashMap;

/// Description of the host application and device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub bundle_id: Option<String>,
    pub app_version: Option<String>,
    pub system_name: Option<String>,
    pub os_version: Option<String>,
    pub device_model: Option<String>,
}

impl RuntimeInfo {
    /// Mapping keyed by `bundleID`, `appVersion`, `systemName`, `osVersion`
    /// and `deviceModel`; missing fields are `"unknown"`.
    pub fn as_map(&self) -> HashMap<&'static str, String> {
        [
            ("bundleID", &self.bundle_id),
            ("appVersion", &self.app_version),
            ("systemName", &self.system_name),
            ("osVersion", &self.os_version),
            ("deviceModel", &self.device_model),
        ]
        .into_iter()
        .map(|(key, value)| (key, value.clone().unwrap_or_else(|| "unknown".to_string())))
        .collect()
    }
}

/// Source of runtime information.
pub trait RuntimeInfoProvider: Send + Sync {
    fn runtime_info(&self) -> RuntimeInfo;
}

/// Describes the current host, with the OS chosen at compile time.
#[derive(Debug, Clone, Default)]
pub struct HostRuntimeInfo {
    bundle_id: Option<String>,
    app_version: Option<String>,
}

impl HostRuntimeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identify the embedding application.
    pub fn with_app(mut self, bundle_id: impl Into<String>, app_version: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self.app_version = Some(app_version.into());
        self
    }
}

impl RuntimeInfoProvider for HostRuntimeInfo {
    fn runtime_info(&self) -> RuntimeInfo {
        RuntimeInfo {
            bundle_id: self.bundle_id.clone(),
            app_version: self.app_version.clone(),
            system_name: system_name().map(str::to_string),
            os_version: None,
            device_model: Some(std::env::consts::ARCH.to_string()),
        }
    }
}

#[cfg(target_os = "macos")]
fn system_name() -> Option<&'static str> {
    Some("macOS")
}

#[cfg(target_os = "ios")]
fn system_name() -> Option<&'static str> {
    Some("iOS")
}

#[cfg(target_os = "linux")]
fn system_name() -> Option<&'static str> {
    Some("Linux")
}

#[cfg(target_os = "windows")]
fn system_name() -> Option<&'static str> {
    Some("Windows")
}

#[cfg(target_os = "android")]
fn system_name() -> Option<&'static str> {
    Some("Android")
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "linux",
    target_os = "windows",
    target_os = "android"
)))]
fn system_name() -> Option<&'static str> {
    None
}

/// Fixed runtime information, for callers that gather it themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticRuntimeInfo(pub RuntimeInfo);

impl RuntimeInfoProvider for StaticRuntimeInfo {
    fn runtime_info(&self) -> RuntimeInfo {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_render_unknown() {
        let map = RuntimeInfo {
            bundle_id: Some("com.example.app".into()),
            ..Default::default()
        }
        .as_map();

        assert_eq!(map["bundleID"], "com.example.app");
        assert_eq!(map["appVersion"], "unknown");
        assert_eq!(map["systemName"], "unknown");
        assert_eq!(map["osVersion"], "unknown");
        assert_eq!(map["deviceModel"], "unknown");
    }

    #[test]
    fn test_host_runtime_info() {
        let info = HostRuntimeInfo::new()
            .with_app("com.example.app", "1.2.3")
            .runtime_info();
        assert_eq!(info.bundle_id.as_deref(), Some("com.example.app"));
        assert_eq!(info.app_version.as_deref(), Some("1.2.3"));
        assert_eq!(info.device_model.as_deref(), Some(std::env::consts::ARCH));
        #[cfg(target_os = "linux")]
        assert_eq!(info.system_name.as_deref(), Some("Linux"));
    }
}
