//! Remote endpoint configuration.
//!
//! Resolved from a JSON file, then overridden by the `CUE_API_BASE_URL` and
//! `CUE_API_TOKEN` environment variables. The token is never written to logs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};

pub const API_BASE_URL_ENV: &str = "CUE_API_BASE_URL";
pub const API_TOKEN_ENV: &str = "CUE_API_TOKEN";

#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("api_base_url", &self.api_base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl RemoteConfig {
    /// Read a config file; a missing file yields an empty config
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    /// Overlay environment variables on top of this config
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(API_BASE_URL_ENV).ok(),
            std::env::var(API_TOKEN_ENV).ok(),
        )
    }

    /// Overlay explicit values; blank values are ignored
    #[must_use]
    pub fn with_overrides(mut self, api_base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = normalize_text_option(api_base_url) {
            self.api_base_url = Some(url);
        }
        if let Some(token) = normalize_text_option(token) {
            self.access_token = Some(token);
        }
        self.normalize();
        self
    }

    /// Validated base URL without a trailing slash
    pub fn api_base_url(&self) -> Result<String, String> {
        let url = normalize_text_option(self.api_base_url.clone()).ok_or_else(|| {
            format!("remote API base URL is not configured (set {API_BASE_URL_ENV})")
        })?;
        if !is_http_url(&url) {
            return Err("remote API base URL must include http:// or https://".to_string());
        }
        Ok(url.trim_end_matches('/').to_string())
    }

    pub fn is_configured(&self) -> bool {
        self.api_base_url().is_ok()
    }

    fn normalize(&mut self) {
        self.api_base_url = normalize_text_option(self.api_base_url.take());
        self.access_token = normalize_text_option(self.access_token.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn api_base_url_requires_scheme_and_trims_slash() {
        let config = RemoteConfig::default()
            .with_overrides(Some(" https://api.example.com/ ".to_string()), None);
        assert_eq!(config.api_base_url().unwrap(), "https://api.example.com");

        let bad = RemoteConfig::default().with_overrides(Some("api.example.com".to_string()), None);
        assert!(bad.api_base_url().is_err());
        assert!(!RemoteConfig::default().is_configured());
    }

    #[test]
    fn overrides_ignore_blank_values() {
        let config = RemoteConfig {
            api_base_url: Some("https://a.example.com".to_string()),
            access_token: Some("secret".to_string()),
        }
        .with_overrides(Some("  ".to_string()), Some(String::new()));
        assert_eq!(config.api_base_url.as_deref(), Some("https://a.example.com"));
        assert_eq!(config.access_token.as_deref(), Some("secret"));
    }

    #[test]
    fn debug_redacts_token() {
        let config = RemoteConfig {
            api_base_url: None,
            access_token: Some("secret".to_string()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn load_from_path_rejects_unknown_fields() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("remote.json");
        std::fs::write(&path, r#"{"api_base_url":"https://x.example.com","extra":1}"#).unwrap();

        let error = RemoteConfig::load_from_path(&path).unwrap_err();
        assert!(error.contains("unknown field"));

        let missing = RemoteConfig::load_from_path(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(missing, RemoteConfig::default());
    }
}
