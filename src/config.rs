use crate::relay::error::RelayError;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://chatapi.akash.network/api/v1";
pub const DEFAULT_MODEL: &str = "DeepSeek-R1-0528";
pub const DEFAULT_IMAGE_API_URL: &str = "https://image.pollinations.ai";
pub const DEFAULT_IMAGE_MODEL: &str = "flux";

/// Server settings loaded once at startup from an optional TOML file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_request_body_limit")]
    pub request_body_limit_bytes: usize,
    #[serde(default = "default_graceful_shutdown_seconds")]
    pub graceful_shutdown_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            request_body_limit_bytes: default_request_body_limit(),
            graceful_shutdown_seconds: default_graceful_shutdown_seconds(),
        }
    }
}

impl ServerConfig {
    pub fn graceful_shutdown_duration(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_seconds)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8111".to_string()
}
fn default_request_body_limit() -> usize {
    262_144
}
fn default_graceful_shutdown_seconds() -> u64 {
    10
}

pub fn load_server_config(path: Option<&str>) -> Result<ServerConfig> {
    let path = path.unwrap_or("config.toml");
    match std::fs::read_to_string(path) {
        Ok(config_str) => {
            let config: FileConfig = toml::from_str(&config_str)
                .with_context(|| format!("Failed to parse {}", path))?;
            Ok(config.server)
        }
        Err(_) => Ok(ServerConfig::default()),
    }
}

/// Settings for the upstream AI chat API, resolved from the process
/// environment on every request rather than cached at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub default_model: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::resolve(env_var)
    }

    /// Resolve from an arbitrary key/value lookup. An empty value counts
    /// as unset, matching how a blank environment variable behaves.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            base_url: get("AI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: get("AI_API_KEY").map(SecretString::new),
            default_model: get("AI_DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn bearer_token(&self) -> Result<&str, RelayError> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret().as_str())
            .ok_or(RelayError::ApiKeyMissing)
    }
}

/// Settings for the upstream image API. The key and referrer are both
/// optional; the image endpoint works unauthenticated.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub referrer: Option<String>,
    pub default_model: String,
}

impl ImageConfig {
    pub fn from_env() -> Self {
        Self::resolve(env_var)
    }

    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            base_url: get("IMAGE_API_URL").unwrap_or_else(|| DEFAULT_IMAGE_API_URL.to_string()),
            api_key: get("IMAGE_API_KEY").map(SecretString::new),
            referrer: get("IMAGE_REFERRER"),
            default_model: get("IMAGE_DEFAULT_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
        }
    }
}

/// Everything a single request needs from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub image: ImageConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            image: ImageConfig::from_env(),
        }
    }
}

/// Capability handed to the handlers for resolving configuration. The
/// production resolver re-reads the environment on every call; tests
/// substitute a closure returning a fixed value.
pub type ConfigResolver = Arc<dyn Fn() -> AppConfig + Send + Sync>;

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::resolve(|_| None);

        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert!(!config.has_api_key());
        assert!(config.bearer_token().is_err());
    }

    #[test]
    fn test_api_config_overrides() {
        let config = ApiConfig::resolve(lookup_from(&[
            ("AI_API_URL", "https://example.com/v1"),
            ("AI_API_KEY", "sk-test-123"),
            ("AI_DEFAULT_MODEL", "Meta-Llama-3-1-8B"),
        ]));

        assert_eq!(config.base_url, "https://example.com/v1");
        assert_eq!(config.default_model, "Meta-Llama-3-1-8B");
        assert!(config.has_api_key());
        assert_eq!(config.bearer_token().unwrap(), "sk-test-123");
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = ApiConfig::resolve(lookup_from(&[
            ("AI_API_URL", ""),
            ("AI_API_KEY", ""),
            ("AI_DEFAULT_MODEL", ""),
        ]));

        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_image_config_defaults_and_overrides() {
        let config = ImageConfig::resolve(|_| None);
        assert_eq!(config.base_url, DEFAULT_IMAGE_API_URL);
        assert_eq!(config.default_model, DEFAULT_IMAGE_MODEL);
        assert!(config.api_key.is_none());
        assert!(config.referrer.is_none());

        let config = ImageConfig::resolve(lookup_from(&[
            ("IMAGE_REFERRER", "https://myapp.example.com"),
            ("IMAGE_DEFAULT_MODEL", "turbo"),
        ]));
        assert_eq!(
            config.referrer.as_deref(),
            Some("https://myapp.example.com")
        );
        assert_eq!(config.default_model, "turbo");
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        // The only test that touches real environment variables; both
        // assertions stay in one function so they cannot race.
        std::env::remove_var("AI_DEFAULT_MODEL");
        assert_eq!(ApiConfig::from_env().default_model, DEFAULT_MODEL);

        std::env::set_var("AI_DEFAULT_MODEL", "Qwen3-235B-A22B");
        assert_eq!(ApiConfig::from_env().default_model, "Qwen3-235B-A22B");
        std::env::remove_var("AI_DEFAULT_MODEL");
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8111");
        assert_eq!(config.request_body_limit_bytes, 262_144);
        assert_eq!(config.graceful_shutdown_duration(), Duration::from_secs(10));
    }
}
