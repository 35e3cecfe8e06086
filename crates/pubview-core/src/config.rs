use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::endpoint::{DEFAULT_BASE_URL, EndpointError, PublicationEndpoint};
use crate::error::ErrorCode;
use crate::fetch::credentials::CredentialScheme;
use crate::fetch::transport::TransportSettings;
use crate::fetch::{DEFAULT_BACKOFF, DEFAULT_MAX_RETRIES, RetryPolicy};
use crate::present::TimeZoneMode;

pub const PROJECT_CONFIG_PATH: &str = ".pubview/config.toml";
pub const BASE_URL_ENV: &str = "PUBVIEW_BASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Missing(_) | Self::Read { .. } => ErrorCode::InputReadFailed,
            Self::Parse { .. } => ErrorCode::ConfigParseError,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: u8,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_transport_redirects")]
    pub transport_redirects: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            transport_redirects: default_transport_redirects(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub scheme: CredentialScheme,
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            scheme: CredentialScheme::default(),
            token_env: default_token_env(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub timezone: TimeZoneMode,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            dir: None,
        }
    }
}

impl ViewerConfig {
    /// # Errors
    ///
    /// Propagates base URL or api-version validation failures.
    pub fn endpoint(&self) -> Result<PublicationEndpoint, EndpointError> {
        PublicationEndpoint::new(&self.endpoint.base_url, self.endpoint.api_version)
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            backoff: Duration::from_millis(self.retry.backoff_ms),
        }
    }

    #[must_use]
    pub const fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            redirects: self.retry.transport_redirects,
            timeout: Duration::from_secs(self.retry.timeout_secs),
        }
    }

    /// Token read from the env var named by `credentials.token_env`.
    #[must_use]
    pub fn credential_token(&self) -> Option<String> {
        env::var(&self.credentials.token_env).ok()
    }

    /// Explicit `store.dir`, else `<cache dir>/pubview`.
    #[must_use]
    pub fn store_dir(&self) -> Option<PathBuf> {
        self.store
            .dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("pubview")))
    }
}

/// Resolve the effective configuration.
///
/// Lookup order: `explicit` (must exist), `<project_root>/.pubview/config.toml`,
/// `<config dir>/pubview/config.toml`, then defaults. Only the first file
/// found is read. `PUBVIEW_BASE_URL` overrides the endpoint afterwards.
///
/// # Errors
///
/// Fails when an explicit path is missing or a found file is unreadable or
/// malformed.
pub fn load_config(explicit: Option<&Path>, project_root: &Path) -> Result<ViewerConfig, ConfigError> {
    let config = match explicit {
        Some(path) if !path.exists() => return Err(ConfigError::Missing(path.to_path_buf())),
        Some(path) => read_config(path)?,
        None => {
            let user_path = dirs::config_dir().map(|dir| dir.join("pubview/config.toml"));
            let candidates = [Some(project_root.join(PROJECT_CONFIG_PATH)), user_path];
            match candidates.into_iter().flatten().find(|path| path.exists()) {
                Some(path) => read_config(&path)?,
                None => ViewerConfig::default(),
            }
        }
    };

    Ok(apply_env_overrides(config, env::var(BASE_URL_ENV).ok()))
}

fn read_config(path: &Path) -> Result<ViewerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str::<ViewerConfig>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env_overrides(mut config: ViewerConfig, base_url: Option<String>) -> ViewerConfig {
    if let Some(base_url) = base_url.filter(|value| !value.trim().is_empty()) {
        config.endpoint.base_url = base_url;
    }
    config
}

const fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_api_version() -> u8 {
    1
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

#[allow(clippy::cast_possible_truncation)]
const fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF.as_millis() as u64
}

const fn default_transport_redirects() -> u32 {
    0
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_token_env() -> String {
    "PUBVIEW_TOKEN".to_string()
}
