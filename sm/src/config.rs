//! Server configuration types and loading
//!
//! Configuration comes from an optional YAML file, then environment
//! variables override individual values. Everything is resolved once at
//! startup and treated as immutable afterwards.

use eyre::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const API_KEY_MIN_LEN: usize = 32;

/// Main server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SwipeOne API access
    pub api: ApiConfig,

    /// Workspace fallback
    pub workspace: WorkspaceConfig,

    /// Rate limiting
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitSettings,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Resolve only the log level (used before logging is set up)
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        std::env::var("LOG_LEVEL")
            .ok()
            .filter(|level| !level.is_empty())
            .or_else(|| Self::load_file_chain(config_path).ok().and_then(|c| c.log_level))
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .swipeone-mcp.yml
        let local_config = PathBuf::from(".swipeone-mcp.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/swipeone-mcp/swipeone-mcp.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("swipeone-mcp").join("swipeone-mcp.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Override values from environment variables
    ///
    /// `lookup` is `std::env::var` in production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Set-but-empty variables count as unset
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(key) = lookup(&self.api.api_key_env) {
            self.api.api_key = Some(key);
        }
        if let Some(url) = lookup("SWIPEONE_API_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(timeout) = lookup("API_TIMEOUT").and_then(|t| t.trim().parse().ok()) {
            self.api.timeout_ms = timeout;
        }
        if let Some(id) = lookup("DEFAULT_WORKSPACE_ID") {
            self.workspace.default_id = Some(id);
        }
        if let Some(flag) = lookup("ENABLE_RATE_LIMITING") {
            self.rate_limit.enabled = parse_flag(&flag);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = Some(level);
        }
    }

    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        let Some(api_key) = self.api.api_key.as_deref() else {
            return Err(eyre::eyre!(
                "SwipeOne API key not found. Set the {} environment variable.",
                self.api.api_key_env
            ));
        };

        if api_key.len() < API_KEY_MIN_LEN {
            return Err(eyre::eyre!("API key must be at least {API_KEY_MIN_LEN} characters"));
        }

        let key_chars = Regex::new(r"^[A-Za-z0-9_-]+$").context("Failed to compile API key pattern")?;
        if !key_chars.is_match(api_key) {
            return Err(eyre::eyre!("API key contains invalid characters"));
        }

        reqwest::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api.base_url))?;

        if self.api.timeout_ms == 0 {
            return Err(eyre::eyre!("API timeout must be greater than zero"));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

/// SwipeOne API access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API key (normally supplied through `api-key-env`)
    #[serde(rename = "api-key", skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.swipeone.com/api".to_string(),
            api_key_env: "SWIPEONE_API_KEY".to_string(),
            api_key: None,
            timeout_ms: 30_000,
        }
    }
}

/// Workspace fallback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace used when a tool call omits `workspaceId`
    #[serde(rename = "default-id")]
    pub default_id: Option<String>,
}

/// Rate limiting switch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}
