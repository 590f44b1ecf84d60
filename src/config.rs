use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides `registry.api_key` at load time.
pub const API_KEY_ENV: &str = "CONSTRUYO_REGISTRY_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub registry: RegistryConfig,

    pub cache: CacheConfig,

    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/construyo.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,

    /// Prefer setting this through `CONSTRUYO_REGISTRY_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub request_timeout_seconds: u32,

    pub user_agent: String,

    /// Limit used when the caller does not give one.
    pub default_limit: u32,

    /// Hard cap on results per search.
    pub max_limit: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.planit.org.uk/".to_string(),
            api_key: None,
            request_timeout_seconds: 30,
            user_agent: "Construyo/1.0".to_string(),
            default_limit: 100,
            max_limit: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve the latest snapshot instead of calling the registry when it is
    /// younger than this. 0 disables the window.
    pub freshness_seconds: u64,

    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Snapshots kept per key by `construyo prune`. Unset keeps everything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_records_per_key: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub timeout_seconds: u32,

    pub user_agent: String,

    /// Used by the CLI when `--webhook` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_url: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: "Construyo/1.0".to_string(),
            default_url: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.registry.api_key = Some(key);
        }

        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("construyo").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".construyo").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.registry.base_url.trim().is_empty() {
            anyhow::bail!("Registry base URL cannot be empty");
        }

        url::Url::parse(&self.registry.base_url).context("Invalid registry base URL")?;

        if self.registry.max_limit == 0 {
            anyhow::bail!("registry.max_limit must be > 0");
        }

        if self.registry.default_limit == 0 || self.registry.default_limit > self.registry.max_limit
        {
            anyhow::bail!(
                "registry.default_limit must be between 1 and max_limit ({})",
                self.registry.max_limit
            );
        }

        if !matches!(self.general.log_format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "general.log_format must be 'pretty' or 'json', got '{}'",
                self.general.log_format
            );
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("general.min_db_connections cannot exceed max_db_connections");
        }

        Ok(())
    }
}
