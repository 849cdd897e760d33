use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub store: StoreConfig,

    pub search: SearchConfig,

    pub accounts: AccountsConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the hosted row store, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Anonymous API key sent as `apikey` and bearer token.
    pub anon_key: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,

    /// Storage bucket that receives application attachments.
    pub attachment_bucket: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: "change-me".to_string(),
            request_timeout_seconds: 30,
            attachment_bucket: "applications".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub results_per_page: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_per_page: constants::DEFAULT_RESULTS_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// The one domain classified as a company account. Every other
    /// domain signs up as a student.
    pub company_domain: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            company_domain: constants::DEFAULT_COMPANY_DOMAIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            store: StoreConfig::default(),
            search: SearchConfig::default(),
            accounts: AccountsConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
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
            paths.push(config_dir.join("oppboard").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".oppboard").join("config.toml"));
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
        if self.store.url.is_empty() {
            anyhow::bail!("Store URL cannot be empty");
        }

        if self.search.results_per_page == 0 {
            anyhow::bail!("Results per page must be > 0");
        }

        if self.accounts.company_domain.is_empty() {
            anyhow::bail!("Company domain cannot be empty");
        }

        Ok(())
    }
}
