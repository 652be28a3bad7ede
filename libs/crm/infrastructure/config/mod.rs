use crate::infrastructure::cache::{CacheTtls, MAX_DURATION_SECS};
use crate::infrastructure::client::WebhookEndpoints;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Dashboard client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub base_url: String,
    #[serde(default = "default_auth_path")]
    pub auth_path: String,
    #[serde(default = "default_leads_path")]
    pub leads_path: String,
    #[serde(default = "default_tasks_path")]
    pub tasks_path: String,
    #[serde(default = "default_reports_path")]
    pub reports_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl WebhookConfig {
    pub fn endpoints(&self) -> WebhookEndpoints {
        let base = self.base_url.trim_end_matches('/');
        let join = |path: &str| format!("{}/{}", base, path.trim_start_matches('/'));

        WebhookEndpoints {
            auth: join(&self.auth_path),
            leads: join(&self.leads_path),
            tasks: join(&self.tasks_path),
            reports: join(&self.reports_path),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub ttls: CacheTtls,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            ttls: CacheTtls::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_leads_interval")]
    pub leads_interval_secs: u64,
    #[serde(default = "default_tasks_interval")]
    pub tasks_interval_secs: u64,
    /// How long a new/modified row stays highlighted
    #[serde(default = "default_highlight_secs")]
    pub highlight_secs: u64,
    /// Minimum gap between two manual refreshes
    #[serde(default = "default_refresh_cooldown")]
    pub refresh_cooldown_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            leads_interval_secs: default_leads_interval(),
            tasks_interval_secs: default_tasks_interval(),
            highlight_secs: default_highlight_secs(),
            refresh_cooldown_secs: default_refresh_cooldown(),
        }
    }
}

impl PollingConfig {
    pub fn highlight(&self) -> chrono::Duration {
        bounded_seconds(self.highlight_secs)
    }

    pub fn refresh_cooldown(&self) -> chrono::Duration {
        bounded_seconds(self.refresh_cooldown_secs)
    }
}

fn bounded_seconds(secs: u64) -> chrono::Duration {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(MAX_DURATION_SECS);
    chrono::Duration::seconds(secs)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_auth_path() -> String {
    "webhook/auth".to_string()
}

fn default_leads_path() -> String {
    "webhook/leads".to_string()
}

fn default_tasks_path() -> String {
    "webhook/tasks".to_string()
}

fn default_reports_path() -> String {
    "webhook/reports".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/crm_cache.json")
}

fn default_leads_interval() -> u64 {
    30
}

fn default_tasks_interval() -> u64 {
    60
}

fn default_highlight_secs() -> u64 {
    5
}

fn default_refresh_cooldown() -> u64 {
    30
}

impl CrmConfig {
    /// Load configuration from YAML file
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        Self::from_yaml(&yaml_content)
    }

    /// Parse YAML, apply environment overrides and validate
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config: CrmConfig = serde_yaml::from_str(yaml)?;

        // Override base URL from environment if present
        if let Ok(base_url) = std::env::var("CRM_WEBHOOK_BASE_URL") {
            info!("Overriding webhook base URL from environment variable");
            config.webhook.base_url = base_url;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.webhook.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "webhook.base_url must not be empty".to_string(),
            ));
        }

        if !self.webhook.base_url.starts_with("http://")
            && !self.webhook.base_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(
                "webhook.base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.webhook.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "webhook.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.polling.leads_interval_secs == 0 || self.polling.tasks_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "polling intervals must be greater than 0".to_string(),
            ));
        }

        let max = MAX_DURATION_SECS as u64;
        let polling = [
            ("leads_interval_secs", self.polling.leads_interval_secs),
            ("tasks_interval_secs", self.polling.tasks_interval_secs),
            ("highlight_secs", self.polling.highlight_secs),
            ("refresh_cooldown_secs", self.polling.refresh_cooldown_secs),
        ];
        if let Some((name, _)) = polling.iter().find(|(_, secs)| *secs > max) {
            return Err(ConfigError::ValidationError(format!(
                "polling.{} must be at most {} seconds",
                name, max
            )));
        }

        if !self.cache.ttls.all_in_range() {
            return Err(ConfigError::ValidationError(format!(
                "cache ttls must be between 1 and {} seconds",
                max
            )));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Webhook base url: {}", self.webhook.base_url);
        info!("  Request timeout: {} seconds", self.webhook.timeout_secs);
        info!("  Cache file: {:?}", self.cache.path);
        info!(
            "  Poll intervals: leads {}s, tasks {}s",
            self.polling.leads_interval_secs, self.polling.tasks_interval_secs
        );
        info!("  Refresh cooldown: {} seconds", self.polling.refresh_cooldown_secs);
        info!("  Log level: {}", self.log_level);
    }
}

/// Login credentials from `.env` (never stored in YAML)
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let email = std::env::var("CRM_EMAIL")
            .map_err(|_| ConfigError::EnvVarMissing("CRM_EMAIL".to_string()))?;
        let password = std::env::var("CRM_PASSWORD")
            .map_err(|_| ConfigError::EnvVarMissing("CRM_PASSWORD".to_string()))?;

        Ok(Self { email, password })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
