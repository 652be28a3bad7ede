//! CLI utilities for binaries
//!
//! Handles configuration path resolution and command line flags
//! for all binary executables.

use std::path::PathBuf;

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Dashboard client configuration (crm_config.yaml)
    Crm,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Crm => "config/crm_config.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        "CRM_CONFIG_PATH"
    }
}

/// Load configuration path from environment or use default
///
/// # Examples
/// ```
/// use crm_dashboard::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Crm);
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// Flags shared by the dashboard binaries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    /// Skip the cache on the first fetch
    pub force: bool,
    /// Forget the saved session before starting
    pub logout: bool,
    /// Poll leads only
    pub leads_only: bool,
}

impl CliArgs {
    pub fn parse(args: &[String]) -> Self {
        let mut parsed = Self::default();
        for arg in args {
            match arg.as_str() {
                "--force" | "-f" => parsed.force = true,
                "--logout" => parsed.logout = true,
                "--leads-only" => parsed.leads_only = true,
                other => tracing::warn!("Ignoring unknown argument: {}", other),
            }
        }
        parsed
    }
}
