//! # Configuration
//!
//! Settings collapse in one direction:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.supportchat/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_BASE_URL;
use crate::core::validation::DEFAULT_EMAIL_DOMAIN;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SupportChatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_file: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    pub email_domain: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const APP_DIR: &str = ".supportchat";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_LOG_FILE: &str = "supportchat.log";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

pub const ENV_BASE_URL: &str = "SUPPORTCHAT_BASE_URL";
pub const ENV_EMAIL_DOMAIN: &str = "SUPPORTCHAT_EMAIL_DOMAIN";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Support Chat Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# base_url = "http://localhost:8000"   # Or set SUPPORTCHAT_BASE_URL

# [auth]
# email_domain = "binus.ac.id"         # Or set SUPPORTCHAT_EMAIL_DOMAIN

# [general]
# log_file = "supportchat.log"
# log_level = "debug"                  # "off", "error", "warn", "info", "debug", "trace"
"#;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub email_domain: String,
    pub log_file: String,
    pub log_level: LevelFilter,
}

/// Values given on the command line. `None` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub email_domain: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// `~/.supportchat`, home of the config file and the stored token.
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DIR))
}

/// Returns the path to `~/.supportchat/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Load config from `~/.supportchat/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `SupportChatConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<SupportChatConfig, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            warn!("Could not determine home directory, using default config");
            Ok(SupportChatConfig::default())
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<SupportChatConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(SupportChatConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: SupportChatConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_TEMPLATE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve against the process environment.
pub fn resolve(config: &SupportChatConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Resolve the final config by collapsing: defaults → config file → env → CLI.
/// Blank values at any layer count as unset.
pub fn resolve_with_env(
    config: &SupportChatConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let base_url = first_set([
        cli.base_url.clone(),
        env(ENV_BASE_URL),
        config.server.base_url.clone(),
    ])
    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let email_domain = first_set([
        cli.email_domain.clone(),
        env(ENV_EMAIL_DOMAIN),
        config.auth.email_domain.clone(),
    ])
    .unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string());

    let log_file = first_set([config.general.log_file.clone()])
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

    let log_level = match config.general.log_level.as_deref() {
        Some(level) => level.trim().parse().unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using {}", level, DEFAULT_LOG_LEVEL);
            DEFAULT_LOG_LEVEL
        }),
        None => DEFAULT_LOG_LEVEL,
    };

    ResolvedConfig {
        base_url,
        email_domain,
        log_file,
        log_level,
    }
}

fn first_set<const N: usize>(layers: [Option<String>; N]) -> Option<String> {
    layers
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
