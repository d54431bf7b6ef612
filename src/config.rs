//! Configuration loading and validation.
//!
//! casemail reads a single human-owned `config.toml`. Every section is
//! optional and falls back to defaults, so an empty file is a valid config.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "CASEMAIL_CONFIG";

/// Environment variable overriding `[database].path`.
pub const DATABASE_PATH_ENV: &str = "CASEMAIL_DATABASE";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database location and pool sizing.
    pub database: DatabaseConfig,

    /// Messaging behaviour.
    pub messaging: MessagingConfig,

    /// Log output.
    pub logging: LoggingConfig,
}

/// Database settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file. Relative paths resolve against the
    /// config directory.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// What the contact directory does with a role string it does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRolePolicy {
    /// Treat the viewer as an administrator (everyone is visible).
    #[default]
    Admin,
    /// Show an empty directory.
    Deny,
}

/// Messaging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    /// Preview length for the last message shown on a contact.
    #[serde(default = "default_contact_preview_chars")]
    pub contact_preview_chars: usize,

    /// Preview length for inbox and sent listings.
    #[serde(default = "default_list_preview_chars")]
    pub list_preview_chars: usize,

    /// Longest message body accepted by send.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Directory behaviour for unrecognised roles.
    #[serde(default)]
    pub unknown_role: UnknownRolePolicy,

    /// Reject sends to users outside the sender's contact directory.
    #[serde(default)]
    pub enforce_send_eligibility: bool,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            contact_preview_chars: default_contact_preview_chars(),
            list_preview_chars: default_list_preview_chars(),
            max_message_chars: default_max_message_chars(),
            unknown_role: UnknownRolePolicy::default(),
            enforce_send_eligibility: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Directory for rotated JSON log files. When unset only stderr is used.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

// Default value functions for serde

fn default_database_path() -> PathBuf {
    PathBuf::from("casemail.db")
}
fn default_max_connections() -> u32 {
    4
}
fn default_contact_preview_chars() -> usize {
    60
}
fn default_list_preview_chars() -> usize {
    80
}
fn default_max_message_chars() -> usize {
    10_000
}

impl Config {
    /// Apply environment variable overrides.
    ///
    /// Takes a resolver function for testability (avoids `set_var` in tests).
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(path) = env(DATABASE_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.database.path = PathBuf::from(path);
        }
    }

    /// Resolve a relative database path against `base`.
    pub fn resolve_database_path(&mut self, base: &Path) {
        if self.database.path.is_relative() {
            self.database.path = base.join(&self.database.path);
        }
    }
}

/// Load the config from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

/// Load the config from a TOML file, falling back to defaults when the file
/// does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_or_default(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file found, using defaults");
        return Ok(Config::default());
    }
    tracing::info!(path = %path.display(), "loading config from file");
    load_config(path)
}

/// Resolve the default config directory (`~/.casemail/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".casemail"))
}

/// Resolve the config file path: `$CASEMAIL_CONFIG`, else `config.toml` in
/// the config directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<PathBuf> {
    if let Some(path) = env(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join("config.toml"))
}
