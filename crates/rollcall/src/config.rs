//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::ListOrder;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollcall";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "students.db";

/// Prefix for environment overrides. Nested keys use `__`,
/// e.g. `ROLLCALL__SERVER__BIND_ADDR`.
const ENV_PREFIX: &str = "ROLLCALL__";

/// Remote avatar catalog used when none is configured.
pub const DEFAULT_REMOTE_BASE_URL: &str =
    "https://github.com/UXHERI/students-app/blob/main/profile_icons";

/// Avatar returned when a gender has no pool and no placeholder.
pub const DEFAULT_FALLBACK_AVATAR: &str = "https://cdn-icons-png.flaticon.com/512/3135/3135768.png";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLCALL__`)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Web server configuration.
    pub server: ServerConfig,
    /// Avatar pool configuration.
    pub avatars: AvatarConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/rollcall/students.db`
    pub database_path: Option<PathBuf>,
    /// Ordering of the student list.
    pub list_order: ListOrder,
}

/// Web server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Key used to sign flash notices. A random per-process key is used
    /// when unset.
    pub secret_key: Option<String>,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

/// Where avatars come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarSource {
    /// Numbered images hosted at `remote_base_url`.
    #[default]
    Remote,
    /// Image files found under `local_dir` at startup.
    Local,
}

/// Avatar pool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Which catalog to use.
    pub source: AvatarSource,
    /// Base URL of the remote catalog.
    pub remote_base_url: String,
    /// Number of male images in the remote catalog.
    pub male_count: u32,
    /// Number of female images in the remote catalog.
    pub female_count: u32,
    /// Directory holding `Male/` and `Female/` image folders.
    pub local_dir: PathBuf,
    /// URL prefix under which `local_dir` is served.
    pub url_prefix: String,
    /// Reference used when a gender has no avatar at all.
    pub fallback: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            secret_key: None,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            source: AvatarSource::Remote,
            remote_base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            male_count: 49,
            female_count: 30,
            local_dir: PathBuf::from("static/profile_icons"),
            url_prefix: "/static/profile_icons".to_string(),
            fallback: DEFAULT_FALLBACK_AVATAR.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `ROLLCALL__`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Self::figment(config_file))
    }

    /// The provider stack used by [`Config::load_from`].
    #[must_use]
    pub fn figment(config_file: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from `figment`.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self
            .server
            .secret_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "secret_key must not be blank".to_string(),
            });
        }

        if self.avatars.fallback.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "avatars.fallback must not be empty".to_string(),
            });
        }

        if self.avatars.source == AvatarSource::Local && self.avatars.url_prefix.trim().is_empty()
        {
            return Err(Error::ConfigValidation {
                message: "avatars.url_prefix must not be empty for local avatars".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not a valid socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_addr
            .parse()
            .map_err(|_| Error::ConfigValidation {
                message: format!("invalid bind_addr: {}", self.server.bind_addr),
            })
    }
}
