//! Configuration management for contactbook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::query::{GroupFilter, SortOption};
use crate::store::{IdPolicy, DEFAULT_RECORDS_KEY};
use crate::transfer::DEFAULT_SHEET_NAME;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "contactbook";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "contacts.db";

/// Environment variable prefix.
const ENV_PREFIX: &str = "CONTACTBOOK_";

/// Longest worksheet name a workbook accepts.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters a worksheet name may not contain.
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CONTACTBOOK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/contactbook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Login credentials.
    pub auth: AuthConfig,
    /// Initial list view settings.
    pub view: ViewConfig,
    /// Import and export settings.
    pub transfer: TransferConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/contactbook/contacts.db`
    pub database_path: Option<PathBuf>,
    /// Key the record set is stored under.
    pub records_key: String,
}

/// The single accepted credential pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Login email.
    pub email: String,
    /// Login password.
    pub password: String,
}

/// Initial list view settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Sort order on startup.
    pub default_sort: SortOption,
    /// Group filter on startup.
    pub default_group: GroupFilter,
}

/// Import and export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// How imported records get their ids.
    pub id_policy: IdPolicy,
    /// Reject imported rows with an empty name or phone.
    pub strict_import: bool,
    /// Worksheet name for XLSX exports.
    pub sheet_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            records_key: DEFAULT_RECORDS_KEY.to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: "test@example.com".to_string(),
            password: "password".to_string(),
        }
    }
}

impl AuthConfig {
    /// Whether the given pair matches exactly.
    #[must_use]
    pub fn matches(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            id_policy: IdPolicy::default(),
            strict_import: false,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing config file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

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
        if self.storage.records_key.trim().is_empty() {
            return Err(invalid("storage.records_key must not be empty"));
        }

        if self.auth.email.trim().is_empty() {
            return Err(invalid("auth.email must not be empty"));
        }

        let sheet = &self.transfer.sheet_name;
        if sheet.is_empty() {
            return Err(invalid("transfer.sheet_name must not be empty"));
        }
        if sheet.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(invalid(format!(
                "transfer.sheet_name '{sheet}' is longer than {MAX_SHEET_NAME_LEN} characters"
            )));
        }
        if let Some(c) = sheet.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
            return Err(invalid(format!(
                "transfer.sheet_name '{sheet}' contains forbidden character '{c}'"
            )));
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
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}
