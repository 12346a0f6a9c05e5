//! # Application Configuration
//!
//! Settings loaded once at startup. Read-only afterwards.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KEYSTONE_DB_PATH=/srv/keystone/keystone.db                         │
//! │     KEYSTONE_DEFAULT_MARKUP=40                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, else the platform config dir:                     │
//! │     ~/.config/keystone/keystone.toml (Linux)                           │
//! │     ~/Library/Application Support/com.keystone.backoffice/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     35% markup, full-amount bulk payments, platform data dir db        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # keystone.toml
//! [database]
//! path = "/srv/keystone/keystone.db"
//! max_connections = 5
//!
//! [pricing]
//! default_markup_percentage = 35.0
//!
//! [payments]
//! bulk_allocation = "full_amount_each"  # full_amount_each | proportional
//!
//! [business]
//! name = "Ridgeline Supply"
//! currency_symbol = "$"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use keystone_core::allocation::AllocationPolicy;
use keystone_core::pricing::PricingPolicy;
use keystone_core::DEFAULT_MARKUP_PERCENTAGE;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "keystone.toml";
const DATABASE_FILE_NAME: &str = "keystone.db";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine a data directory; set KEYSTONE_DB_PATH or [database] path")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. `None` means `<platform data dir>/keystone.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Markup auto-cost assumes when the customer has no matching rule.
    #[serde(default = "default_markup")]
    pub default_markup_percentage: f64,
}

fn default_markup() -> f64 {
    DEFAULT_MARKUP_PERCENTAGE
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            default_markup_percentage: default_markup(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSettings {
    #[serde(default)]
    pub bulk_allocation: AllocationPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSettings {
    #[serde(default = "default_business_name")]
    pub name: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_business_name() -> String {
    "Keystone Back Office".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for BusinessSettings {
    fn default() -> Self {
        BusinessSettings {
            name: default_business_name(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub payments: PaymentSettings,

    #[serde(default)]
    pub business: BusinessSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. `config_path`, or `keystone.toml` in the platform config dir
    /// 3. Environment variables
    ///
    /// An explicit `config_path` that does not exist is an error; a missing
    /// file in the platform dir is not.
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let markup = self.pricing.default_markup_percentage;
        if !markup.is_finite() || markup <= -100.0 {
            return Err(ConfigError::Invalid(format!(
                "default_markup_percentage must be greater than -100, got {}",
                markup
            )));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.business.name.trim().is_empty() {
            return Err(ConfigError::Invalid("business name cannot be empty".into()));
        }

        Ok(())
    }

    /// Applies `KEYSTONE_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("KEYSTONE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(markup) = lookup("KEYSTONE_DEFAULT_MARKUP") {
            match markup.trim().trim_end_matches('%').parse::<f64>() {
                Ok(m) => self.pricing.default_markup_percentage = m,
                Err(_) => warn!(value = %markup, "Ignoring unparseable KEYSTONE_DEFAULT_MARKUP"),
            }
        }

        if let Some(policy) = lookup("KEYSTONE_BULK_ALLOCATION") {
            match policy.parse() {
                Ok(parsed) => {
                    debug!(policy = %policy, "Overriding bulk allocation from environment");
                    self.payments.bulk_allocation = parsed;
                }
                Err(e) => warn!(error = %e, "Ignoring KEYSTONE_BULK_ALLOCATION"),
            }
        }

        if let Some(name) = lookup("KEYSTONE_BUSINESS_NAME") {
            self.business.name = name;
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "keystone", "backoffice")
    }

    /// `keystone.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// The configured database path, else `keystone.db` in the platform
    /// data directory (created if missing).
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Read {
            path: data_dir.to_path_buf(),
            source,
        })?;
        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            default_markup_percentage: self.pricing.default_markup_percentage,
        }
    }

    pub fn allocation_policy(&self) -> AllocationPolicy {
        self.payments.bulk_allocation
    }

    /// Formats a cent amount with the configured currency symbol.
    pub fn format_currency(&self, cents: i64) -> String {
        format!(
            "{}{}{}.{:02}",
            if cents < 0 { "-" } else { "" },
            self.business.currency_symbol,
            (cents / 100).abs(),
            (cents % 100).abs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.pricing.default_markup_percentage, 35.0);
        assert_eq!(config.allocation_policy(), AllocationPolicy::FullAmountEach);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [payments]
            bulk_allocation = "proportional"

            [business]
            name = "Ridgeline Supply"
            "#,
        )
        .unwrap();

        assert_eq!(config.allocation_policy(), AllocationPolicy::Proportional);
        assert_eq!(config.business.name, "Ridgeline Supply");
        assert_eq!(config.business.currency_symbol, "$");
        assert_eq!(config.pricing.default_markup_percentage, 35.0);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_unknown_policy_is_a_parse_error() {
        let err = AppConfig::from_toml("[payments]\nbulk_allocation = \"split\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[
            ("KEYSTONE_DB_PATH", "/tmp/ks.db"),
            ("KEYSTONE_DEFAULT_MARKUP", "40%"),
            ("KEYSTONE_BULK_ALLOCATION", "proportional"),
            ("KEYSTONE_BUSINESS_NAME", "Harbor Lumber"),
        ]));

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/ks.db")));
        assert_eq!(config.pricing_policy().default_markup_percentage, 40.0);
        assert_eq!(config.allocation_policy(), AllocationPolicy::Proportional);
        assert_eq!(config.business.name, "Harbor Lumber");
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/ks.db"));
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[
            ("KEYSTONE_DEFAULT_MARKUP", "lots"),
            ("KEYSTONE_BULK_ALLOCATION", "evenly"),
        ]));
        assert_eq!(config.pricing.default_markup_percentage, 35.0);
        assert_eq!(config.allocation_policy(), AllocationPolicy::FullAmountEach);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.pricing.default_markup_percentage = -100.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.pricing.default_markup_percentage = f64::NAN;
        assert!(config.validate().is_err());

        config.pricing.default_markup_percentage = -20.0;
        assert!(config.validate().is_ok());

        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/keystone.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_format_currency() {
        let mut config = AppConfig::default();
        assert_eq!(config.format_currency(1234), "$12.34");
        assert_eq!(config.format_currency(-5), "-$0.05");
        config.business.currency_symbol = "€".to_string();
        assert_eq!(config.format_currency(100000), "€1000.00");
    }
}
