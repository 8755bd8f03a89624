//! Configuration management for eggshop
//!
//! Settings come from built-in defaults, a TOML file, or environment variables,
//! and command-line flags override any of them. The secret key and the Discord
//! bot token are never part of this structure: they are read from the
//! environment or the command line at the point of use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::notifications::DiscordConfig;
use crate::shop::{validate_shop_size, SlotInterval, DEFAULT_SHOP_SIZE};
use crate::shop::slot::DEFAULT_INTERVAL_MINUTES;
use crate::storage::DEFAULT_STATE_FILE;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rotation configuration
    #[serde(default)]
    pub shop: ShopConfig,

    /// State file configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Egg catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Discord announcement configuration
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rotation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Slot length in minutes; must divide 60
    pub interval_minutes: u32,

    /// Eggs per shop
    pub shop_size: usize,

    /// Hold the write until the current slot ends
    pub wait_for_boundary: bool,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            shop_size: DEFAULT_SHOP_SIZE,
            wait_for_boundary: false,
        }
    }
}

/// State file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the persisted shop state
    pub output_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

/// Egg catalog settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path of the egg CSV
    pub eggs_csv: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            eggs_csv: PathBuf::from("eggs.csv"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let shop = ShopConfig {
            interval_minutes: env_parsed("EGGSHOP_INTERVAL_MINUTES")
                .unwrap_or(defaults.shop.interval_minutes),
            shop_size: env_parsed("EGGSHOP_SHOP_SIZE").unwrap_or(defaults.shop.shop_size),
            wait_for_boundary: env_flag("EGGSHOP_WAIT").unwrap_or(defaults.shop.wait_for_boundary),
        };

        let storage = StorageConfig {
            output_path: std::env::var("EGGSHOP_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.output_path),
        };

        let catalog = CatalogConfig {
            eggs_csv: std::env::var("EGGSHOP_EGGS_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog.eggs_csv),
        };

        let discord = DiscordConfig {
            channel_id: std::env::var("DISCORD_CHANNEL_ID").ok(),
            ..defaults.discord
        };

        let logging = LoggingConfig {
            level: std::env::var("EGGSHOP_LOG_LEVEL").unwrap_or(defaults.logging.level),
            format: std::env::var("EGGSHOP_LOG_FORMAT").unwrap_or(defaults.logging.format),
        };

        Ok(Self {
            shop,
            storage,
            catalog,
            discord,
            logging,
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        SlotInterval::new(self.shop.interval_minutes).context("Invalid [shop] interval_minutes")?;
        validate_shop_size(self.shop.shop_size).context("Invalid [shop] shop_size")?;

        if self.storage.output_path.as_os_str().is_empty() {
            anyhow::bail!("output_path must not be empty");
        }

        if self.catalog.eggs_csv.as_os_str().is_empty() {
            anyhow::bail!("eggs_csv must not be empty");
        }

        self.discord
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [discord] section: {e}"))?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json', got '{}'", self.logging.format);
        }

        Ok(())
    }

    /// Slot interval as a validated value
    pub fn interval(&self) -> Result<SlotInterval> {
        SlotInterval::new(self.shop.interval_minutes).context("Invalid [shop] interval_minutes")
    }
}
