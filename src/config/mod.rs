//! Configuration management for weighbridge.
//!
//! Configuration is read from `~/.config/weighbridge/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::extractor::ExtractConfig;
use crate::fetcher::FetchConfig;
use crate::pipeline::PipelineConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/weighbridge/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("weighbridge").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# weighbridge configuration

[fetch]
# Product page URL; {id} is replaced by the percent-encoded identifier
url_template = "https://www.example.com/product/{id}"

# Sent with every request
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
accept_language = "en-US,en;q=0.9"

# Per-attempt timeout in seconds
timeout_secs = 10

# Attempts per identifier; the wait after each failure starts at
# base_delay_ms and is multiplied by backoff_multiplier every time
max_attempts = 3
base_delay_ms = 2000
backoff_multiplier = 2.0

# Random pause before every request (milliseconds)
pacing_min_ms = 500
pacing_max_ms = 1500

[extract]
# Unit that must follow the number
unit = "kg"

# Usual location of the weight: table, row and cell (zero-based)
targeted_table = "table#product-attributes"
targeted_row = 2
targeted_cell = 1

# Tables scanned cell by cell if the usual location has no weight
known_tables = [
    "table#product-attributes",
    "table.product-specs",
    "table.tech-specs",
]

# Regions whose list items are scanned last
bullet_regions = [
    "#product-details",
    ".product-features",
]

[pipeline]
# Identifiers resolved at once
workers = 5

# "shared" keeps results between batches, "per_run" starts clean each time
cache_scope = "shared"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
