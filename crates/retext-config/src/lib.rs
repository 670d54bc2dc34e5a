//! Configuration management for retext.
//!
//! Parses `retext.toml` files with serde and provides auto-discovery of the
//! config file in parent directories.
//!
//! ## Filter rules
//!
//! ```toml
//! [[filters]]
//! pattern = "PRICE"
//! flags = "gi"
//! replace = "<b>$5</b>"
//! ```
//!
//! - `pattern` is a regular expression source (required)
//! - `flags` may contain `g` (accepted, matching is always global), `i`, `m`,
//!   `s`, `x` and `u`
//! - `replace` is a replacement template; any other TOML value is kept so the
//!   rule can be reported and skipped instead of failing the whole file

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "retext.toml";

/// Flags accepted in `filters.flags`.
const SUPPORTED_FLAGS: &str = "gimsxu";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter rules, applied in order.
    pub filters: Vec<FilterConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// A single pattern/replacement rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterConfig {
    /// Regular expression source.
    pub pattern: String,
    /// Regex flags (e.g., "gi").
    #[serde(default)]
    pub flags: String,
    /// Replacement template. Missing or non-string values make the rule inert.
    #[serde(default)]
    pub replace: Option<ReplaceValue>,
}

impl FilterConfig {
    /// Whether `flag` is set for this rule.
    #[must_use]
    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }
}

/// Raw `replace` value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReplaceValue {
    /// Replacement template string.
    Text(String),
    /// Any other TOML value.
    Other(toml::Value),
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise, searches
    /// for `retext.toml` in the current directory and its parents, falling
    /// back to an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if reading,
    /// parsing or validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }
        let discovered = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd));
        match discovered {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for unsupported regex flags.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, filter) in self.filters.iter().enumerate() {
            if let Some(flag) = filter.flags.chars().find(|c| !SUPPORTED_FLAGS.contains(*c)) {
                return Err(ConfigError::Validation(format!(
                    "filters[{index}].flags: unsupported flag '{flag}'"
                )));
            }
        }
        Ok(())
    }

    /// Search for the config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }
}
