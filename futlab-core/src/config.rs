//! Portfolio configuration, loaded from TOML.
//!
//! ```toml
//! settlement_field = "closeprice"
//! price_timeout_ms = 2000
//! use_default_point_values = true
//!
//! [point_values]
//! rb = 10
//! IF = 300
//! ```

use crate::domain::PointValueTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_settlement_field() -> String {
    "closeprice".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortfolioConfig {
    /// Name of the price field read as the settlement price.
    #[serde(default = "default_settlement_field")]
    pub settlement_field: String,

    /// Upper bound on a single price lookup. `None` means unbounded.
    #[serde(default)]
    pub price_timeout_ms: Option<u64>,

    /// Start from the built-in futures multiplier table.
    #[serde(default = "default_true")]
    pub use_default_point_values: bool,

    /// Product → multiplier overrides and additions.
    #[serde(default)]
    pub point_values: BTreeMap<String, u64>,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            settlement_field: default_settlement_field(),
            price_timeout_ms: None,
            use_default_point_values: true,
            point_values: BTreeMap::new(),
        }
    }
}

impl PortfolioConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settlement_field.trim().is_empty() {
            return Err(ConfigError::Invalid("settlement_field must not be empty".into()));
        }
        if self.price_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("price_timeout_ms must be > 0".into()));
        }
        for (product, multiplier) in &self.point_values {
            let well_formed = (1..=2).contains(&product.len())
                && product.chars().all(|c| c.is_ascii_alphabetic());
            if !well_formed {
                return Err(ConfigError::Invalid(format!(
                    "point_values: '{product}' is not a 1-2 letter product code"
                )));
            }
            if *multiplier == 0 {
                return Err(ConfigError::Invalid(format!(
                    "point_values: multiplier for '{product}' must be > 0"
                )));
            }
        }
        Ok(())
    }

    pub fn price_timeout(&self) -> Option<Duration> {
        self.price_timeout_ms.map(Duration::from_millis)
    }

    /// Build the effective point-value table.
    pub fn point_value_table(&self) -> PointValueTable {
        let mut table = if self.use_default_point_values {
            PointValueTable::china_futures()
        } else {
            PointValueTable::empty()
        };
        for (product, multiplier) in &self.point_values {
            table.insert(product.clone(), *multiplier);
        }
        table
    }
}
