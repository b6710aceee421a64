//! Configuration for loading and querying unemployment records.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UnemploymentError};

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Environment variable overriding the Parquet batch size
pub const BATCH_SIZE_ENV: &str = "UNEMPLOYMENT_BATCH_SIZE";

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var(BATCH_SIZE_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|size| *size > 0)
}

/// Parameters of the query set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Records below this rate are counted as near-zero unemployment
    pub below_rate_threshold: f64,
    /// Counties above this rate are listed
    pub high_rate_threshold: f64,
    /// Lower inclusive bound of the listed rate range
    pub range_low: f64,
    /// Upper inclusive bound of the listed rate range
    pub range_high: f64,
    /// Records above this rate are counted
    pub count_above_threshold: f64,
    /// First year included in the per-state totals since a year
    pub since_year: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            below_rate_threshold: 1.0,
            high_rate_threshold: 10.0,
            range_low: 5.0,
            range_high: 8.0,
            count_above_threshold: 5.0,
            since_year: 2015,
        }
    }
}

impl QueryConfig {
    /// Check that thresholds are finite and the range is ordered
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("below_rate_threshold", self.below_rate_threshold),
            ("high_rate_threshold", self.high_rate_threshold),
            ("range_low", self.range_low),
            ("range_high", self.range_high),
            ("count_above_threshold", self.count_above_threshold),
        ];
        if let Some((name, value)) = thresholds.iter().find(|(_, value)| !value.is_finite()) {
            return Err(UnemploymentError::config_error(format!(
                "{name} must be finite, got {value}"
            ))
            .into());
        }
        if self.range_low > self.range_high {
            return Err(UnemploymentError::config_error(format!(
                "range_low ({}) is greater than range_high ({})",
                self.range_low, self.range_high
            ))
            .into());
        }
        Ok(())
    }
}

/// Options for reading record files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Rows per Parquet record batch; falls back to the environment, then the default
    pub batch_size: Option<usize>,
    /// Skip rows that violate the record invariants instead of failing
    pub skip_malformed: bool,
    /// Read the files of a directory in parallel
    pub parallel: bool,
    /// Worker threads for parallel reading
    pub num_threads: usize,
    /// Show a progress bar while reading directories
    pub show_progress: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            skip_malformed: true,
            parallel: true,
            num_threads: num_cpus::get(),
            show_progress: false,
        }
    }
}

impl LoaderConfig {
    /// Effective batch size: configured, then environment, then default
    #[must_use]
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size
            .or_else(get_batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == Some(0) {
            return Err(UnemploymentError::config_error("batch_size must be greater than zero").into());
        }
        if self.num_threads == 0 {
            return Err(UnemploymentError::config_error("num_threads must be greater than zero").into());
        }
        Ok(())
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub query: QueryConfig,
    pub loader: LoaderConfig,
}

impl Config {
    /// Parse a configuration from JSON; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(UnemploymentError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file in JSON format
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(UnemploymentError::from)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.query.validate()?;
        self.loader.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.query.below_rate_threshold, 1.0);
        assert_eq!(config.query.since_year, 2015);
        assert!(config.loader.skip_malformed);
        assert!(config.loader.num_threads > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json_str(r#"{"query": {"since_year": 2018}}"#).unwrap();
        assert_eq!(config.query.since_year, 2018);
        assert_eq!(config.query.range_high, 8.0);
        assert_eq!(config.loader, LoaderConfig::default());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = Config::from_json_str(r#"{"query": {"range_low": 9.0, "range_high": 2.0}}"#)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UnemploymentError>(),
            Some(UnemploymentError::Config(_))
        ));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let loader = LoaderConfig {
            batch_size: Some(0),
            ..Default::default()
        };
        assert!(loader.validate().is_err());
    }

    #[test]
    fn test_configured_batch_size_wins() {
        let loader = LoaderConfig {
            batch_size: Some(128),
            ..Default::default()
        };
        assert_eq!(loader.effective_batch_size(), 128);
    }
}
