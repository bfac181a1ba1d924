//! Configuration loading and typed config structures for the Dominion engine.
//!
//! The canonical configuration lives in `dominion-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file. Every field has a
//! default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `dominion-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Full-recalculation policy.
    #[serde(default)]
    pub recalculation: RecalculationConfig,

    /// Batch coordinator limits.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scenario the engine binary loads.
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `DOMINION_SCENARIO` environment variable overrides
    /// `scenario.path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml reads an empty document as unit, not as an empty map.
        if yaml.trim().is_empty() {
            let mut config = Self::default();
            config.scenario.apply_env_overrides();
            return Ok(config);
        }
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.scenario.apply_env_overrides();
        Ok(config)
    }
}

/// Full-recalculation policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecalculationConfig {
    /// Remove abandoned upgrades (destroy unfinished ones, revert finished
    /// ones to their base) unless a request says otherwise.
    #[serde(default = "default_true")]
    pub remove_abandoned: bool,

    /// Maximum follow-up passes after finalization reverted upgrades.
    #[serde(default = "default_max_followup_passes")]
    pub max_followup_passes: u32,
}

impl Default for RecalculationConfig {
    fn default() -> Self {
        Self {
            remove_abandoned: true,
            max_followup_passes: default_max_followup_passes(),
        }
    }
}

/// Batch coordinator limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchConfig {
    /// Maximum flush rounds when flushing enqueues further requests.
    #[serde(default = "default_max_flush_rounds")]
    pub max_flush_rounds: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_flush_rounds: default_max_flush_rounds(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Scenario selection for the engine binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScenarioConfig {
    /// Path of the scenario YAML file.
    #[serde(default = "default_scenario_path")]
    pub path: PathBuf,

    /// Availability queries to report after the recalculation.
    #[serde(default)]
    pub queries: Vec<QueryConfig>,
}

impl ScenarioConfig {
    /// Override the scenario path with `DOMINION_SCENARIO` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DOMINION_SCENARIO") {
            self.path = PathBuf::from(val);
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            path: default_scenario_path(),
            queries: Vec::new(),
        }
    }
}

/// One availability query to report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryConfig {
    /// Name of the dominion to ask.
    pub dominion: String,
    /// Settlement name, or `None` for the whole dominion.
    #[serde(default)]
    pub settlement: Option<String>,
    /// Resource name to ask about.
    #[serde(default)]
    pub resource: Option<String>,
    /// Structure definition to ask about.
    #[serde(default)]
    pub structure: Option<String>,
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_max_followup_passes() -> u32 {
    8
}

const fn default_max_flush_rounds() -> u32 {
    16
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_scenario_path() -> PathBuf {
    PathBuf::from("scenarios/border_march.yaml")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.recalculation.remove_abandoned);
        assert_eq!(config.recalculation.max_followup_passes, 8);
        assert_eq!(config.batch.max_flush_rounds, 16);
        assert_eq!(config.logging.level, "info");
        assert!(config.scenario.queries.is_empty());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
recalculation:
  remove_abandoned: false
  max_followup_passes: 3

batch:
  max_flush_rounds: 4

logging:
  level: debug

scenario:
  queries:
    - dominion: Aldmark
      settlement: Harrowgate
      structure: armory
    - dominion: Aldmark
      resource: iron
";
        let config = EngineConfig::parse(yaml).unwrap();
        assert!(!config.recalculation.remove_abandoned);
        assert_eq!(config.recalculation.max_followup_passes, 3);
        assert_eq!(config.batch.max_flush_rounds, 4);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.scenario.queries.len(), 2);
        assert_eq!(config.scenario.queries[1].resource.as_deref(), Some("iron"));
        assert!(config.scenario.queries[1].settlement.is_none());
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = EngineConfig::parse("batch:\n  max_flush_rounds: 2\n").unwrap();
        assert_eq!(config.batch.max_flush_rounds, 2);
        assert_eq!(config.recalculation, RecalculationConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = EngineConfig::parse("").unwrap();
        assert_eq!(config.recalculation, RecalculationConfig::default());
        assert_eq!(config.batch, BatchConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            EngineConfig::parse("batch: [unterminated"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
