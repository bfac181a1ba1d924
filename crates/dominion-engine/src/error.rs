//! Error types for the scenario runner binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes while loading and running a scenario.

/// Top-level error for the scenario runner.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: dominion_core::ConfigError,
    },

    /// A campaign mutation or query failed.
    #[error("campaign error: {source}")]
    Campaign {
        /// The underlying campaign error.
        #[from]
        source: dominion_core::CampaignError,
    },

    /// The scenario file could not be read.
    #[error("failed to read scenario file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The scenario file is not valid YAML for the scenario model.
    #[error("failed to parse scenario YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },

    /// A notification could not be rendered as JSON.
    #[error("failed to render notification: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The scenario names a dominion it never declares.
    #[error("unknown dominion in scenario: {name}")]
    UnknownDominion {
        /// The name that did not resolve.
        name: String,
    },

    /// The scenario names a settlement it never declares.
    #[error("unknown settlement in scenario: {name}")]
    UnknownSettlement {
        /// The name that did not resolve.
        name: String,
    },
}
