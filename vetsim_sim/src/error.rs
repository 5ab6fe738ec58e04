//! Error types for the VetSim generator.

use thiserror::Error;
use vetsim_env::EnvError;

/// Errors surfaced while constructing or running a scenario.
///
/// A failed occurrence draw is not an error: it is ordinary chain
/// abandonment and never produces one of these.
#[derive(Debug, Error)]
pub enum SimError {
    /// Site reviewer constructed with an unrecognised site
    #[error("Unknown site: {0} (known sites: H1, L1, V1)")]
    UnknownSite(String),

    /// Step timing or probability out of range
    #[error("Invalid step '{step}': {reason}")]
    InvalidStep { step: String, reason: String },

    /// False-alarm-probability bounds unusable for a log-uniform draw
    #[error("Invalid FAP range [{min}, {max}]: require 0 < min <= max")]
    InvalidFapRange { min: f64, max: f64 },

    /// Placeholder artifact could not be created (not retried)
    #[error("Artifact error: {0}")]
    Artifact(#[from] EnvError),

    /// Configuration is inconsistent
    #[error("Config error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration file is not valid JSON for `GeneratorConfig`
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// Creates an invalid-step error.
    pub fn invalid_step(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStep {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
