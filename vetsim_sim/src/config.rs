//! Generator configuration.
//!
//! Every knob is fixed at construction time. A `GeneratorConfig` can be
//! built in code (starting from `Default`) or loaded from a JSON file; any
//! field missing from the file keeps its default.

use crate::context::EventContext;
use crate::error::SimError;
use crate::scenarios::idq::IdqConfig;
use crate::scenarios::segdb::SegDbConfig;
use crate::scenarios::signoff::ReviewerConfig;
use crate::scenarios::virgo::VirgoDqConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vetsim_env::{EventHandle, DEFAULT_ENDPOINT};

/// A classifier run by the data-quality pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub name: String,

    /// Whether this classifier publishes a channel-activity report
    #[serde(default)]
    pub supports_channel_activity: bool,
}

impl ClassifierConfig {
    /// Creates a classifier without a channel-activity report.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supports_channel_activity: false,
        }
    }

    /// Enables the channel-activity report.
    pub fn with_channel_activity(mut self) -> Self {
        self.supports_channel_activity = true;
        self
    }
}

/// Description of the simulated candidate event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Event identifier
    pub graceid: String,

    /// GPS start of the analysed span
    pub start: f64,

    /// Length of the analysed span in seconds
    pub duration: f64,

    pub instruments: Vec<String>,

    /// Upload endpoint annotated on every action
    pub endpoint: String,

    /// Base directory for placeholder artifacts
    pub artifact_dir: PathBuf,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            graceid: "G000000".to_string(),
            start: 1_000_000_000.0,
            duration: 64.0,
            instruments: vec!["H1".to_string(), "L1".to_string()],
            endpoint: DEFAULT_ENDPOINT.to_string(),
            artifact_dir: PathBuf::from("."),
        }
    }
}

/// Complete generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub event: EventConfig,

    pub classifiers: Vec<ClassifierConfig>,

    pub segdb: SegDbConfig,

    pub idq: IdqConfig,

    pub virgo: VirgoDqConfig,

    /// Human and site reviewers asked to sign off
    pub reviewers: Vec<ReviewerConfig>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            event: EventConfig::default(),
            classifiers: vec![
                ClassifierConfig::new("ovl").with_channel_activity(),
                ClassifierConfig::new("mvsc"),
            ],
            segdb: SegDbConfig::default(),
            idq: IdqConfig::default(),
            virgo: VirgoDqConfig::default(),
            reviewers: ReviewerConfig::default_panel(),
        }
    }
}

impl GeneratorConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every step spec and range in the configuration.
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.event.start.is_finite() {
            return Err(SimError::config(format!(
                "event start must be a finite GPS time, got {}",
                self.event.start
            )));
        }
        if !(self.event.duration >= 0.0) || !self.event.duration.is_finite() {
            return Err(SimError::config(format!(
                "event duration must be finite and non-negative, got {}",
                self.event.duration
            )));
        }
        self.segdb.validate()?;
        self.idq.validate()?;
        self.virgo.validate()?;
        for reviewer in &self.reviewers {
            reviewer.timing.validate()?;
        }
        Ok(())
    }

    /// Builds the event context for `event`.
    pub fn event_context(&self, event: EventHandle) -> EventContext {
        EventContext::new(event, self.event.start, self.event.duration)
            .with_instruments(self.event.instruments.iter().cloned())
            .with_classifiers(self.classifiers.clone())
            .with_endpoint(self.event.endpoint.clone())
            .with_artifact_dir(self.event.artifact_dir.clone())
    }
}
