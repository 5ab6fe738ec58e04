//! Per-scenario event context.

use crate::config::ClassifierConfig;
use std::path::{Path, PathBuf};
use vetsim_env::{EventHandle, DEFAULT_ENDPOINT};

/// Immutable parameters shared by every scenario targeting one event.
///
/// Built once before any scenario runs and only read afterwards, so
/// scenarios can be generated in any order (or in parallel) against the
/// same context.
#[derive(Debug, Clone)]
pub struct EventContext {
    /// Target event
    event: EventHandle,

    /// GPS start of the analysed span
    start: f64,

    /// Length of the analysed span in seconds
    duration: f64,

    /// Participating instruments (e.g. "H1", "L1", "V1")
    instruments: Vec<String>,

    /// Classifiers run by the data-quality pipeline
    classifiers: Vec<ClassifierConfig>,

    /// Upload endpoint annotated on every action
    endpoint: String,

    /// Base directory for placeholder artifacts
    artifact_dir: PathBuf,
}

impl EventContext {
    /// Creates a context with no instruments or classifiers.
    pub fn new(event: EventHandle, start: f64, duration: f64) -> Self {
        Self {
            event,
            start,
            duration,
            instruments: Vec::new(),
            classifiers: Vec::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            artifact_dir: PathBuf::from("."),
        }
    }

    /// Sets the participating instruments.
    pub fn with_instruments<I, S>(mut self, instruments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instruments = instruments.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the classifiers.
    pub fn with_classifiers(mut self, classifiers: Vec<ClassifierConfig>) -> Self {
        self.classifiers = classifiers;
        self
    }

    /// Sets the upload endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the artifact base directory.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    pub fn event(&self) -> &EventHandle {
        &self.event
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Returns the GPS end of the analysed span.
    pub fn stop(&self) -> f64 {
        self.start + self.duration
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    /// Returns true if `name` is among the participating instruments.
    pub fn has_instrument(&self, name: &str) -> bool {
        self.instruments.iter().any(|i| i == name)
    }

    pub fn classifiers(&self) -> &[ClassifierConfig] {
        &self.classifiers
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Formats the analysed span as `[start, stop]` in whole seconds.
    pub fn span_label(&self) -> String {
        format!("[{}, {}]", self.start as i64, self.stop() as i64)
    }
}
