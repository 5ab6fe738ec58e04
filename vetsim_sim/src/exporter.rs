//! JSON exporter for generated schedules.
//!
//! Writes the time-ordered actions of one run, plus a per-scenario summary,
//! for downstream dispatchers that replay them against the vetting service.

use crate::runner::{ScenarioResult, ScenarioRunner};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use vetsim_env::Action;

/// Summary of one scenario in an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    /// Scenario name
    pub scenario: String,

    /// Seed of the scenario's generator
    pub seed: u64,

    pub actions: usize,

    pub artifacts: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon: Option<f64>,
}

impl From<&ScenarioResult> for ScenarioSummary {
    fn from(result: &ScenarioResult) -> Self {
        Self {
            scenario: result.scenario.name().to_string(),
            seed: result.seed,
            actions: result.actions,
            artifacts: result.artifacts,
            horizon: result.horizon,
        }
    }
}

/// Complete schedule export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleExport {
    /// Master seed
    pub seed: u64,

    /// Target event identifier
    pub graceid: String,

    /// Folder holding the event's placeholder artifacts
    pub folder: String,

    /// GPS start of the analysed span
    pub start: f64,

    pub duration: f64,

    pub scenarios: Vec<ScenarioSummary>,

    /// All actions in time order
    pub actions: Vec<Action>,
}

impl ScheduleExport {
    /// Creates an empty export for the runner's event.
    pub fn new(runner: &ScenarioRunner) -> Self {
        let ctx = runner.context();
        Self {
            seed: runner.seed(),
            graceid: ctx.event().graceid.clone(),
            folder: ctx.event().folder(),
            start: ctx.start(),
            duration: ctx.duration(),
            scenarios: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Records the scenarios that were run.
    pub fn with_results(mut self, results: &[ScenarioResult]) -> Self {
        self.scenarios = results.iter().map(ScenarioSummary::from).collect();
        self
    }

    /// Sets the exported actions; they must already be time-ordered.
    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    /// Returns the latest action offset.
    pub fn horizon(&self) -> Option<f64> {
        self.actions.last().map(|a| a.offset)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
