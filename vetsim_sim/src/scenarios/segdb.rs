//! Segment-database upload scenario.

use super::{Scenario, ScenarioId};
use crate::action::ActionBuilder;
use crate::artifacts::ArtifactNamer;
use crate::chain::{Chain, StepSpec};
use crate::context::EventContext;
use crate::error::SimError;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vetsim_env::{Action, ArtifactStore};

const START_MESSAGE: &str = "began searching for segments in : fakeSegDB";
const FINISH_MESSAGE: &str = "finished searching for segments in : fakeSegDB";

/// One segment flag queried and uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagConfig {
    /// Flag name, e.g. `H1:DMT-ANALYSIS_READY:1`
    pub name: String,

    pub step: StepSpec,

    /// GPS start of the queried segment
    pub start: f64,

    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegDbConfig {
    pub start: StepSpec,

    /// Flags uploaded in order; the first failed upload ends the query
    pub flags: Vec<FlagConfig>,
}

impl Default for SegDbConfig {
    fn default() -> Self {
        Self {
            start: StepSpec::certain(10.0, 1.0),
            flags: Vec::new(),
        }
    }
}

impl SegDbConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        self.start.validate("segdb/start")?;
        for flag in &self.flags {
            flag.step.validate(&format!("segdb/{}", flag.name))?;
        }
        Ok(())
    }
}

/// Segment-database query that uploads one XML table per flag.
#[derive(Debug, Clone)]
pub struct SegDb {
    config: SegDbConfig,
}

impl SegDb {
    pub fn new(config: SegDbConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Scenario for SegDb {
    fn id(&self) -> ScenarioId {
        ScenarioId::SegDb
    }

    fn generate(
        &self,
        rng: &mut dyn RngCore,
        ctx: &EventContext,
        store: &dyn ArtifactStore,
    ) -> Result<Vec<Action>, SimError> {
        let builder = ActionBuilder::new(ctx);
        let namer = ArtifactNamer::new(ctx, store);

        let mut chain = Chain::new("segdb").step("start", self.config.start, move |d| {
            Ok(vec![builder.log(d.at, START_MESSAGE)])
        });

        for flag in &self.config.flags {
            let flag_namer = namer.with_span(flag.start, flag.duration);
            chain = chain.step(flag.name.clone(), flag.step, move |d| {
                let path = flag_namer.name(&flag.name, "", "xml")?;
                Ok(vec![builder.log_file(d.at, flag.name.clone(), path)])
            });
        }

        let run = chain
            .on_complete(move |at| Ok(vec![builder.log(at, FINISH_MESSAGE)]))
            .run(rng, 0.0)?;

        debug!(
            "segdb: {} actions, completed={}, t_end={:.3}",
            run.actions.len(),
            run.completed(),
            run.final_offset
        );
        Ok(run.actions)
    }
}
