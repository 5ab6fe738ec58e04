//! Virgo interferometer status scenario.
//!
//! Scheduled only when `V1` participates. After the start message the
//! checks do not abandon one another: the status and band-RMS uploads are
//! independently optional, while the veto and hardware-injection checks
//! always report, with the occurrence draw choosing the verdict.

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

const SITE: &str = "V1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirgoDqConfig {
    /// Search pipeline named in the veto verdict
    pub pipeline: String,

    pub start: StepSpec,

    /// Interferometer status upload
    pub ifo_status: StepSpec,

    /// Probability here is the chance the event is NOT vetoed
    pub vetoes: StepSpec,

    /// Band-RMS channel upload
    pub rms_channels: StepSpec,

    /// Probability here is the chance injections are found
    pub injections: StepSpec,
}

impl Default for VirgoDqConfig {
    fn default() -> Self {
        Self {
            pipeline: "gstlal".to_string(),
            start: StepSpec::certain(1.0, 0.5),
            ifo_status: StepSpec::certain(1.0, 0.5),
            vetoes: StepSpec::certain(1.0, 0.5),
            rms_channels: StepSpec::certain(1.0, 0.5),
            injections: StepSpec::new(1.0, 0.5, 0.0),
        }
    }
}

impl VirgoDqConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        self.start.validate("virgo_dq/start")?;
        self.ifo_status.validate("virgo_dq/ifo_status")?;
        self.vetoes.validate("virgo_dq/vetoes")?;
        self.rms_channels.validate("virgo_dq/rms_channels")?;
        self.injections.validate("virgo_dq/injections")?;
        Ok(())
    }
}

/// Virgo detector-characterisation checks.
#[derive(Debug, Clone)]
pub struct VirgoDq {
    config: VirgoDqConfig,
}

impl VirgoDq {
    pub fn new(config: VirgoDqConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Scenario for VirgoDq {
    fn id(&self) -> ScenarioId {
        ScenarioId::VirgoDq
    }

    fn generate(
        &self,
        rng: &mut dyn RngCore,
        ctx: &EventContext,
        store: &dyn ArtifactStore,
    ) -> Result<Vec<Action>, SimError> {
        if !ctx.has_instrument(SITE) {
            debug!("virgo_dq: {} not participating, nothing scheduled", SITE);
            return Ok(Vec::new());
        }

        let cfg = &self.config;
        let builder = ActionBuilder::new(ctx);
        let namer = ArtifactNamer::new(ctx, store);
        let pipeline = cfg.pipeline.as_str();

        let run = Chain::new("virgo_dq")
            .step("start", cfg.start, move |d| {
                let message = format!(
                    "Starting V1 detchar analysis: [{};{}]",
                    ctx.start() as i64,
                    ctx.stop() as i64
                );
                Ok(vec![builder.log(d.at, message)])
            })
            .independent("ifo_status", cfg.ifo_status, move |d| {
                let path = namer.name(SITE, "DQ_META", "txt")?;
                Ok(vec![builder.log_file(d.at, "Testing V1 interferometer status:", path)])
            })
            .branch("vetoes", cfg.vetoes, move |d| {
                let verdict = if d.hit { "IS NOT" } else { "IS" };
                let message = format!(
                    "Testing {} V1 veto channel: this event {} vetoed",
                    pipeline, verdict
                );
                Ok(vec![builder.log(d.at, message)])
            })
            .independent("rms_channels", cfg.rms_channels, move |d| {
                let path = namer.name(SITE, "DQ_BRMSMon_FLAG", "txt")?;
                Ok(vec![builder.log_file(d.at, "Testing V1 band RMS channels:", path)])
            })
            .branch("injections", cfg.injections, move |d| {
                let verdict = if d.hit { "FOUND" } else { "DID NOT FIND" };
                let message = format!("Testing V1 hardware injection: {} injections", verdict);
                Ok(vec![builder.log(d.at, message)])
            })
            .on_complete(move |at| Ok(vec![builder.log(at, "V1 detchar analysis finished")]))
            .run(rng, 0.0)?;

        debug!(
            "virgo_dq: {} actions, completed={}, t_end={:.3}",
            run.actions.len(),
            run.completed(),
            run.final_offset
        );
        Ok(run.actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use vetsim_env::{EventHandle, MemoryArtifactStore};

    fn ctx(instruments: &[&str]) -> EventContext {
        EventContext::new(EventHandle::new("G1"), 1000.0, 10.0).with_instruments(instruments.iter().copied())
    }

    fn generate(config: VirgoDqConfig, ctx: &EventContext) -> (Vec<String>, MemoryArtifactStore) {
        let store = MemoryArtifactStore::new();
        let actions = VirgoDq::new(config)
            .unwrap()
            .generate(&mut ChaCha8Rng::seed_from_u64(2), ctx, &store)
            .unwrap();
        (actions.into_iter().map(|a| a.content).collect(), store)
    }

    #[test]
    fn test_virgo_requires_v1() {
        let (contents, store) = generate(VirgoDqConfig::default(), &ctx(&["H1", "L1"]));
        assert!(contents.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_virgo_default_run() {
        let (contents, store) = generate(VirgoDqConfig::default(), &ctx(&["H1", "V1"]));

        assert_eq!(
            contents,
            vec![
                "Starting V1 detchar analysis: [1000;1010]",
                "Testing V1 interferometer status:",
                "Testing gstlal V1 veto channel: this event IS NOT vetoed",
                "Testing V1 band RMS channels:",
                "Testing V1 hardware injection: DID NOT FIND injections",
                "V1 detchar analysis finished",
            ]
        );
        assert_eq!(store.len(), 2);
        assert!(store.created()[0].ends_with("V1_DQ_META-1000-10.txt"));
    }

    #[test]
    fn test_virgo_optional_checks_do_not_abandon() {
        let config = VirgoDqConfig {
            ifo_status: StepSpec::new(1.0, 0.5, 0.0),
            vetoes: StepSpec::new(1.0, 0.5, 0.0),
            rms_channels: StepSpec::new(1.0, 0.5, 0.0),
            injections: StepSpec::certain(1.0, 0.5),
            ..Default::default()
        };

        let (contents, store) = generate(config, &ctx(&["V1"]));

        assert_eq!(
            contents,
            vec![
                "Starting V1 detchar analysis: [1000;1010]",
                "Testing gstlal V1 veto channel: this event IS vetoed",
                "Testing V1 hardware injection: FOUND injections",
                "V1 detchar analysis finished",
            ]
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_virgo_start_failure_yields_nothing() {
        let config = VirgoDqConfig {
            start: StepSpec::new(1.0, 0.5, 0.0),
            ..Default::default()
        };

        let (contents, _) = generate(config, &ctx(&["V1"]));
        assert!(contents.is_empty());
    }
}
