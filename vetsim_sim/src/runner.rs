//! Scenario runner - generates seeded schedules for one simulated event.

use crate::config::GeneratorConfig;
use crate::context::EventContext;
use crate::error::SimError;
use crate::scenarios::idq::Idq;
use crate::scenarios::segdb::SegDb;
use crate::scenarios::signoff::SignoffPanel;
use crate::scenarios::virgo::VirgoDq;
use crate::scenarios::{Scenario, ScenarioId};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use vetsim_env::{ActionSink, ArtifactStore, EventHandle};

/// Multiplier for per-scenario seeds (64-bit golden ratio)
const SCENARIO_SEED_MIX: u64 = 0x9e3779b97f4a7c15;

/// Multiplier for the event-token seed
const EVENT_SEED_MIX: u64 = 0x517cc1b727220a95;

/// Results from running a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed of the scenario's own generator
    pub seed: u64,

    /// Number of actions inserted into the sink
    pub actions: usize,

    /// Number of actions carrying a placeholder artifact
    pub artifacts: usize,

    /// Latest action offset, if anything was produced
    pub horizon: Option<f64>,
}

/// Runs scenarios against one simulated event.
///
/// Each scenario draws from its own `ChaCha8Rng` derived from the master
/// seed and its `ScenarioId::index`, so a scenario's output is the same
/// whether it runs alone, after other scenarios, or on another thread.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    /// Master seed
    seed: u64,

    config: GeneratorConfig,

    ctx: EventContext,
}

impl ScenarioRunner {
    /// Creates a runner for `config`.
    ///
    /// The event's folder token is drawn from the master seed, so two runs
    /// with the same seed write into the same folder.
    pub fn new(seed: u64, config: GeneratorConfig) -> Result<Self, SimError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_mul(EVENT_SEED_MIX));
        let event = EventHandle::generate(config.event.graceid.clone(), &mut rng);
        let ctx = config.event_context(event);

        Ok(Self { seed, config, ctx })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn context(&self) -> &EventContext {
        &self.ctx
    }

    /// Returns the seed of `scenario`'s generator.
    pub fn scenario_seed(&self, scenario: ScenarioId) -> u64 {
        self.seed.wrapping_mul(SCENARIO_SEED_MIX) ^ scenario.index()
    }

    /// Builds the configured scenario.
    pub fn build(&self, scenario: ScenarioId) -> Result<Box<dyn Scenario>, SimError> {
        let built: Box<dyn Scenario> = match scenario {
            ScenarioId::SegDb => Box::new(SegDb::new(self.config.segdb.clone())?),
            ScenarioId::Idq => Box::new(Idq::new(self.config.idq.clone())?),
            ScenarioId::VirgoDq => Box::new(VirgoDq::new(self.config.virgo.clone())?),
            ScenarioId::Signoff => Box::new(SignoffPanel::new(self.config.reviewers.clone())?),
        };
        Ok(built)
    }

    /// Runs a scenario and inserts its actions into `sink`.
    ///
    /// Nothing is inserted if generation fails part-way.
    pub fn run(
        &self,
        scenario: ScenarioId,
        store: &dyn ArtifactStore,
        sink: &dyn ActionSink,
    ) -> Result<ScenarioResult, SimError> {
        let seed = self.scenario_seed(scenario);
        let built = self.build(scenario)?;
        info!("Starting scenario: {} (seed={})", built.id(), self.seed);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let actions = built.generate(&mut rng, &self.ctx, store)?;

        let result = ScenarioResult {
            scenario,
            seed,
            actions: actions.len(),
            artifacts: actions.iter().filter(|a| a.artifact.is_some()).count(),
            horizon: actions.iter().map(|a| a.offset).max_by(|a, b| a.total_cmp(b)),
        };

        for action in actions {
            sink.insert(action);
        }

        debug!(
            "{}: {} actions, {} artifacts, horizon={:?}",
            scenario.name(),
            result.actions,
            result.artifacts,
            result.horizon
        );
        Ok(result)
    }

    /// Runs `scenarios` in order, stopping at the first error.
    pub fn run_all(
        &self,
        scenarios: &[ScenarioId],
        store: &dyn ArtifactStore,
        sink: &dyn ActionSink,
    ) -> Result<Vec<ScenarioResult>, SimError> {
        scenarios
            .iter()
            .map(|scenario| self.run(*scenario, store, sink))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::StepSpec;
    use crate::config::ClassifierConfig;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::io;
    use std::path::Path;
    use std::sync::Mutex;
    use vetsim_env::{EnvError, MemoryArtifactStore, Schedule};

    fn run_all(seed: u64, config: GeneratorConfig) -> Schedule {
        let runner = ScenarioRunner::new(seed, config).unwrap();
        let schedule = Schedule::new();
        runner
            .run_all(&ScenarioId::all(), &MemoryArtifactStore::new(), &schedule)
            .unwrap();
        schedule
    }

    #[test]
    fn test_same_seed_same_schedule() {
        let a = run_all(42, GeneratorConfig::default());
        let b = run_all(42, GeneratorConfig::default());

        assert!(!a.is_empty());
        assert_eq!(a.sorted(), b.sorted());
    }

    #[test]
    fn test_scenario_output_independent_of_run_order() {
        let runner = ScenarioRunner::new(7, GeneratorConfig::default()).unwrap();
        let store = MemoryArtifactStore::new();

        let alone = Schedule::new();
        runner.run(ScenarioId::Idq, &store, &alone).unwrap();

        let other = Schedule::new();
        let after = Schedule::new();
        runner.run(ScenarioId::Signoff, &store, &other).unwrap();
        runner.run(ScenarioId::SegDb, &store, &other).unwrap();
        runner.run(ScenarioId::Idq, &store, &after).unwrap();

        assert_eq!(alone.sorted(), after.sorted());
    }

    #[test]
    fn test_scenario_seeds_are_distinct() {
        let runner = ScenarioRunner::new(1, GeneratorConfig::default()).unwrap();
        let seeds: HashSet<u64> = ScenarioId::all().iter().map(|id| runner.scenario_seed(*id)).collect();

        assert_eq!(seeds.len(), ScenarioId::all().len());
    }

    #[test]
    fn test_default_run_summary() {
        let runner = ScenarioRunner::new(3, GeneratorConfig::default()).unwrap();
        let store = MemoryArtifactStore::new();
        let schedule = Schedule::new();

        let results = runner.run_all(&ScenarioId::all(), &store, &schedule).unwrap();

        let by_id = |id| results.iter().find(|r| r.scenario == id).unwrap();
        // No flags configured: start and finish only
        assert_eq!(by_id(ScenarioId::SegDb).actions, 2);
        // H1 and L1 with ovl (activity) and mvsc
        assert_eq!(by_id(ScenarioId::Idq).actions, 2 * (1 + 13 + 11 + 1));
        // V1 is not among the default instruments
        assert_eq!(by_id(ScenarioId::VirgoDq).actions, 0);
        assert_eq!(by_id(ScenarioId::VirgoDq).horizon, None);
        assert_eq!(by_id(ScenarioId::Signoff).actions, 6);

        let total: usize = results.iter().map(|r| r.actions).sum();
        assert_eq!(schedule.len(), total);
        let artifacts: usize = results.iter().map(|r| r.artifacts).sum();
        assert_eq!(store.len(), artifacts);
    }

    #[test]
    fn test_fap_failure_end_to_end() {
        let mut config = GeneratorConfig::default();
        config.event.instruments = vec!["H1".to_string()];
        config.classifiers = vec![ClassifierConfig::new("ovl")];
        config.idq.fap = StepSpec::new(5.0, 1.0, 0.0);

        let runner = ScenarioRunner::new(11, config).unwrap();
        let schedule = Schedule::new();
        runner
            .run(ScenarioId::Idq, &MemoryArtifactStore::new(), &schedule)
            .unwrap();

        let contents: Vec<String> = schedule.into_iter().map(|a| a.content).collect();
        assert_eq!(contents.len(), 2);
        assert!(contents[0].starts_with("Started Searching"));
        assert_eq!(contents[1], "iDQ glitch tables H1:");
    }

    #[test]
    fn test_all_artifacts_share_event_folder() {
        let runner = ScenarioRunner::new(5, GeneratorConfig::default()).unwrap();
        let store = MemoryArtifactStore::new();
        runner
            .run_all(&ScenarioId::all(), &store, &Schedule::new())
            .unwrap();

        let folder = runner.context().event().folder();
        assert!(!store.is_empty());
        assert!(store
            .created()
            .iter()
            .all(|p| p.parent().and_then(|d| d.file_name()).map_or(false, |n| n == folder.as_str())));
    }

    /// Store that accepts a fixed number of placeholders, then fails.
    struct FailAfter {
        allowed: Mutex<usize>,
    }

    impl ArtifactStore for FailAfter {
        fn create_placeholder(&self, path: &Path) -> Result<(), EnvError> {
            let mut allowed = self.allowed.lock().unwrap();
            if *allowed == 0 {
                return Err(EnvError::io(path, io::Error::new(io::ErrorKind::Other, "disk full")));
            }
            *allowed -= 1;
            Ok(())
        }
    }

    #[test]
    fn test_artifact_failure_inserts_nothing() {
        let runner = ScenarioRunner::new(2, GeneratorConfig::default()).unwrap();
        let store = FailAfter {
            allowed: Mutex::new(3),
        };
        let schedule = Schedule::new();

        let err = runner.run(ScenarioId::Idq, &store, &schedule).unwrap_err();

        assert!(matches!(err, SimError::Artifact(_)));
        assert!(err.to_string().contains("H1_idq_ovl_rank"));
        assert!(schedule.is_empty());

        // Scenarios without artifacts still go through
        let result = runner.run(ScenarioId::Signoff, &store, &schedule).unwrap();
        assert_eq!(schedule.len(), result.actions);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GeneratorConfig::default();
        config.idq.min_fap = 0.0;

        let err = ScenarioRunner::new(1, config).unwrap_err();
        assert!(matches!(err, SimError::InvalidFapRange { .. }));
    }

    proptest! {
        #[test]
        fn prop_distinct_seeds_distinct_folders(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            let ra = ScenarioRunner::new(a, GeneratorConfig::default()).unwrap();
            let rb = ScenarioRunner::new(b, GeneratorConfig::default()).unwrap();

            prop_assert_ne!(ra.context().event().folder(), rb.context().event().folder());
        }

        #[test]
        fn prop_schedule_sorted_and_non_negative(seed in any::<u64>()) {
            let sorted = run_all(seed, GeneratorConfig::default()).sorted();

            prop_assert!(sorted.windows(2).all(|w| w[0].offset <= w[1].offset));
            prop_assert!(sorted.iter().all(|a| a.offset >= 0.0));
        }
    }
}
