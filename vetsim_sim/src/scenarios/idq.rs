//! iDQ data-quality pipeline scenario.
//!
//! One chain per instrument. After the instrument-level start message, each
//! classifier contributes a run of gated products (glitch tables, FAP
//! estimate, frames, timeseries plot, optional channel-activity report,
//! calibration check, ROC curves, vital statistics). Classifiers run one
//! after another on the same cursor, so a failed product abandons the rest
//! of that instrument: later classifiers never report and the "finished"
//! message is withheld.

use super::{Scenario, ScenarioId};
use crate::action::ActionBuilder;
use crate::artifacts::ArtifactNamer;
use crate::chain::{Chain, StepSpec};
use crate::config::ClassifierConfig;
use crate::context::EventContext;
use crate::error::SimError;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vetsim_env::{Action, ArtifactStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdqConfig {
    /// Lower bound of the reported glitch FAP
    pub min_fap: f64,

    /// Upper bound of the reported glitch FAP
    pub max_fap: f64,

    pub start: StepSpec,
    pub tables: StepSpec,
    pub fap: StepSpec,
    pub gwf: StepSpec,
    pub timeseries: StepSpec,
    pub active_channels: StepSpec,
    pub calibration: StepSpec,
    pub roc: StepSpec,
    pub stats: StepSpec,
}

impl Default for IdqConfig {
    fn default() -> Self {
        Self {
            min_fap: 1e-5,
            max_fap: 1.0,
            start: StepSpec::certain(1.0, 0.5),
            tables: StepSpec::certain(10.0, 1.0),
            fap: StepSpec::certain(5.0, 1.0),
            gwf: StepSpec::certain(5.0, 1.0),
            timeseries: StepSpec::certain(5.0, 1.0),
            active_channels: StepSpec::certain(10.0, 1.0),
            calibration: StepSpec::certain(20.0, 5.0),
            roc: StepSpec::certain(20.0, 5.0),
            stats: StepSpec::certain(30.0, 5.0),
        }
    }
}

impl IdqConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        let fap_ok = self.min_fap.is_finite()
            && self.max_fap.is_finite()
            && self.min_fap > 0.0
            && self.min_fap <= self.max_fap;
        if !fap_ok {
            return Err(SimError::InvalidFapRange {
                min: self.min_fap,
                max: self.max_fap,
            });
        }

        for (name, spec) in [
            ("start", &self.start),
            ("tables", &self.tables),
            ("fap", &self.fap),
            ("gwf", &self.gwf),
            ("timeseries", &self.timeseries),
            ("active_channels", &self.active_channels),
            ("calibration", &self.calibration),
            ("roc", &self.roc),
            ("stats", &self.stats),
        ] {
            spec.validate(&format!("idq/{}", name))?;
        }
        Ok(())
    }

    /// Sets every step's occurrence probability.
    pub fn with_all_probabilities(mut self, probability: f64) -> Self {
        for spec in [
            &mut self.start,
            &mut self.tables,
            &mut self.fap,
            &mut self.gwf,
            &mut self.timeseries,
            &mut self.active_channels,
            &mut self.calibration,
            &mut self.roc,
            &mut self.stats,
        ] {
            spec.probability = probability;
        }
        self
    }
}

/// Draws a FAP uniformly in `log(FAP)` between `min` and `max`.
pub fn draw_fap<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    let (lo, hi) = (min.ln(), max.ln());
    (lo + rng.gen::<f64>() * (hi - lo)).exp()
}

/// The iDQ pipeline across all instruments and classifiers of the context.
#[derive(Debug, Clone)]
pub struct Idq {
    config: IdqConfig,
}

impl Idq {
    pub fn new(config: IdqConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn instrument_chain<'a>(
        &'a self,
        instrument: &'a str,
        classifiers: &'a [ClassifierConfig],
        builder: ActionBuilder<'a>,
        namer: ArtifactNamer<'a>,
        span: &'a str,
    ) -> Chain<'a> {
        let mut chain = Chain::new(format!("idq/{}", instrument)).step(
            "start",
            self.config.start,
            move |d| {
                Ok(vec![builder.log(
                    d.at,
                    format!("Started Searching for iDQ information within {} at {}", span, instrument),
                )])
            },
        );

        for classifier in classifiers {
            chain = chain.then(self.classifier_chain(instrument, classifier, builder, namer, span));
        }

        chain.on_complete(move |at| {
            Ok(vec![builder.log(
                at,
                format!("Finished searching for iDQ information within {} at {}", span, instrument),
            )])
        })
    }

    fn classifier_chain<'a>(
        &'a self,
        ifo: &'a str,
        classifier: &'a ClassifierConfig,
        builder: ActionBuilder<'a>,
        namer: ArtifactNamer<'a>,
        span: &'a str,
    ) -> Chain<'a> {
        let cfg = &self.config;
        let clf = classifier.name.as_str();

        let mut chain = Chain::new(format!("idq/{}/{}", ifo, clf))
            .step("tables", cfg.tables, move |d| {
                let path = namer.name(ifo, &format!("idq_{}", clf), "xml.gz")?;
                Ok(vec![builder.log_file(d.at, format!("iDQ glitch tables {}:", ifo), path)])
            })
            .step_drawing("fap", cfg.fap, move |d, rng| {
                let fap = draw_fap(rng, cfg.min_fap, cfg.max_fap);
                let path = namer.name(ifo, clf, "json")?;
                let message = format!(
                    "minimum glitch-FAP for {} at {} within {} is {:.6}",
                    clf, ifo, span, fap
                );
                Ok(vec![builder.log_file(d.at, message, path)])
            })
            .step("gwf", cfg.gwf, move |d| {
                companion_logs(
                    builder,
                    namer,
                    d.at,
                    ifo,
                    (
                        format!("idq_{}_fap", clf),
                        "gwf",
                        format!("iDQ fap timeseries for {} at {} within {} :", clf, ifo, span),
                    ),
                    (
                        format!("idq_{}_rank", clf),
                        "gwf",
                        format!("iDQ glitch-rank frame for {} at {} within {} :", clf, ifo, span),
                    ),
                )
            })
            .step("timeseries", cfg.timeseries, move |d| {
                let path = namer.name(ifo, &format!("{}_timeseries", clf), "png")?;
                let message = format!("iDQ fap and glitch-rank timeseries plot for {} at {}:", clf, ifo);
                Ok(vec![builder.log_file(d.at, message, path)])
            });

        if classifier.supports_channel_activity {
            chain = chain.step("active_channels", cfg.active_channels, move |d| {
                companion_logs(
                    builder,
                    namer,
                    d.at,
                    ifo,
                    (
                        format!("{}_chanlist", clf),
                        "json",
                        format!("iDQ (possible) active channels for {} at {}", clf, ifo),
                    ),
                    (
                        format!("{}_chanstrip", clf),
                        "png",
                        format!("iDQ channel strip chart for {} at {}", clf, ifo),
                    ),
                )
            });
        }

        chain
            .step("calibration", cfg.calibration, move |d| {
                companion_logs(
                    builder,
                    namer,
                    d.at,
                    ifo,
                    (
                        format!("{}_calib", clf),
                        "json",
                        format!("iDQ calibration sanity check for {} at {}", clf, ifo),
                    ),
                    (
                        format!("{}_calib", clf),
                        "png",
                        format!("iDQ calibration sanity check figure for {} at {}", clf, ifo),
                    ),
                )
            })
            .step("roc", cfg.roc, move |d| {
                companion_logs(
                    builder,
                    namer,
                    d.at,
                    ifo,
                    (
                        format!("{}_ROC", clf),
                        "json",
                        format!("iDQ local ROC curves for {} at {}", clf, ifo),
                    ),
                    (
                        format!("{}_ROC", clf),
                        "png",
                        format!("iDQ local ROC figure for {} at {}", clf, ifo),
                    ),
                )
            })
            .step("stats", cfg.stats, move |d| {
                companion_logs(
                    builder,
                    namer,
                    d.at,
                    ifo,
                    (
                        format!("{}_calibStats", clf),
                        "json",
                        format!("iDQ local calibration vital statistics for {} at {}", clf, ifo),
                    ),
                    (
                        format!("{}_trainStats", clf),
                        "json",
                        format!("iDQ local training vital statistics for {} at {}", clf, ifo),
                    ),
                )
            })
    }
}

/// Emits two log entries sharing one timestamp, each with its own artifact.
fn companion_logs(
    builder: ActionBuilder<'_>,
    namer: ArtifactNamer<'_>,
    at: f64,
    ifo: &str,
    first: (String, &str, String),
    second: (String, &str, String),
) -> Result<Vec<Action>, SimError> {
    let (first_path, second_path) = namer.pair(ifo, (&first.0, first.1), (&second.0, second.1))?;
    Ok(vec![
        builder.log_file(at, first.2, first_path),
        builder.log_file(at, second.2, second_path),
    ])
}

impl Scenario for Idq {
    fn id(&self) -> ScenarioId {
        ScenarioId::Idq
    }

    fn generate(
        &self,
        rng: &mut dyn RngCore,
        ctx: &EventContext,
        store: &dyn ArtifactStore,
    ) -> Result<Vec<Action>, SimError> {
        let builder = ActionBuilder::new(ctx);
        let namer = ArtifactNamer::new(ctx, store);
        let span = ctx.span_label();

        let mut actions = Vec::new();
        for instrument in ctx.instruments() {
            let run = self
                .instrument_chain(instrument, ctx.classifiers(), builder, namer, &span)
                .run(&mut *rng, 0.0)?;

            debug!(
                "idq {}: {} actions, completed={}, t_end={:.3}",
                instrument,
                run.actions.len(),
                run.completed(),
                run.final_offset
            );
            actions.extend(run.actions);
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use vetsim_env::{EventHandle, MemoryArtifactStore};

    fn ctx(instruments: &[&str], classifiers: Vec<ClassifierConfig>) -> EventContext {
        EventContext::new(EventHandle::new("G1"), 1000.0, 10.0)
            .with_instruments(instruments.iter().copied())
            .with_classifiers(classifiers)
    }

    fn generate(config: IdqConfig, ctx: &EventContext, seed: u64) -> (Vec<Action>, MemoryArtifactStore) {
        let store = MemoryArtifactStore::new();
        let actions = Idq::new(config)
            .unwrap()
            .generate(&mut ChaCha8Rng::seed_from_u64(seed), ctx, &store)
            .unwrap();
        (actions, store)
    }

    fn contents(actions: &[Action]) -> Vec<&str> {
        actions.iter().map(|a| a.content.as_str()).collect()
    }

    #[test]
    fn test_fap_failure_abandons_after_tables() {
        let ctx = ctx(&["H1"], vec![ClassifierConfig::new("ovl").with_channel_activity()]);
        let config = IdqConfig {
            fap: StepSpec::new(5.0, 1.0, 0.0),
            ..Default::default()
        };

        let (actions, store) = generate(config, &ctx, 7);

        assert_eq!(
            contents(&actions),
            vec![
                "Started Searching for iDQ information within [1000, 1010] at H1",
                "iDQ glitch tables H1:",
            ]
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_full_traversal_in_step_order() {
        let ctx = ctx(&["H1"], vec![ClassifierConfig::new("ovl").with_channel_activity()]);

        let (actions, store) = generate(IdqConfig::default(), &ctx, 7);

        let contents = contents(&actions);
        assert_eq!(contents.len(), 15);
        assert!(contents[0].starts_with("Started Searching"));
        assert_eq!(contents[1], "iDQ glitch tables H1:");
        assert!(contents[2].starts_with("minimum glitch-FAP for ovl at H1 within [1000, 1010] is "));
        assert!(contents[3].starts_with("iDQ fap timeseries"));
        assert!(contents[4].starts_with("iDQ glitch-rank frame"));
        assert!(contents[5].starts_with("iDQ fap and glitch-rank timeseries plot"));
        assert!(contents[6].starts_with("iDQ (possible) active channels"));
        assert!(contents[7].starts_with("iDQ channel strip chart"));
        assert!(contents[8].starts_with("iDQ calibration sanity check for"));
        assert!(contents[9].starts_with("iDQ calibration sanity check figure"));
        assert_eq!(contents[10], "iDQ local ROC curves for ovl at H1");
        assert_eq!(contents[11], "iDQ local ROC figure for ovl at H1");
        assert!(contents[12].starts_with("iDQ local calibration vital statistics"));
        assert!(contents[13].starts_with("iDQ local training vital statistics"));
        assert_eq!(contents[14], "Finished searching for iDQ information within [1000, 1010] at H1");

        let finished = actions[14].offset;
        assert!(actions.iter().all(|a| a.offset <= finished));
        assert_eq!(store.len(), 13);
    }

    #[test]
    fn test_channel_activity_requires_capability() {
        let ctx = ctx(&["L1"], vec![ClassifierConfig::new("ovl")]);

        let (actions, store) = generate(IdqConfig::default(), &ctx, 7);

        assert_eq!(actions.len(), 13);
        assert!(actions.iter().all(|a| !a.content.contains("active channels")));
        assert_eq!(store.len(), 11);
    }

    #[test]
    fn test_companion_artifacts_share_timestamp() {
        let ctx = ctx(&["H1"], vec![ClassifierConfig::new("mvsc")]);

        let (actions, _) = generate(IdqConfig::default(), &ctx, 3);

        let gwf: Vec<_> = actions
            .iter()
            .filter(|a| a.artifact().and_then(|p| p.extension()).map_or(false, |e| e == "gwf"))
            .collect();
        assert_eq!(gwf.len(), 2);
        assert_eq!(gwf[0].offset, gwf[1].offset);
        let names: Vec<_> = gwf
            .iter()
            .map(|a| a.artifact().unwrap().file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["H1_idq_mvsc_fap-1000-10.gwf", "H1_idq_mvsc_rank-1000-10.gwf"]);
    }

    #[test]
    fn test_second_classifier_continues_cursor() {
        let ctx = ctx(&["H1"], vec![ClassifierConfig::new("ovl"), ClassifierConfig::new("mvsc")]);

        let (actions, _) = generate(IdqConfig::default(), &ctx, 11);

        assert_eq!(actions.len(), 1 + 11 + 11 + 1);
        let last_ovl = actions.iter().rposition(|a| a.content.contains("for ovl")).unwrap();
        let first_mvsc = actions.iter().position(|a| a.content.contains("mvsc")).unwrap();
        assert!(last_ovl < first_mvsc);
        assert!(actions[last_ovl].offset <= actions[first_mvsc].offset);
    }

    #[test]
    fn test_failed_classifier_silences_the_rest() {
        let ctx = ctx(&["H1"], vec![ClassifierConfig::new("ovl"), ClassifierConfig::new("mvsc")]);
        let config = IdqConfig {
            stats: StepSpec::new(30.0, 5.0, 0.0),
            ..Default::default()
        };

        let (actions, _) = generate(config, &ctx, 11);

        assert!(actions.iter().all(|a| !a.content.contains("mvsc")));
        assert!(actions.iter().all(|a| !a.content.starts_with("Finished")));
    }

    #[test]
    fn test_instruments_are_independent_chains() {
        let ctx = ctx(&["H1", "L1"], vec![ClassifierConfig::new("ovl")]);
        let config = IdqConfig::default();

        let (actions, _) = generate(config, &ctx, 5);

        let starts = actions.iter().filter(|a| a.content.starts_with("Started")).count();
        let finishes = actions.iter().filter(|a| a.content.starts_with("Finished")).count();
        assert_eq!(starts, 2);
        assert_eq!(finishes, 2);
    }

    #[test]
    fn test_no_start_means_no_classifier_work() {
        let ctx = ctx(&["H1"], vec![ClassifierConfig::new("ovl")]);
        let config = IdqConfig {
            start: StepSpec::new(1.0, 0.5, 0.0),
            ..Default::default()
        };

        let (actions, store) = generate(config, &ctx, 5);

        assert!(actions.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_no_classifiers_still_finishes() {
        let ctx = ctx(&["V1"], vec![]);

        let (actions, _) = generate(IdqConfig::default(), &ctx, 5);

        assert_eq!(actions.len(), 2);
        assert!(actions[1].content.starts_with("Finished"));
        assert_eq!(actions[0].offset, actions[1].offset);
    }

    #[test]
    fn test_invalid_fap_range() {
        let err = Idq::new(IdqConfig {
            min_fap: 0.0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidFapRange { .. }));

        let err = Idq::new(IdqConfig {
            min_fap: 0.5,
            max_fap: 0.1,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidFapRange { .. }));
    }

    #[test]
    fn test_all_probabilities_zero_schedules_nothing() {
        let ctx = ctx(&["H1", "L1"], vec![ClassifierConfig::new("ovl").with_channel_activity()]);
        let config = IdqConfig::default().with_all_probabilities(0.0);
        assert_eq!(config.stats.mean_delay, 30.0);

        let (actions, store) = generate(config, &ctx, 5);

        assert!(actions.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_all_probabilities_one_fully_traverses() {
        let ctx = ctx(&["H1"], vec![ClassifierConfig::new("mvsc")]);
        let config = IdqConfig {
            fap: StepSpec::new(5.0, 1.0, 0.0),
            roc: StepSpec::new(20.0, 5.0, 0.3),
            ..Default::default()
        }
        .with_all_probabilities(1.0);

        let (actions, store) = generate(config, &ctx, 5);

        assert_eq!(actions.len(), 13);
        assert_eq!(store.len(), 11);
    }

    proptest! {
        #[test]
        fn prop_fap_within_bounds(seed in any::<u64>(), exp_lo in -8i32..0, width in 0i32..8) {
            let min = 10f64.powi(exp_lo);
            let max = (min * 10f64.powi(width)).min(1.0);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let fap = draw_fap(&mut rng, min, max);
            // ln/exp roundtrip may drift by an ulp
            prop_assert!(fap >= min * (1.0 - 1e-12) && fap <= max * (1.0 + 1e-12));
        }

        #[test]
        fn prop_full_run_count(seed in any::<u64>()) {
            let ctx = ctx(&["H1"], vec![ClassifierConfig::new("ovl").with_channel_activity()]);
            let (actions, _) = generate(IdqConfig::default(), &ctx, seed);
            prop_assert_eq!(actions.len(), 15);
            prop_assert!(actions.windows(2).all(|w| w[0].offset <= w[1].offset));
        }
    }
}
