//! VetSim Schedule Generator CLI
//!
//! Generate seeded vetting schedules for one simulated candidate event.

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;
use vetsim_env::{ArtifactStore, FsArtifactStore, MemoryArtifactStore, Schedule};
use vetsim_sim::{GeneratorConfig, ScenarioId, ScenarioResult, ScenarioRunner, ScheduleExport};

/// VetSim stochastic schedule generator
#[derive(Parser, Debug)]
#[command(name = "vetsim")]
#[command(about = "Generate seeded test schedules for the candidate-vetting pipeline", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// JSON configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario to run (segdb, idq, virgo_dq, signoff, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Base directory for placeholder artifacts (overrides the config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Record artifact names without touching the filesystem
    #[arg(long)]
    dry_run: bool,

    /// Export the sorted schedule to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// JSON summary for scripting
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("VetSim schedule generator v{}", env!("CARGO_PKG_VERSION"));
    }

    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_path(path)
            .unwrap_or_else(|e| fail(format!("{}: {}", path.display(), e))),
        None => GeneratorConfig::default(),
    };
    if let Some(dir) = &args.output_dir {
        config.event.artifact_dir = dir.clone();
    }

    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available scenarios: segdb, idq, virgo_dq, signoff, all");
            std::process::exit(1);
        })]
    };

    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let runner = ScenarioRunner::new(seed, config).unwrap_or_else(|e| fail(e));
    debug!(
        "event {} span={} instruments={:?}",
        runner.context().event(),
        runner.context().span_label(),
        runner.context().instruments()
    );

    let memory = MemoryArtifactStore::new();
    let store: &dyn ArtifactStore = if args.dry_run { &memory } else { &FsArtifactStore };

    let schedule = Schedule::new();
    let mut results: Vec<ScenarioResult> = Vec::new();
    for scenario in &scenarios {
        match runner.run(*scenario, store, &schedule) {
            Ok(result) => {
                if !args.json {
                    info!(
                        "✓ {} (seed={}) {} actions, {} artifacts",
                        scenario.name(),
                        seed,
                        result.actions,
                        result.artifacts
                    );
                }
                results.push(result);
            }
            Err(e) => {
                error!("✗ {} (seed={}) FAILED: {}", scenario.name(), seed, e);
                std::process::exit(1);
            }
        }
    }

    let actions = schedule.into_sorted();

    if args.verbose && !args.json {
        for action in &actions {
            debug!("  t={:>8.2}s {:<7} {}", action.offset, action.kind, action.content);
        }
    }

    if let Some(path) = &args.export {
        let export = ScheduleExport::new(&runner)
            .with_results(&results)
            .with_actions(actions.clone());
        if let Err(e) = export.write_to_file(path) {
            error!("Failed to write export: {:?}", e);
            std::process::exit(1);
        }
        info!("Exported {} actions to {}", export.actions.len(), path.display());
    }

    let horizon = actions.last().map(|a| a.offset);

    if args.json {
        let summary = serde_json::json!({
            "seed": seed,
            "graceid": runner.context().event().graceid,
            "folder": runner.context().event().folder(),
            "dry_run": args.dry_run,
            "total_actions": actions.len(),
            "horizon": horizon,
            "results": results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "actions": r.actions,
                    "artifacts": r.artifacts,
                    "horizon": r.horizon,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(e),
        }
    } else {
        info!(
            "{} actions across {} scenario(s), last at t={:.2}s",
            actions.len(),
            results.len(),
            horizon.unwrap_or(0.0)
        );
        if args.dry_run {
            info!("Dry run: {} placeholder artifacts not written", memory.len());
        }
    }
}
