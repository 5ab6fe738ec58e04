//! VetSim Stochastic Schedule Generator
//!
//! This crate produces plausible, causally consistent sequences of
//! timestamped actions (log entries, labels, signoffs) that an automated
//! candidate-vetting pipeline would see for one detected event, without
//! real detector data or real humans in the loop.
//!
//! # Core Principle: Seeded Probabilistic Chains
//!
//! Every scenario is built from the same engine:
//! - **Occurrence**: each candidate step happens with its own probability
//! - **Timing**: realised steps advance a cursor by a clamped normal delay
//! - **Abandonment**: a failed required step ends its chain, and the
//!   "finished" message is only emitted after a full traversal
//! - **Randomness**: all draws come from a `ChaCha8Rng` derived from a
//!   single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                       │
//! │   master seed ──► per-scenario ChaCha8Rng                 │
//! │       │                                                   │
//! │  ┌────▼────┐  ┌─────────┐  ┌──────────┐  ┌───────────┐    │
//! │  │  SegDb  │  │   Idq   │  │ VirgoDq  │  │  Signoff  │    │
//! │  └────┬────┘  └────┬────┘  └────┬─────┘  └─────┬─────┘    │
//! │       └────────────┴─── Chain ──┴──────────────┘          │
//! │                        │                                  │
//! │        ActionBuilder + ArtifactNamer (ArtifactStore)      │
//! └────────────────────────┬──────────────────────────────────┘
//!                          ▼
//!               ActionSink (Schedule) ──► sorted()
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use vetsim_sim::{GeneratorConfig, ScenarioRunner, ScenarioId};
//! use vetsim_env::{MemoryArtifactStore, Schedule};
//!
//! let runner = ScenarioRunner::new(42, GeneratorConfig::default())?;
//! let schedule = Schedule::new();
//! runner.run_all(&ScenarioId::all(), &MemoryArtifactStore::new(), &schedule)?;
//! for action in schedule.sorted() {
//!     println!("{:>8.2} {}", action.offset, action.content);
//! }
//! ```

mod action;
mod artifacts;
pub mod chain;
mod config;
mod context;
mod error;
mod exporter;
mod runner;
pub mod scenarios;

pub use action::ActionBuilder;
pub use artifacts::ArtifactNamer;
pub use chain::{Chain, ChainOutcome, ChainRun, Gate, StepDraw, StepSpec};
pub use config::{ClassifierConfig, EventConfig, GeneratorConfig};
pub use context::EventContext;
pub use error::SimError;
pub use exporter::{ScenarioSummary, ScheduleExport};
pub use runner::{ScenarioResult, ScenarioRunner};
pub use scenarios::{Scenario, ScenarioId};
