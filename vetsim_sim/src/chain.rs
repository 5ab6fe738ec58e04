//! Probabilistic chain engine.
//!
//! A chain is an ordered list of candidate steps. Each step is gated by an
//! independent occurrence draw and, when realised, advances a simulated-time
//! cursor by a jittered, non-negative delay before emitting its actions.
//!
//! ```text
//!  cursor ──► [start] ──► [tables] ──► [fap] ─ ✗ ──► Abandoned
//!               │            │
//!             emit         emit
//! ```
//!
//! The abandonment rule is carried explicitly as a `ChainOutcome` value from
//! one step to the next. A completion action (a "finished" message) is only
//! emitted when every step was evaluated without abandonment.

use crate::error::SimError;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vetsim_env::Action;

/// Timing and occurrence configuration for one candidate step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    /// Mean delay in simulated seconds (>= 0)
    pub mean_delay: f64,

    /// Standard deviation of the delay (>= 0)
    pub jitter: f64,

    /// Probability that the step happens at all, in [0, 1]
    pub probability: f64,
}

impl StepSpec {
    pub const fn new(mean_delay: f64, jitter: f64, probability: f64) -> Self {
        Self {
            mean_delay,
            jitter,
            probability,
        }
    }

    /// A step that always happens.
    pub const fn certain(mean_delay: f64, jitter: f64) -> Self {
        Self::new(mean_delay, jitter, 1.0)
    }

    /// Checks the spec's ranges.
    pub fn validate(&self, step: &str) -> Result<(), SimError> {
        if !(self.mean_delay >= 0.0) || !self.mean_delay.is_finite() {
            return Err(SimError::invalid_step(
                step,
                format!("mean delay must be finite and >= 0, got {}", self.mean_delay),
            ));
        }
        if !(self.jitter >= 0.0) || !self.jitter.is_finite() {
            return Err(SimError::invalid_step(
                step,
                format!("jitter must be finite and >= 0, got {}", self.jitter),
            ));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(SimError::invalid_step(
                step,
                format!("probability must lie in [0, 1], got {}", self.probability),
            ));
        }
        Ok(())
    }

    /// Draws the occurrence of this step: `u ~ U(0,1)`, happens iff `u < p`.
    pub fn occurs<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.probability
    }

    /// Draws a realised delay for this step.
    pub fn delay<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        jittered_delay(rng, self.mean_delay, self.jitter)
    }
}

/// Draws `max(0, Normal(mean, std_dev))`.
///
/// The underlying normal draw may be negative; the realised delay never is.
pub fn jittered_delay<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    // Normal::new only rejects negative or non-finite deviations, which
    // StepSpec::validate keeps out of any running chain
    let draw = Normal::new(mean, std_dev)
        .map(|normal| normal.sample(rng))
        .unwrap_or(mean);
    draw.max(0.0)
}

/// How a failed occurrence draw affects the rest of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Failure abandons the chain: no further steps, no completion
    Required,
    /// Failure skips only this step: no delay, no action
    Independent,
    /// The step always happens; the draw selects which content it emits
    Branch,
}

/// What a step's emitter is told when it fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDraw {
    /// Cursor after this step's delay
    pub at: f64,
    /// Result of the occurrence draw (always true unless the gate is `Branch`)
    pub hit: bool,
}

/// State threaded from one step to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChainOutcome {
    /// All steps so far passed; holds the running cursor
    Continuing(f64),
    /// A required step failed its draw
    Abandoned,
}

type Emitter<'a> = Box<dyn FnOnce(StepDraw, &mut dyn RngCore) -> Result<Vec<Action>, SimError> + 'a>;
type Completion<'a> = Box<dyn FnOnce(f64) -> Result<Vec<Action>, SimError> + 'a>;

struct Step<'a> {
    name: String,
    spec: StepSpec,
    gate: Gate,
    emit: Emitter<'a>,
}

impl Step<'_> {
    fn evaluate(
        self,
        rng: &mut dyn RngCore,
        cursor: f64,
        out: &mut Vec<Action>,
    ) -> Result<ChainOutcome, SimError> {
        let hit = self.spec.occurs(&mut *rng);
        match (self.gate, hit) {
            (Gate::Required, false) => return Ok(ChainOutcome::Abandoned),
            (Gate::Independent, false) => return Ok(ChainOutcome::Continuing(cursor)),
            _ => {}
        }

        let at = cursor + self.spec.delay(&mut *rng);
        out.extend((self.emit)(StepDraw { at, hit }, rng)?);
        Ok(ChainOutcome::Continuing(at))
    }
}

/// Result of running a chain.
#[derive(Debug, Clone)]
pub struct ChainRun {
    /// Emitted actions in production order
    pub actions: Vec<Action>,

    /// Outcome after the last evaluated step
    pub outcome: ChainOutcome,

    /// Cursor after the last realised step
    pub final_offset: f64,
}

impl ChainRun {
    /// Returns true if no required step failed.
    pub fn completed(&self) -> bool {
        matches!(self.outcome, ChainOutcome::Continuing(_))
    }
}

/// An ordered chain of probabilistic steps.
pub struct Chain<'a> {
    name: String,
    steps: Vec<Step<'a>>,
    completion: Option<Completion<'a>>,
}

impl<'a> Chain<'a> {
    /// Creates an empty chain.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            completion: None,
        }
    }

    fn push(mut self, name: impl Into<String>, spec: StepSpec, gate: Gate, emit: Emitter<'a>) -> Self {
        self.steps.push(Step {
            name: name.into(),
            spec,
            gate,
            emit,
        });
        self
    }

    /// Appends a step whose failure abandons the chain.
    pub fn step<F>(self, name: impl Into<String>, spec: StepSpec, emit: F) -> Self
    where
        F: FnOnce(StepDraw) -> Result<Vec<Action>, SimError> + 'a,
    {
        self.push(name, spec, Gate::Required, Box::new(move |d: StepDraw, _: &mut dyn RngCore| emit(d)))
    }

    /// Appends a required step whose emitter makes further random draws
    /// (e.g. the value it reports).
    pub fn step_drawing<F>(self, name: impl Into<String>, spec: StepSpec, emit: F) -> Self
    where
        F: FnOnce(StepDraw, &mut dyn RngCore) -> Result<Vec<Action>, SimError> + 'a,
    {
        self.push(name, spec, Gate::Required, Box::new(emit))
    }

    /// Appends a step whose failure only skips itself.
    pub fn independent<F>(self, name: impl Into<String>, spec: StepSpec, emit: F) -> Self
    where
        F: FnOnce(StepDraw) -> Result<Vec<Action>, SimError> + 'a,
    {
        self.push(name, spec, Gate::Independent, Box::new(move |d: StepDraw, _: &mut dyn RngCore| emit(d)))
    }

    /// Appends a step that always fires; `StepDraw::hit` selects its content.
    pub fn branch<F>(self, name: impl Into<String>, spec: StepSpec, emit: F) -> Self
    where
        F: FnOnce(StepDraw) -> Result<Vec<Action>, SimError> + 'a,
    {
        self.push(name, spec, Gate::Branch, Box::new(move |d: StepDraw, _: &mut dyn RngCore| emit(d)))
    }

    /// Appends every step of `other`, which continues from this chain's cursor.
    ///
    /// `other`'s completion action, if any, is dropped: only the outer
    /// chain decides what "finished" means.
    pub fn then(mut self, other: Chain<'a>) -> Self {
        self.steps.extend(other.steps);
        self
    }

    /// Sets the action emitted at the final cursor when no step abandoned.
    pub fn on_complete<F>(mut self, complete: F) -> Self
    where
        F: FnOnce(f64) -> Result<Vec<Action>, SimError> + 'a,
    {
        self.completion = Some(Box::new(complete));
        self
    }

    /// Validates every step spec without drawing anything.
    pub fn validate(&self) -> Result<(), SimError> {
        for step in &self.steps {
            step.spec.validate(&format!("{}/{}", self.name, step.name))?;
        }
        Ok(())
    }

    /// Runs the chain from `start`.
    ///
    /// Steps are evaluated strictly in order and each draw is consumed
    /// exactly once. An empty chain emits nothing, not even its completion.
    pub fn run(self, rng: &mut dyn RngCore, start: f64) -> Result<ChainRun, SimError> {
        self.validate()?;

        let mut actions = Vec::new();
        let mut outcome = ChainOutcome::Continuing(start);
        let mut cursor = start;

        if self.steps.is_empty() {
            return Ok(ChainRun {
                actions,
                outcome,
                final_offset: cursor,
            });
        }

        for step in self.steps {
            let name = step.name.clone();
            outcome = step.evaluate(&mut *rng, cursor, &mut actions)?;
            match outcome {
                ChainOutcome::Continuing(next) => cursor = next,
                ChainOutcome::Abandoned => {
                    debug!("chain {} abandoned at step {} (t={:.3})", self.name, name, cursor);
                    break;
                }
            }
        }

        if let (ChainOutcome::Continuing(end), Some(complete)) = (outcome, self.completion) {
            actions.extend(complete(end)?);
        }

        Ok(ChainRun {
            actions,
            outcome,
            final_offset: cursor,
        })
    }
}

impl std::fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| s.name.as_str()).collect::<Vec<_>>())
            .field("has_completion", &self.completion.is_some())
            .finish()
    }
}
