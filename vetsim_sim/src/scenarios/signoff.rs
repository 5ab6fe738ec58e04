//! Operator and advocate signoff scenario.
//!
//! Each reviewer is asked for a signoff with a request label and answers
//! with a signoff action. Request and response delays are both drawn from
//! scenario start rather than chained; the response is then clamped so it
//! never precedes its own request.

use super::{Scenario, ScenarioId};
use crate::action::ActionBuilder;
use crate::chain::StepSpec;
use crate::context::EventContext;
use crate::error::SimError;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vetsim_env::{Action, ArtifactStore, Signoff, SignoffOutcome};

/// Interferometer sites whose operators can sign off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    H1,
    L1,
    V1,
}

impl Site {
    /// Returns all known sites.
    pub fn all() -> Vec<Site> {
        vec![Site::H1, Site::L1, Site::V1]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Site::H1 => "H1",
            Site::L1 => "L1",
            Site::V1 => "V1",
        }
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Site {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H1" => Ok(Site::H1),
            "L1" => Ok(Site::L1),
            "V1" => Ok(Site::V1),
            _ => Err(SimError::UnknownSite(s.to_string())),
        }
    }
}

/// Someone asked to sign off on a candidate.
///
/// Serialized as the site name (`"H1"`) or `"ADV"` for the advocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Reviewer {
    /// Operator at one interferometer site
    Site(Site),
    /// Follow-up advocate, not tied to a site
    Advocate,
}

impl Reviewer {
    const ADVOCATE: &'static str = "ADV";

    /// Creates a site reviewer.
    ///
    /// # Errors
    /// `SimError::UnknownSite` unless `name` is one of `H1`, `L1`, `V1`.
    pub fn site(name: &str) -> Result<Self, SimError> {
        Ok(Reviewer::Site(name.parse()?))
    }

    pub fn advocate() -> Self {
        Reviewer::Advocate
    }

    /// Returns the reviewer's short name.
    pub fn name(&self) -> &'static str {
        match self {
            Reviewer::Site(site) => site.name(),
            Reviewer::Advocate => Self::ADVOCATE,
        }
    }

    /// Label applied to request a signoff from this reviewer.
    pub fn request_label(&self) -> String {
        match self {
            Reviewer::Site(site) => format!("{}OPS", site),
            Reviewer::Advocate => format!("{}REQ", Self::ADVOCATE),
        }
    }

    /// Instrument the signoff is recorded against.
    pub fn instrument(&self) -> &'static str {
        match self {
            Reviewer::Site(site) => site.name(),
            Reviewer::Advocate => "",
        }
    }

    pub fn signoff_type(&self) -> &'static str {
        match self {
            Reviewer::Site(_) => "OP",
            Reviewer::Advocate => "ADV",
        }
    }
}

impl std::fmt::Display for Reviewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<String> for Reviewer {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == Self::ADVOCATE {
            Ok(Reviewer::Advocate)
        } else {
            Reviewer::site(&value)
        }
    }
}

impl From<Reviewer> for String {
    fn from(reviewer: Reviewer) -> Self {
        reviewer.name().to_string()
    }
}

/// Request and response timing for one reviewer.
///
/// Setting a step's probability to zero switches that half off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignoffConfig {
    pub request: StepSpec,

    pub respond: StepSpec,

    /// Probability that a response is "OK" rather than "NO"
    pub success_probability: f64,
}

impl Default for SignoffConfig {
    fn default() -> Self {
        Self {
            request: StepSpec::certain(0.0, 0.0),
            respond: StepSpec::certain(60.0, 10.0),
            success_probability: 1.0,
        }
    }
}

impl SignoffConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        self.request.validate("signoff/request")?;
        self.respond.validate("signoff/respond")?;
        if !(0.0..=1.0).contains(&self.success_probability) {
            return Err(SimError::invalid_step(
                "signoff/outcome",
                format!(
                    "probability must lie in [0, 1], got {}",
                    self.success_probability
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerConfig {
    pub reviewer: Reviewer,

    #[serde(default)]
    pub timing: SignoffConfig,
}

impl ReviewerConfig {
    pub fn new(reviewer: Reviewer) -> Self {
        Self {
            reviewer,
            timing: SignoffConfig::default(),
        }
    }

    pub fn with_timing(mut self, timing: SignoffConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Both LIGO site operators plus the advocate.
    pub fn default_panel() -> Vec<ReviewerConfig> {
        vec![
            ReviewerConfig::new(Reviewer::Site(Site::H1)),
            ReviewerConfig::new(Reviewer::Site(Site::L1)),
            ReviewerConfig::new(Reviewer::Advocate),
        ]
    }
}

/// Generates one reviewer's request and response.
///
/// Draw order: request occurrence, request delay, response occurrence,
/// response delay, outcome.
pub fn reviewer_actions(
    config: &ReviewerConfig,
    rng: &mut dyn RngCore,
    builder: ActionBuilder<'_>,
) -> Vec<Action> {
    let reviewer = config.reviewer;
    let timing = &config.timing;
    let mut actions = Vec::with_capacity(2);

    let requested_at = if timing.request.occurs(&mut *rng) {
        let at = timing.request.delay(&mut *rng);
        actions.push(builder.label(at, reviewer.request_label()));
        Some(at)
    } else {
        None
    };

    if timing.respond.occurs(&mut *rng) {
        let drawn = timing.respond.delay(&mut *rng);
        let at = requested_at.map_or(drawn, |req| drawn.max(req));
        let outcome = if rng.gen::<f64>() < timing.success_probability {
            SignoffOutcome::Ok
        } else {
            SignoffOutcome::No
        };
        let signoff = Signoff {
            instrument: reviewer.instrument().to_string(),
            signoff_type: reviewer.signoff_type().to_string(),
            outcome,
        };
        actions.push(builder.signoff(at, signoff));
    }

    actions
}

/// Every configured reviewer, each drawn independently.
#[derive(Debug, Clone)]
pub struct SignoffPanel {
    reviewers: Vec<ReviewerConfig>,
}

impl SignoffPanel {
    pub fn new(reviewers: Vec<ReviewerConfig>) -> Result<Self, SimError> {
        for reviewer in &reviewers {
            reviewer.timing.validate()?;
        }
        Ok(Self { reviewers })
    }
}

impl Scenario for SignoffPanel {
    fn id(&self) -> ScenarioId {
        ScenarioId::Signoff
    }

    fn generate(
        &self,
        rng: &mut dyn RngCore,
        ctx: &EventContext,
        _store: &dyn ArtifactStore,
    ) -> Result<Vec<Action>, SimError> {
        let builder = ActionBuilder::new(ctx);
        let mut actions = Vec::new();

        for config in &self.reviewers {
            let produced = reviewer_actions(config, &mut *rng, builder);
            debug!("signoff: {} produced {} actions", config.reviewer, produced.len());
            actions.extend(produced);
        }

        Ok(actions)
    }
}
