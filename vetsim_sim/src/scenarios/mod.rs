//! Scenario definitions.
//!
//! Each scenario models one simulated subsystem interacting with the
//! vetting service and produces its actions through the chain engine.

pub mod idq;
pub mod segdb;
pub mod signoff;
pub mod virgo;

use crate::context::EventContext;
use crate::error::SimError;
use rand::RngCore;
use vetsim_env::{Action, ArtifactStore};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// Segment-database upload sequence
    SegDb,

    /// Multi-instrument, multi-classifier iDQ sequence
    Idq,

    /// Virgo interferometer status sequence
    VirgoDq,

    /// Site operator and advocate signoffs
    Signoff,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SegDb,
            ScenarioId::Idq,
            ScenarioId::VirgoDq,
            ScenarioId::Signoff,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SegDb => "segdb",
            ScenarioId::Idq => "idq",
            ScenarioId::VirgoDq => "virgo_dq",
            ScenarioId::Signoff => "signoff",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SegDb => "Segment-database query: start, one upload per flag, finish",
            ScenarioId::Idq => "iDQ per instrument: start, per-classifier products, finish",
            ScenarioId::VirgoDq => "V1 detchar: status, veto, band-RMS and injection checks",
            ScenarioId::Signoff => "Operator and advocate signoff requests and responses",
        }
    }

    /// Stable index used to derive per-scenario seeds.
    pub fn index(&self) -> u64 {
        match self {
            ScenarioId::SegDb => 0,
            ScenarioId::Idq => 1,
            ScenarioId::VirgoDq => 2,
            ScenarioId::Signoff => 3,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "segdb" | "segdb2grcdb" => Ok(ScenarioId::SegDb),
            "idq" => Ok(ScenarioId::Idq),
            "virgo_dq" | "virgodq" | "virgo" => Ok(ScenarioId::VirgoDq),
            "signoff" | "signoffs" | "humans" => Ok(ScenarioId::Signoff),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

/// A simulated subsystem that generates a schedule of actions.
///
/// Implementations own only their configuration. All randomness comes from
/// the `rng` handle, so a seeded handle reproduces the same actions.
pub trait Scenario {
    /// Which scenario this is.
    fn id(&self) -> ScenarioId;

    /// Generates this scenario's actions in production order.
    ///
    /// Placeholder artifacts referenced by the actions are created through
    /// `store` as they are generated.
    fn generate(
        &self,
        rng: &mut dyn RngCore,
        ctx: &EventContext,
        store: &dyn ArtifactStore,
    ) -> Result<Vec<Action>, SimError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_scenario_names_roundtrip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>().unwrap(), id);
            assert!(!id.description().is_empty());
        }
        assert!("ligo".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_scenario_indices_are_distinct() {
        let indices: HashSet<u64> = ScenarioId::all().iter().map(|id| id.index()).collect();
        assert_eq!(indices.len(), ScenarioId::all().len());
    }
}
