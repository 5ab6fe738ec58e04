//! Common types for the VetSim environment abstraction.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Default upload endpoint annotated on every generated action.
pub const DEFAULT_ENDPOINT: &str = "https://gracedb.ligo.org/api/";

/// Handle to the candidate event a scenario targets.
///
/// Carries the event's identifier plus a random token that names the
/// folder holding every artifact generated for this event. The token is
/// drawn once and reused, so all artifacts of one run share a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventHandle {
    /// Event identifier as known to the vetting service
    pub graceid: String,

    /// Random per-event folder token
    pub token: Uuid,
}

impl EventHandle {
    /// Creates a handle with a token drawn from OS entropy.
    pub fn new(graceid: impl Into<String>) -> Self {
        Self {
            graceid: graceid.into(),
            token: Uuid::new_v4(),
        }
    }

    /// Creates a handle with a token drawn from the supplied generator.
    ///
    /// Used by the simulation so that a seeded run always produces the
    /// same folder names.
    pub fn generate<R: Rng + ?Sized>(graceid: impl Into<String>, rng: &mut R) -> Self {
        let bytes: [u8; 16] = rng.gen();
        Self {
            graceid: graceid.into(),
            token: uuid::Builder::from_random_bytes(bytes).into_uuid(),
        }
    }

    /// Creates a handle from an explicit token.
    pub fn from_token(graceid: impl Into<String>, token: Uuid) -> Self {
        Self {
            graceid: graceid.into(),
            token,
        }
    }

    /// Returns the folder name used for this event's artifacts.
    pub fn folder(&self) -> String {
        self.token.simple().to_string()
    }
}

impl std::fmt::Display for EventHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars of the token for readability
        write!(f, "{}[{}]", self.graceid, &self.folder()[..8])
    }
}

/// What a downstream dispatcher should do with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Write a log entry (optionally with an attached file)
    Log,
    /// Apply a label
    Label,
    /// Record a signoff
    Signoff,
}

impl ActionKind {
    /// Returns the kind name.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Log => "log",
            ActionKind::Label => "label",
            ActionKind::Signoff => "signoff",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of a signoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignoffOutcome {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NO")]
    No,
}

impl std::fmt::Display for SignoffOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignoffOutcome::Ok => write!(f, "OK"),
            SignoffOutcome::No => write!(f, "NO"),
        }
    }
}

/// Signoff payload carried by `ActionKind::Signoff` actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signoff {
    /// Instrument the signoff applies to (empty for advocates)
    pub instrument: String,

    /// Signoff type (e.g. "OP", "ADV")
    pub signoff_type: String,

    pub outcome: SignoffOutcome,
}

/// A timestamped action destined for the vetting service.
///
/// Created once by the generator and never mutated afterwards; ownership
/// passes to whichever `ActionSink` receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,

    /// Target event
    pub event: EventHandle,

    /// Destination endpoint for the downstream dispatcher
    pub endpoint: String,

    /// Simulated seconds since scenario start
    pub offset: f64,

    /// Log message, label name or signoff comment
    pub content: String,

    /// Placeholder file attached to the action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub signoff: Option<Signoff>,
}

impl Action {
    /// Creates a new action without attachments.
    pub fn new(
        kind: ActionKind,
        event: EventHandle,
        endpoint: impl Into<String>,
        offset: f64,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            event,
            endpoint: endpoint.into(),
            offset,
            content: content.into(),
            artifact: None,
            signoff: None,
        }
    }

    /// Attaches an artifact path.
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact = Some(path.into());
        self
    }

    /// Attaches a signoff payload.
    pub fn with_signoff(mut self, signoff: Signoff) -> Self {
        self.signoff = Some(signoff);
        self
    }

    /// Returns the attached artifact path, if any.
    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_event_handle_seeded_token_is_deterministic() {
        let mut rng1 = ChaCha8Rng::seed_from_u64(7);
        let mut rng2 = ChaCha8Rng::seed_from_u64(7);

        let a = EventHandle::generate("G1", &mut rng1);
        let b = EventHandle::generate("G1", &mut rng2);

        assert_eq!(a, b);
        assert_eq!(a.folder().len(), 32);
    }

    #[test]
    fn test_event_handle_tokens_differ() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let a = EventHandle::generate("G1", &mut rng);
        let b = EventHandle::generate("G2", &mut rng);

        assert_ne!(a.folder(), b.folder());
        assert_ne!(EventHandle::new("G1").folder(), EventHandle::new("G1").folder());
    }

    #[test]
    fn test_action_attachments() {
        let event = EventHandle::new("G1");
        let action = Action::new(ActionKind::Log, event, DEFAULT_ENDPOINT, 1.5, "hello")
            .with_artifact("out/a.json");

        assert_eq!(action.artifact(), Some(Path::new("out/a.json")));
        assert!(action.signoff.is_none());
        assert_eq!(action.kind.to_string(), "log");
    }

    #[test]
    fn test_signoff_outcome_display() {
        assert_eq!(SignoffOutcome::Ok.to_string(), "OK");
        assert_eq!(SignoffOutcome::No.to_string(), "NO");
    }
}
