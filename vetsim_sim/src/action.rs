//! Action builder.

use crate::context::EventContext;
use std::path::PathBuf;
use vetsim_env::{Action, ActionKind, Signoff};

/// Builds timestamped actions addressed to one event.
///
/// Pure: holds no randomness and never fails. Every action it produces is
/// annotated with the context's event handle and endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ActionBuilder<'a> {
    ctx: &'a EventContext,
}

impl<'a> ActionBuilder<'a> {
    pub fn new(ctx: &'a EventContext) -> Self {
        Self { ctx }
    }

    /// Builds an action of any kind.
    pub fn build(
        &self,
        kind: ActionKind,
        offset: f64,
        content: impl Into<String>,
        artifact: Option<PathBuf>,
        signoff: Option<Signoff>,
    ) -> Action {
        let mut action = Action::new(
            kind,
            self.ctx.event().clone(),
            self.ctx.endpoint(),
            offset,
            content,
        );
        if let Some(path) = artifact {
            action = action.with_artifact(path);
        }
        if let Some(signoff) = signoff {
            action = action.with_signoff(signoff);
        }
        action
    }

    /// Log entry without attachment.
    pub fn log(&self, offset: f64, message: impl Into<String>) -> Action {
        self.build(ActionKind::Log, offset, message, None, None)
    }

    /// Log entry with an attached artifact.
    pub fn log_file(&self, offset: f64, message: impl Into<String>, artifact: PathBuf) -> Action {
        self.build(ActionKind::Log, offset, message, Some(artifact), None)
    }

    pub fn label(&self, offset: f64, name: impl Into<String>) -> Action {
        self.build(ActionKind::Label, offset, name, None, None)
    }

    pub fn signoff(&self, offset: f64, signoff: Signoff) -> Action {
        let content = format!(
            "{} signoff{}{}: {}",
            signoff.signoff_type,
            if signoff.instrument.is_empty() { "" } else { " for " },
            signoff.instrument,
            signoff.outcome,
        );
        self.build(ActionKind::Signoff, offset, content, None, Some(signoff))
    }
}
