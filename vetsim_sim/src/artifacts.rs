//! Placeholder artifact naming.
//!
//! Artifacts follow a fixed convention:
//!
//! ```text
//! <directory>/<event folder>/<subsystem>_<qualifier>-<start>-<duration>.<ext>
//! ```
//!
//! The event folder is the random token of the target event, so every
//! artifact of one run lands in the same folder and runs against different
//! events never collide. `:` in the stem becomes `_` (channel and flag
//! names such as `H1:DMT-ANALYSIS_READY:1` are not path friendly).

use crate::context::EventContext;
use crate::error::SimError;
use std::path::PathBuf;
use vetsim_env::ArtifactStore;

/// Names and materialises placeholder artifacts for one event.
#[derive(Clone, Copy)]
pub struct ArtifactNamer<'a> {
    store: &'a dyn ArtifactStore,
    ctx: &'a EventContext,
    start: i64,
    duration: i64,
}

impl<'a> ArtifactNamer<'a> {
    /// Creates a namer covering the context's analysed span.
    pub fn new(ctx: &'a EventContext, store: &'a dyn ArtifactStore) -> Self {
        Self {
            store,
            ctx,
            start: ctx.start() as i64,
            duration: ctx.duration() as i64,
        }
    }

    /// Returns a namer for a different span (e.g. one segment flag).
    pub fn with_span(self, start: f64, duration: f64) -> Self {
        Self {
            start: start as i64,
            duration: duration as i64,
            ..self
        }
    }

    /// Returns the event folder all artifacts are placed in.
    pub fn folder(&self) -> PathBuf {
        self.ctx.artifact_dir().join(self.ctx.event().folder())
    }

    /// Computes an artifact path without creating anything.
    pub fn path(&self, subsystem: &str, qualifier: &str, ext: &str) -> PathBuf {
        let stem = if qualifier.is_empty() {
            subsystem.to_string()
        } else {
            format!("{}_{}", subsystem, qualifier)
        };
        let filename = format!(
            "{}-{}-{}.{}",
            stem.replace(':', "_"),
            self.start,
            self.duration,
            ext
        );
        self.folder().join(filename)
    }

    /// Computes an artifact path and creates its empty placeholder.
    ///
    /// # Errors
    /// `SimError::Artifact` if the folder or file cannot be created.
    pub fn name(&self, subsystem: &str, qualifier: &str, ext: &str) -> Result<PathBuf, SimError> {
        let path = self.path(subsystem, qualifier, ext);
        self.store.create_placeholder(&path)?;
        Ok(path)
    }

    /// Creates two companion artifacts (e.g. a data file and its figure).
    pub fn pair(
        &self,
        subsystem: &str,
        first: (&str, &str),
        second: (&str, &str),
    ) -> Result<(PathBuf, PathBuf), SimError> {
        Ok((
            self.name(subsystem, first.0, first.1)?,
            self.name(subsystem, second.0, second.1)?,
        ))
    }
}

impl std::fmt::Debug for ArtifactNamer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactNamer")
            .field("folder", &self.folder())
            .field("start", &self.start)
            .field("duration", &self.duration)
            .finish()
    }
}
