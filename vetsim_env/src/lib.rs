//! VetSim Environment Abstraction Layer
//!
//! This crate holds everything the schedule generator hands work off to,
//! so that the generator itself stays a pure function of its configuration
//! and its random source:
//! - **Payloads**: `Action` records (log / label / signoff) and the
//!   `EventHandle` they target
//! - **Ordering**: the `ActionSink` collaborator and its `Schedule`
//!   implementation, which exposes actions sorted by simulated time
//! - **Filesystem**: the `ArtifactStore` collaborator that materialises
//!   placeholder files (`FsArtifactStore`) or only records them
//!   (`MemoryArtifactStore`)
//!
//! # Example
//!
//! ```ignore
//! use vetsim_env::{ActionSink, Schedule};
//!
//! let schedule = Schedule::new();
//! for action in generated {
//!     schedule.insert(action);
//! }
//! for action in schedule.sorted() {
//!     dispatch(action);
//! }
//! ```

mod error;
mod schedule;
mod store;
mod fs_store;
mod types;

pub use error::EnvError;
pub use fs_store::FsArtifactStore;
pub use schedule::{ActionSink, Schedule};
pub use store::{ArtifactStore, MemoryArtifactStore};
pub use types::{Action, ActionKind, EventHandle, Signoff, SignoffOutcome, DEFAULT_ENDPOINT};
