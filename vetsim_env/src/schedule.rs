//! Ordered-event container for generated actions.

use crate::types::Action;
use std::sync::{Arc, Mutex, MutexGuard};

/// Destination for generated actions.
///
/// # Implementations
///
/// - **Schedule**: in-memory container that replays actions in time order
/// - Downstream dispatchers may implement this to stream actions elsewhere
///
/// # Ordering
///
/// ```text
/// Producer A          Sink               Consumer
///   |-- insert(t=5) -->|                    |
///   |-- insert(t=9) -->|                    |
/// Producer B           |                    |
///   |-- insert(t=7) -->|                    |
///   |                  |-- sorted() ------->| t=5, t=7, t=9
/// ```
///
/// Sinks make no assumption about insertion order. Cross-producer order is
/// resolved by timestamp alone.
pub trait ActionSink: Send + Sync {
    /// Accepts one action.
    fn insert(&self, action: Action);

    /// Accepts a batch of actions, preserving their relative order.
    fn insert_all<I>(&self, actions: I)
    where
        I: IntoIterator<Item = Action>,
        Self: Sized,
    {
        for action in actions {
            self.insert(action);
        }
    }
}

impl<S: ActionSink + ?Sized> ActionSink for Arc<S> {
    fn insert(&self, action: Action) {
        (**self).insert(action);
    }
}

/// Thread-safe schedule of actions.
///
/// Independent producers may insert concurrently. `sorted()` yields actions
/// by ascending offset; exact ties keep insertion order so companion pairs
/// (e.g. a plot and its data file) stay adjacent.
#[derive(Debug, Default)]
pub struct Schedule {
    actions: Mutex<Vec<Action>>,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped schedule for sharing between producers.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Action>> {
        // A panicking producer cannot leave a half-inserted action behind
        self.actions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the number of actions inserted so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a time-ordered copy of all actions.
    pub fn sorted(&self) -> Vec<Action> {
        let mut actions = self.lock().clone();
        sort_stable(&mut actions);
        actions
    }

    /// Consumes the schedule and returns its actions in time order.
    pub fn into_sorted(self) -> Vec<Action> {
        let mut actions = self
            .actions
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sort_stable(&mut actions);
        actions
    }

    /// Moves every action of `other` into this schedule.
    pub fn merge(&self, other: Schedule) {
        let incoming = other
            .actions
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.lock().extend(incoming);
    }

    /// Returns the latest offset in the schedule.
    pub fn horizon(&self) -> Option<f64> {
        self.lock()
            .iter()
            .map(|a| a.offset)
            .max_by(|a, b| a.total_cmp(b))
    }
}

impl ActionSink for Schedule {
    fn insert(&self, action: Action) {
        self.lock().push(action);
    }
}

impl IntoIterator for Schedule {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    /// Iterates over the actions in time order.
    fn into_iter(self) -> Self::IntoIter {
        self.into_sorted().into_iter()
    }
}

fn sort_stable(actions: &mut [Action]) {
    // slice::sort_by is stable
    actions.sort_by(|a, b| a.offset.total_cmp(&b.offset));
}
