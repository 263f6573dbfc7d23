//! Client cache for the demo strategy workspace.
//!
//! The store is an explicit object handed to whoever needs it. Observers
//! subscribe through a `watch` channel; every operation publishes one
//! complete snapshot, so no observer sees `seed` updated with a stale
//! `history`.

use blockbuilders_core::workspace::{StrategyBlock, StrategyEdge, StrategySeed};
use std::sync::Arc;
use tokio::sync::watch;

/// Maximum number of seeds kept in history.
pub const HISTORY_LIMIT: usize = 10;

/// Snapshot of the workspace.
///
/// `nodes` and `edges` are projections of `seed`, so they cannot drift from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceState {
    seed: Option<Arc<StrategySeed>>,
    /// Oldest first, newest last
    history: Vec<Arc<StrategySeed>>,
}

impl WorkspaceState {
    pub fn seed(&self) -> Option<&StrategySeed> {
        self.seed.as_deref()
    }

    pub fn nodes(&self) -> &[StrategyBlock] {
        self.seed
            .as_deref()
            .map(|seed| seed.blocks.as_slice())
            .unwrap_or(&[])
    }

    pub fn edges(&self) -> &[StrategyEdge] {
        self.seed
            .as_deref()
            .map(|seed| seed.edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn history(&self) -> &[Arc<StrategySeed>] {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.seed.is_none() && self.history.is_empty()
    }

    fn push_history(&mut self, seed: Arc<StrategySeed>) {
        self.history.push(seed);
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

/// Shared handle to the workspace state. Clones refer to the same store.
#[derive(Clone)]
pub struct WorkspaceStore {
    state: Arc<watch::Sender<WorkspaceState>>,
}

impl WorkspaceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(WorkspaceState::default());
        Self {
            state: Arc::new(sender),
        }
    }

    /// Replaces the current seed and appends it to history in one transition.
    pub fn load_workspace(&self, seed: StrategySeed) {
        let seed = Arc::new(seed);
        tracing::debug!(
            "[WorkspaceStore] Loading strategy {} ({})",
            seed.strategy_id,
            seed.version_label
        );
        self.state.send_modify(|state| {
            state.seed = Some(Arc::clone(&seed));
            state.push_history(seed);
        });
    }

    /// Clears the seed and the history.
    pub fn reset(&self) {
        self.state.send_modify(|state| *state = WorkspaceState::default());
    }

    /// Current state.
    pub fn snapshot(&self) -> WorkspaceState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every transition.
    pub fn subscribe(&self) -> watch::Receiver<WorkspaceState> {
        self.state.subscribe()
    }
}

impl Default for WorkspaceStore {
    fn default() -> Self {
        Self::new()
    }
}
