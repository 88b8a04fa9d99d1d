// Shared Qt environment state
//
// StateManager holds the AppState of the latest update cycle behind Arc<RwLock<T>>
// and broadcasts what changed to status consumers.

use crate::models::{AppState, LaunchPhase};
use crate::services::{RootSource, Tool};
use camino::Utf8PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// What an update cycle or launch step changed
///
/// Consumers (the `watch` command, tests) subscribe instead of polling.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The resolved Qt root changed; `root` is empty when Qt was not found
    QtRootChanged {
        root: String,
        source: Option<RootSource>,
    },

    /// CMakeCache.txt was re-read with a different result
    CacheReloaded {
        entries: usize,
        project_name: Option<String>,
    },

    /// Extra search directories changed
    SearchDirectoriesChanged {
        directories: Vec<Utf8PathBuf>,
    },

    /// A launch request moved to a new phase
    LaunchPhaseChanged {
        tool: Tool,
        phase: LaunchPhase,
    },
}

/// Owner of the published [`AppState`]
///
/// Every mutation goes through [`StateManager::update`], which diffs the old and
/// new state and broadcasts one [`StateChange`] per changed aspect.
///
/// Writes are last-write-wins: overlapping update cycles are not coordinated.
pub struct StateManager {
    state: Arc<RwLock<AppState>>,

    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Unresolved state; up to 100 unread events are buffered per subscriber.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a clone of the current state
    pub fn snapshot(&self) -> AppState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `f` under the read lock
    ///
    /// # Example
    /// ```
    /// let state_manager = qttools::StateManager::new();
    /// let found = state_manager.read(|state| state.is_qt_found());
    /// assert!(!found);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Apply `update_fn` under the write lock and broadcast the differences
    ///
    /// Returns the emitted events (also when nobody is subscribed).
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);

        for change in &changes {
            // No subscribers is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.cache_entries != new.cache_entries
            || old.project_name != new.project_name
            || old.qt_dir_hint != new.qt_dir_hint
        {
            changes.push(StateChange::CacheReloaded {
                entries: new.cache_entries,
                project_name: new.project_name.clone(),
            });
        }

        if old.qt_root != new.qt_root || old.root_source != new.root_source {
            changes.push(StateChange::QtRootChanged {
                root: new.qt_root.as_str().to_string(),
                source: new.root_source,
            });
        }

        if old.extra_search_directories != new.extra_search_directories {
            changes.push(StateChange::SearchDirectoriesChanged {
                directories: new.extra_search_directories.clone(),
            });
        }

        if old.launch_phase != new.launch_phase || old.launch_tool != new.launch_tool {
            if let Some(tool) = new.launch_tool {
                changes.push(StateChange::LaunchPhaseChanged {
                    tool,
                    phase: new.launch_phase.clone(),
                });
            }
        }

        changes
    }

    /// Move the current launch request to `phase`
    pub fn set_launch_phase(&self, tool: Tool, phase: LaunchPhase) -> Vec<StateChange> {
        self.update(|state| {
            state.launch_tool = Some(tool);
            state.launch_phase = phase;
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Cloning shares the same state and channel
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
