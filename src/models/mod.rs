//! Data models for qttools.
//!
//! - [`AppState`]: the resolved Qt environment of the current update cycle plus
//!   launch progress ([`LaunchPhase`])
//! - [`ToolsConfig`]: user settings loaded from `qttools.yaml` and `QTTOOLS_*`
//!   environment variables
//!
//! `AppState` is wrapped in `Arc<RwLock<>>` by [`StateManager`](crate::state::StateManager);
//! updates go through its `update()` method so change events are emitted.

pub mod app_state;
pub mod config;

pub use app_state::{AppState, LaunchPhase, STATUS_FOUND, STATUS_NOT_FOUND};
pub use config::{ToolsConfig, WORKSPACE_PLACEHOLDER, substitute_workspace};
