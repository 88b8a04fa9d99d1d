// qttools - Qt SDK locator and tool launcher for CMake workspaces
//
// This is the library crate containing the discovery logic and data structures.
// The binary crate (main.rs) provides the command-line entry point.

pub mod cli;
pub mod config;
pub mod controller;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use controller::{ControllerOptions, LaunchOutcome, ToolsController};
pub use metrics::Metrics;
pub use models::{AppState, LaunchPhase, STATUS_FOUND, STATUS_NOT_FOUND, ToolsConfig};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
