//! Starting GUI tools as detached processes.
//!
//! Launching is fire-and-forget: [`TokioSpawner`] starts the process, hands back
//! immediately and logs the exit code from a background task whenever the tool
//! is closed. Callers that want the exit code can await [`SpawnedTool::exit`].

use crate::metrics::Metrics;
use crate::services::tool_locator::{LaunchError, ToolTarget};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::oneshot;

/// Handle to a started tool.
#[derive(Debug)]
pub struct SpawnedTool {
    pub pid: Option<u32>,
    /// Resolves with the exit code (`None` if killed by a signal or the wait failed).
    pub exit: Option<oneshot::Receiver<Option<i32>>>,
}

impl SpawnedTool {
    /// A handle without exit notification.
    pub fn detached(pid: Option<u32>) -> Self {
        Self { pid, exit: None }
    }

    /// Wait for the tool to exit, if the spawner reports exits.
    pub async fn wait(self) -> Option<i32> {
        match self.exit {
            Some(rx) => rx.await.ok().flatten(),
            None => None,
        }
    }
}

/// Starts a validated [`ToolTarget`].
#[cfg_attr(test, mockall::automock)]
pub trait ProcessSpawner {
    fn spawn(&self, target: &ToolTarget) -> Result<SpawnedTool, LaunchError>;
}

/// Spawner shared between the controller and its callers.
pub type SharedSpawner = Arc<dyn ProcessSpawner + Send + Sync>;

/// Spawner backed by `tokio::process`. Must be used inside a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner {
    metrics: Option<Arc<Metrics>>,
}

impl TokioSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }
}

impl ProcessSpawner for TokioSpawner {
    fn spawn(&self, target: &ToolTarget) -> Result<SpawnedTool, LaunchError> {
        let tool = target.tool;
        tracing::info!("Launching {}: {} {:?}", tool, target.executable, target.args);

        let mut child = Command::new(target.executable.as_std_path())
            .args(&target.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn { tool, source })?;

        let pid = child.id();
        let (exit_tx, exit_rx) = oneshot::channel();
        let metrics = self.metrics.clone();

        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    tracing::warn!("Failed to wait for {}: {}", tool, e);
                    None
                }
            };
            match code {
                Some(code) => tracing::info!("{} child process exited with code {}", tool, code),
                None => tracing::info!("{} child process exited without exit code", tool),
            }
            if let Some(metrics) = metrics {
                metrics.record_tool_exited();
            }
            // Nobody listening is fine: launches are fire-and-forget.
            let _ = exit_tx.send(code);
        });

        Ok(SpawnedTool {
            pid,
            exit: Some(exit_rx),
        })
    }
}
