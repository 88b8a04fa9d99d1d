// Tools Controller - the explicit context object owned by the entry point
//
// This module contains the ToolsController which coordinates between:
// - ConfigManager (qttools.yaml + QTTOOLS_* environment)
// - StateManager (resolved Qt environment, launch progress)
// - QtRootResolver / ToolLocator (discovery)
// - ProcessSpawner (detached tool processes)
// - FileWatchers feeding the resolve queue
//
// Every trigger (settings change, CMakeCache.txt change, explicit command) is
// queued and handled one at a time, to completion, without de-duplication.

use crate::config::{ConfigManager, SETTINGS_FILENAME};
use crate::metrics::Metrics;
use crate::models::{AppState, LaunchPhase};
use crate::services::{
    CMAKE_CACHE_FILENAME, CMakeCache, FileProbe, FileWatcher, FsProbe, HostOs, LaunchError,
    QtRootResolver, ResolveInputs, SharedSpawner, TokioSpawner, Tool, ToolLocator, ToolTarget,
    Trigger, docs, natvis,
};
use crate::state::StateManager;
use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::mpsc;

/// Settings that are fixed for the lifetime of the controller.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Value substituted for `${workspaceFolder}`.
    pub workspace: Option<Utf8PathBuf>,
    /// Build directory overriding `cmake_build_directory`.
    pub build_dir_override: Option<Utf8PathBuf>,
    /// `PATH` value to scan instead of the process environment.
    pub path_override: Option<String>,
    /// Register file watchers during each update.
    pub watch: bool,
    pub os: HostOs,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            workspace: None,
            build_dir_override: None,
            path_override: None,
            watch: false,
            os: HostOs::current(),
        }
    }
}

/// Result of a successful launch request.
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub target: ToolTarget,
    pub pid: Option<u32>,
}

#[derive(Default)]
struct WatchHandles {
    cache: Option<FileWatcher>,
    config: Option<FileWatcher>,
}

/// Context object wiring configuration, resolution, state and launching.
///
/// # Example
/// ```no_run
/// use camino::Utf8Path;
/// use qttools::services::Tool;
/// use qttools::{ConfigManager, ControllerOptions, ToolsController};
///
/// # async fn run() -> anyhow::Result<()> {
/// let controller = ToolsController::new(ConfigManager::new(".qttools")?, ControllerOptions::default());
/// let state = controller.update_state().await?;
/// println!("{}", state.status_text());
/// controller.launch(Tool::Designer, Some(Utf8Path::new("form.ui"))).await?;
/// # Ok(())
/// # }
/// ```
pub struct ToolsController {
    config_manager: ConfigManager,
    state: StateManager,
    metrics: Arc<Metrics>,
    resolver: QtRootResolver,
    locator: ToolLocator,
    spawner: SharedSpawner,
    options: ControllerOptions,
    trigger_tx: mpsc::UnboundedSender<Trigger>,
    trigger_rx: Mutex<Option<mpsc::UnboundedReceiver<Trigger>>>,
    watchers: Mutex<WatchHandles>,
}

impl ToolsController {
    /// Controller using the real filesystem and detached tokio processes.
    pub fn new(config_manager: ConfigManager, options: ControllerOptions) -> Self {
        let metrics = Arc::new(Metrics::new());
        let spawner: SharedSpawner = Arc::new(TokioSpawner::with_metrics(metrics.clone()));
        Self::with_collaborators(config_manager, options, Arc::new(FsProbe), spawner, metrics)
    }

    /// Controller with injected probe and spawner.
    pub fn with_collaborators(
        config_manager: ConfigManager,
        options: ControllerOptions,
        probe: Arc<dyn FileProbe>,
        spawner: SharedSpawner,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        Self {
            config_manager,
            state: StateManager::new(),
            metrics,
            resolver: QtRootResolver::new(probe.clone(), options.os),
            locator: ToolLocator::new(probe, options.os),
            spawner,
            options,
            trigger_tx,
            trigger_rx: Mutex::new(Some(trigger_rx)),
            watchers: Mutex::new(WatchHandles::default()),
        }
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    pub fn workspace(&self) -> Option<&Utf8Path> {
        self.options.workspace.as_deref()
    }

    /// Queue a re-resolution.
    pub fn enqueue(&self, trigger: Trigger) {
        // Only fails once the queue has been dropped.
        let _ = self.trigger_tx.send(trigger);
    }

    /// Recompute the whole Qt environment and publish it.
    ///
    /// Reads settings, re-reads `CMakeCache.txt`, resolves the root and updates
    /// the state (last write wins). Registers file watchers when enabled.
    ///
    /// # Errors
    ///
    /// Fails only if the settings file cannot be read or parsed; a missing
    /// cache or a missing Qt installation is reported through the state.
    pub async fn update_state(&self) -> Result<AppState> {
        tracing::info!("Updating Qt state");
        let started = Instant::now();

        let mut config = self.config_manager.load_config()?;
        if let Some(dir) = &self.options.build_dir_override {
            config.cmake_build_directory = dir.to_string();
        }
        let workspace = self.workspace();

        let build_directory = config.build_directory(workspace);
        let cache_file = config.cache_file(workspace);

        let cache = match &cache_file {
            Some(file) => {
                self.metrics.record_cache_reload();
                CMakeCache::read(file).await
            }
            None => CMakeCache::default(),
        };

        let inputs = ResolveInputs {
            configured_root: config.configured_qt_dir(workspace),
            cache_hint: cache.qt_dir_hint(),
            path_var: self.path_var(),
            scan_path: config.scan_path,
        };
        let resolution = self.resolver.resolve(&inputs).await;
        self.metrics
            .record_resolution(resolution.root.is_resolved(), started.elapsed());

        let extra_search_directories = config.extra_search_dirs(workspace);
        let configured_creator = config.configured_creator(workspace);

        self.state.update(|state| {
            state.workspace = self.options.workspace.clone();
            state.build_directory = build_directory.clone();
            state.cache_file = cache_file.clone();
            state.extra_search_directories = extra_search_directories;
            state.configured_creator = configured_creator;
            state.cache_entries = cache.len();
            state.project_name = cache.project_name().map(str::to_string);
            state.qt_dir_hint = inputs.cache_hint.clone();
            state.qt_root = resolution.root.clone();
            state.root_source = Some(resolution.source);
            state.qt_family = resolution.family;
            state.update_count += 1;
        });

        tracing::info!(
            "Qt root: '{}' (source: {}), cache entries: {}",
            resolution.root,
            resolution.source,
            cache.len()
        );

        if self.options.watch {
            self.refresh_watchers(build_directory.as_deref());
        }

        Ok(self.state.snapshot())
    }

    fn path_var(&self) -> Option<String> {
        match &self.options.path_override {
            Some(value) => Some(value.clone()),
            None => std::env::var("PATH").ok(),
        }
    }

    /// Replace watch handles whose directory changed, closing the old one first.
    fn refresh_watchers(&self, build_directory: Option<&Utf8Path>) {
        let mut handles = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);

        let cache_dir_changed = handles.cache.as_ref().map(FileWatcher::dir) != build_directory;
        if cache_dir_changed {
            handles.cache = None;
            if let Some(dir) = build_directory {
                handles.cache = self.start_watcher(dir, CMAKE_CACHE_FILENAME, Trigger::CacheChanged);
            }
        }

        if handles.config.is_none() {
            handles.config = self.start_watcher(
                self.config_manager.config_dir(),
                SETTINGS_FILENAME,
                Trigger::ConfigChanged,
            );
        }
    }

    fn start_watcher(&self, dir: &Utf8Path, file_name: &str, trigger: Trigger) -> Option<FileWatcher> {
        match FileWatcher::watch(dir, file_name, trigger, self.trigger_tx.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!("Not watching {}: {:#}", dir.join(file_name), e);
                None
            }
        }
    }

    /// Process queued triggers until the queue is closed.
    ///
    /// Each trigger runs a full update to completion before the next one is
    /// taken. Failures are logged; the loop never stops because of them.
    /// Only the first caller gets the queue; later calls return immediately.
    pub async fn run_queue(&self) {
        let receiver = self
            .trigger_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut rx) = receiver else {
            tracing::warn!("Resolve queue is already running");
            return;
        };

        while let Some(trigger) = rx.recv().await {
            self.metrics.record_trigger();
            tracing::debug!("Processing trigger {:?}", trigger);
            if let Err(e) = self.update_state().await {
                tracing::error!("State update after {:?} failed: {:#}", trigger, e);
            }
        }
    }

    /// Currently resolvable path of `tool`, after a fresh update.
    pub async fn locate(&self, tool: Tool) -> Result<Option<Utf8PathBuf>> {
        let state = self.update_state().await?;
        Ok(self.executable_for(tool, &state).await)
    }

    async fn executable_for(&self, tool: Tool, state: &AppState) -> Option<Utf8PathBuf> {
        self.locator
            .executable_for(
                tool,
                state.configured_creator.as_deref(),
                &state.qt_root,
                &state.extra_search_directories,
            )
            .await
    }

    /// Resolve, validate and start `tool`, optionally opening `file`.
    ///
    /// Returns as soon as the process is started; its exit is logged and
    /// published as [`LaunchPhase::Exited`] in the background.
    ///
    /// # Errors
    ///
    /// A [`LaunchError`] (downcastable from the returned error) when the
    /// executable is missing, the file type is not supported, or spawning fails.
    pub async fn launch(&self, tool: Tool, file: Option<&Utf8Path>) -> Result<LaunchOutcome> {
        tracing::info!("Launch {} process", tool);
        self.state.set_launch_phase(tool, LaunchPhase::Resolving);

        let state = match self.update_state().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Using previous state, update failed: {:#}", e);
                self.state.snapshot()
            }
        };

        let executable = self.executable_for(tool, &state).await;
        let target = match self
            .locator
            .prepare_launch(tool, executable.as_deref(), file)
            .await
        {
            Ok(target) => target,
            Err(e) => return Err(self.fail_launch(tool, e)),
        };

        self.state
            .set_launch_phase(tool, LaunchPhase::Found(target.executable.clone()));
        self.state.set_launch_phase(tool, LaunchPhase::Spawning);

        let spawned = match self.spawner.spawn(&target) {
            Ok(spawned) => spawned,
            Err(e) => return Err(self.fail_launch(tool, e)),
        };
        self.metrics.record_launch_started();

        let pid = spawned.pid;
        if spawned.exit.is_some() {
            let state = self.state.clone();
            tokio::spawn(async move {
                let code = spawned.wait().await;
                state.set_launch_phase(tool, LaunchPhase::Exited(code));
            });
        }

        Ok(LaunchOutcome { target, pid })
    }

    fn fail_launch(&self, tool: Tool, error: LaunchError) -> anyhow::Error {
        tracing::error!("Error during launching {}: {}", tool, error);
        self.metrics.record_launch_failed();
        self.state
            .set_launch_phase(tool, LaunchPhase::Failed(error.to_string()));
        anyhow::Error::new(error)
    }

    /// Write the Qt natvis file and return where it went.
    pub async fn generate_natvis(&self) -> Result<Utf8PathBuf> {
        let config = self.config_manager.load_config()?;
        let output = self
            .config_manager
            .natvis_output_path(&config, self.workspace());
        let namespace = config
            .qt_namespace
            .as_deref()
            .unwrap_or_else(|| natvis::default_namespace(self.options.os));

        natvis::generate_natvis_file(&output, namespace).await?;
        Ok(output)
    }

    /// Documentation URL for `term`, matching the detected Qt major version.
    pub fn help_url(&self, term: &str) -> String {
        docs::help_url(term, self.state.read(|s| s.qt_family))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToolsConfig;
    use crate::services::launcher::MockProcessSpawner;
    use crate::services::{MemoryProbe, SpawnedTool};
    use tempfile::TempDir;

    fn controller_with(
        probe: MemoryProbe,
        spawner: MockProcessSpawner,
        config: ToolsConfig,
    ) -> (ToolsController, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_dir).unwrap();
        manager.save_config(&config).unwrap();

        let options = ControllerOptions {
            path_override: Some(String::new()),
            os: HostOs::Linux,
            ..ControllerOptions::default()
        };
        let controller = ToolsController::with_collaborators(
            manager,
            options,
            Arc::new(probe),
            Arc::new(spawner),
            Arc::new(Metrics::new()),
        );
        (controller, temp_dir)
    }

    fn config_with_qt_dir(dir: &str) -> ToolsConfig {
        ToolsConfig {
            cmake_build_directory: String::new(),
            qt_dir: dir.to_string(),
            ..ToolsConfig::default()
        }
    }

    #[tokio::test]
    async fn test_launch_spawns_located_designer() {
        let probe = MemoryProbe::new()
            .with_file("/opt/Qt/bin/qmake")
            .with_file("/opt/Qt/bin/designer")
            .with_file("form.ui");
        let mut spawner = MockProcessSpawner::new();
        spawner
            .expect_spawn()
            .withf(|target: &ToolTarget| {
                target.executable == Utf8PathBuf::from("/opt/Qt/bin/designer")
                    && target.args == vec!["form.ui".to_string()]
            })
            .times(1)
            .returning(|_| Ok(SpawnedTool::detached(Some(42))));

        let (controller, _temp_dir) = controller_with(probe, spawner, config_with_qt_dir("/opt/Qt"));
        let outcome = controller
            .launch(Tool::Designer, Some(Utf8Path::new("form.ui")))
            .await
            .unwrap();

        assert_eq!(outcome.pid, Some(42));
        assert_eq!(controller.state().read(|s| s.launch_phase.clone()), LaunchPhase::Spawning);
    }

    #[tokio::test]
    async fn test_launch_wrong_file_type_never_spawns() {
        let probe = MemoryProbe::new()
            .with_file("/opt/Qt/bin/qmake")
            .with_file("/opt/Qt/bin/designer");
        let mut spawner = MockProcessSpawner::new();
        spawner.expect_spawn().times(0);

        let (controller, _temp_dir) = controller_with(probe, spawner, config_with_qt_dir("/opt/Qt"));
        let err = controller
            .launch(Tool::Designer, Some(Utf8Path::new("notes.txt")))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::UnsupportedFileType { .. })
        ));
        assert!(matches!(
            controller.state().read(|s| s.launch_phase.clone()),
            LaunchPhase::Failed(_)
        ));
        assert_eq!(
            controller
                .metrics()
                .launches_failed
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_launch_without_qt_is_not_found() {
        let mut spawner = MockProcessSpawner::new();
        spawner.expect_spawn().times(0);

        let (controller, _temp_dir) =
            controller_with(MemoryProbe::new(), spawner, ToolsConfig::default());
        let err = controller.launch(Tool::Assistant, None).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_queue_processes_triggers() {
        let probe = MemoryProbe::new().with_file("/opt/Qt/bin/qmake");
        let (controller, _temp_dir) =
            controller_with(probe, MockProcessSpawner::new(), config_with_qt_dir("/opt/Qt"));

        controller.enqueue(Trigger::Command);
        controller.enqueue(Trigger::CacheChanged);

        // The controller keeps its own sender, so the loop only ends on timeout.
        let run = tokio::time::timeout(std::time::Duration::from_millis(500), controller.run_queue());
        assert!(run.await.is_err());

        assert_eq!(controller.state().read(|s| s.update_count), 2);
        assert_eq!(controller.state().read(|s| s.qt_root.as_str().to_string()), "/opt/Qt");
    }
}
