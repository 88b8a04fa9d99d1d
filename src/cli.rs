//! Command-line interface: argument parsing and command dispatch.
//!
//! Command results go to stdout; logging goes to the log file and, unless
//! `--no-console` is given, to stderr.

use crate::controller::{ControllerOptions, ToolsController};
use crate::models::{AppState, LaunchPhase, ToolsConfig};
use crate::services::{CMakeCache, Tool};
use crate::state::StateChange;
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast::error::RecvError;

/// Directory name of the per-workspace settings, relative to the workspace.
pub const DEFAULT_CONFIG_DIR: &str = ".qttools";

/// Locate a Qt SDK from CMake builds and launch Qt Designer, Assistant or Creator.
#[derive(Parser, Debug)]
#[command(name = "qttools")]
#[command(version, about)]
pub struct Cli {
    /// Workspace folder substituted for ${workspaceFolder} (default: current directory)
    #[arg(short = 'w', long, global = true)]
    pub workspace: Option<Utf8PathBuf>,

    /// Directory holding qttools.yaml (default: <workspace>/.qttools)
    #[arg(long = "config-dir", global = true)]
    pub config_dir: Option<Utf8PathBuf>,

    /// CMake build directory, overriding cmake_build_directory
    #[arg(short = 'b', long = "build-dir", global = true)]
    pub build_dir: Option<Utf8PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Do not log to stderr
    #[arg(long = "no-console", global = true)]
    pub no_console: bool,

    /// Write the log file as JSON lines
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve the Qt root and print the status
    Resolve,
    /// Print the recognized CMakeCache.txt entries, or a single value
    Cache {
        /// Entry name, e.g. Qt5_DIR
        key: Option<String>,
    },
    /// Print the path of a tool
    Locate {
        #[arg(value_enum)]
        tool: ToolArg,
    },
    /// Launch a tool, optionally opening a file or directory
    Launch {
        #[arg(value_enum)]
        tool: ToolArg,
        /// .ui file for Designer; .ui, .qrc file or a directory for Creator
        file: Option<Utf8PathBuf>,
        /// Wait for the tool to exit and report its exit code
        #[arg(long)]
        wait: bool,
    },
    /// Keep resolving whenever CMakeCache.txt or qttools.yaml changes
    Watch,
    /// Write the Qt natvis file for the Visual Studio debugger
    Natvis,
    /// Print the Qt documentation URL for a class or topic
    Docs { term: String },
    /// Write a default qttools.yaml
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolArg {
    Designer,
    Assistant,
    Creator,
}

impl From<ToolArg> for Tool {
    fn from(arg: ToolArg) -> Self {
        match arg {
            ToolArg::Designer => Tool::Designer,
            ToolArg::Assistant => Tool::Assistant,
            ToolArg::Creator => Tool::Creator,
        }
    }
}

impl Cli {
    /// Workspace folder, falling back to the current directory.
    pub fn workspace_dir(&self) -> Result<Utf8PathBuf> {
        match &self.workspace {
            Some(ws) => Ok(ws.clone()),
            None => {
                let cwd = std::env::current_dir().context("Failed to read current directory")?;
                Utf8PathBuf::try_from(cwd).context("Current directory is not valid UTF-8")
            }
        }
    }

    pub fn config_dir_for(&self, workspace: &Utf8Path) -> Utf8PathBuf {
        self.config_dir
            .clone()
            .unwrap_or_else(|| workspace.join(DEFAULT_CONFIG_DIR))
    }

    pub fn controller_options(&self, workspace: Utf8PathBuf) -> ControllerOptions {
        ControllerOptions {
            workspace: Some(workspace),
            build_dir_override: self.build_dir.clone(),
            watch: self.command == Commands::Watch,
            ..ControllerOptions::default()
        }
    }
}

/// Run `command` against `controller`.
pub async fn run(controller: &ToolsController, command: &Commands) -> Result<()> {
    match command {
        Commands::Resolve => {
            let state = controller.update_state().await?;
            print_status(&state);
        }
        Commands::Cache { key } => {
            let state = controller.update_state().await?;
            let cache = match &state.cache_file {
                Some(file) => CMakeCache::read(file).await,
                None => CMakeCache::default(),
            };
            match key {
                Some(key) => match cache.get(key) {
                    Some(value) => println!("{value}"),
                    None => bail!("{key} is not set in the CMake cache"),
                },
                None => {
                    for (name, value) in cache.values() {
                        println!("{name}={value}");
                    }
                }
            }
        }
        Commands::Locate { tool } => {
            let tool = Tool::from(*tool);
            match controller.locate(tool).await? {
                Some(path) => println!("{path}"),
                None => bail!("{} not found", tool.display_name()),
            }
        }
        Commands::Launch { tool, file, wait } => {
            let tool = Tool::from(*tool);
            let mut changes = controller.state().subscribe();
            let outcome = controller.launch(tool, file.as_deref()).await?;
            println!("Started {} ({})", tool.display_name(), outcome.target.executable);
            if *wait {
                wait_for_exit(&mut changes, tool).await;
            }
        }
        Commands::Watch => watch(controller).await?,
        Commands::Natvis => {
            let output = controller.generate_natvis().await?;
            println!("{output}");
        }
        Commands::Docs { term } => {
            controller.update_state().await?;
            println!("{}", controller.help_url(term));
        }
        Commands::InitConfig { force } => {
            let manager = controller.config_manager();
            if manager.settings_path().exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    manager.settings_path()
                );
            }
            manager.save_config(&ToolsConfig::default())?;
            println!("{}", manager.settings_path());
        }
    }
    Ok(())
}

fn print_status(state: &AppState) {
    println!("{}: {}", state.status_text(), state.status_tooltip());
    if let Some(source) = state.root_source {
        println!("source: {source}");
    }
    if let Some(family) = state.qt_family {
        println!("version: {family}");
    }
    if let Some(project) = &state.project_name {
        println!("project: {project}");
    }
}

async fn wait_for_exit(
    changes: &mut tokio::sync::broadcast::Receiver<StateChange>,
    tool: Tool,
) {
    loop {
        match changes.recv().await {
            Ok(StateChange::LaunchPhaseChanged {
                tool: changed,
                phase: LaunchPhase::Exited(code),
            }) if changed == tool => {
                match code {
                    Some(code) => println!("{} exited with code {code}", tool.display_name()),
                    None => println!("{} exited", tool.display_name()),
                }
                return;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Missed {} state changes", skipped);
            }
            Err(RecvError::Closed) => return,
        }
    }
}

async fn watch(controller: &ToolsController) -> Result<()> {
    let mut changes = controller.state().subscribe();
    let state = controller.update_state().await?;
    print_status(&state);

    let queue = controller.run_queue();
    tokio::pin!(queue);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut queue => break,
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Interrupted, stopping watch");
                break;
            }
            change = changes.recv() => match change {
                Ok(StateChange::QtRootChanged { .. }) => print_status(&controller.state().snapshot()),
                Ok(StateChange::CacheReloaded { entries, project_name }) => {
                    println!(
                        "cache reloaded: {entries} entries{}",
                        project_name.map(|p| format!(" ({p})")).unwrap_or_default()
                    );
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => tracing::warn!("Missed {} state changes", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    }
    Ok(())
}
