//! qttools - locate the Qt SDK of a CMake workspace and launch its GUI tools.
//!
//! Main entry point for the command-line application.
//!
//! # Execution Flow
//!
//! 1. Parse arguments (workspace, config dir, subcommand)
//! 2. Load `qttools.yaml` to find the log directory and debug flag
//! 3. Initialize logging → <config dir>/logs/qttools.<date>
//! 4. Create a current-thread tokio runtime
//! 5. Create the ToolsController and run the subcommand
//! 6. Log the metrics summary

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use qttools::cli::{self, Cli};
use qttools::logging::{self, LOG_PREFIX, LogOptions};
use qttools::{APP_NAME, ConfigManager, ToolsController, VERSION};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let workspace = cli.workspace_dir()?;
    let config_manager = ConfigManager::new(cli.config_dir_for(&workspace))?;
    let config = config_manager.load_config()?;

    let log_dir = {
        let dir = Utf8PathBuf::from(&config.log_directory);
        if dir.is_absolute() {
            dir
        } else {
            config_manager.config_dir().join(dir)
        }
    };
    let _guard = logging::setup_logging(&LogOptions {
        log_dir: &log_dir,
        log_prefix: LOG_PREFIX,
        debug_mode: cli.debug || config.debug_mode,
        console_output: !cli.no_console,
        json: cli.log_json || config.log_json,
    })?;

    tracing::info!("Starting {} v{} in {}", APP_NAME, VERSION, workspace);

    // Resolution is strictly sequential, a single thread is all it needs
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let controller = ToolsController::new(config_manager, cli.controller_options(workspace));
    let result = runtime.block_on(cli::run(&controller, &cli.command));

    controller.metrics().log_summary();
    tracing::info!("Shutdown complete");

    result
}
