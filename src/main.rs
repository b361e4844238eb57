//! pystage - Pyodide build staging
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use pystage::cli::args::PrepareArgs;
use pystage::cli::commands::{self, Workspace};
use pystage::cli::{Cli, Commands, LogFormat};
use pystage::config::ConfigManager;
use pystage::error::{StageError, StageResult};
use pystage::ui;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, format: LogFormat) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("pystage=warn"),
        1 => EnvFilter::new("pystage=info"),
        _ => EnvFilter::new("pystage=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run() -> StageResult<()> {
    let cli = Cli::parse();
    ui::init_theme();

    // Completions need neither config nor logging
    if let Some(Commands::Completions { shell }) = cli.command {
        return commands::completions(shell);
    }

    let root = match cli.project {
        Some(ref p) => p.clone(),
        None => std::env::current_dir().map_err(|e| StageError::io("getting current directory", e))?,
    };

    if let Some(Commands::Init(args)) = cli.command {
        init_logging(cli.verbose, cli.log_format.unwrap_or(LogFormat::Text));
        return commands::init(args, &root).await;
    }

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::for_project(&root),
    };

    // Config errors are reported before logging is configured from it
    let config = manager.load().await?;

    let log_format = cli.log_format.unwrap_or(match config.general.log_format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(cli.verbose, log_format);
    if manager.path().exists() {
        debug!("Using config {}", manager.path().display());
    }

    let ws = Workspace {
        root,
        config,
        config_path: manager.path().to_path_buf(),
        no_proxy: cli.no_proxy,
    };

    match cli.command {
        None => commands::prepare(PrepareArgs::default(), &ws).await,
        Some(Commands::Prepare(args)) => commands::prepare(args, &ws).await,
        Some(Commands::Packages(args)) => commands::packages(args, &ws).await,
        Some(Commands::Assets) => commands::assets(&ws).await,
        Some(Commands::Proxy(args)) => commands::proxy(args, &ws).await,
        Some(Commands::Config(args)) => commands::config(args, &ws).await,
        Some(Commands::Init(_)) | Some(Commands::Completions { .. }) => Err(
            StageError::Internal("command dispatched after config load".to_string()),
        ),
    }
}
