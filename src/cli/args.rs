//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// pystage - stage Pyodide packages and runtime assets
///
/// Downloads Python packages into the Pyodide package cache, freezes them
/// into a lock file and copies the runtime into the static directory.
#[derive(Parser, Debug)]
#[command(name = "pystage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to `prepare`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path (defaults to <project>/pystage.toml)
    #[arg(short, long, global = true, env = "PYSTAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Ignore proxy environment variables and config
    #[arg(long, global = true)]
    pub no_proxy: bool,

    /// Log format (overrides general.log_format)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stage packages, then copy runtime assets
    Prepare(PrepareArgs),

    /// Stage packages into the runtime cache only
    Packages(PrepareArgs),

    /// Copy runtime assets into the static directory only
    Assets,

    /// Show the proxy selected from the environment
    Proxy(ProxyArgs),

    /// Show configuration
    Config(ConfigArgs),

    /// Create a pystage.toml in the project root
    Init(InitArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Arguments for the prepare and packages commands
#[derive(Parser, Debug, Default)]
pub struct PrepareArgs {
    /// Exit non-zero when the package stage does not complete
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the proxy command
#[derive(Parser, Debug)]
pub struct ProxyArgs {
    /// Probe the package index hosts through the selected proxy
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing pystage.toml
    #[arg(short, long)]
    pub force: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}
