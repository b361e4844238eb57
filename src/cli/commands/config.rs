//! Config command - show configuration

use super::Workspace;
use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::error::StageResult;

/// Execute the config command
pub async fn execute(args: ConfigArgs, ws: &Workspace) -> StageResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(ws)?,
        Some(ConfigAction::Path) => show_path(ws),
    }

    Ok(())
}

fn show_config(ws: &Workspace) -> StageResult<()> {
    let toml = toml::to_string_pretty(&ws.config)?;
    println!("{}", toml);
    Ok(())
}

fn show_path(ws: &Workspace) {
    let suffix = if ws.config_path.exists() {
        ""
    } else {
        " (not present, using defaults)"
    };
    println!("{}{}", ws.config_path.display(), suffix);
}
