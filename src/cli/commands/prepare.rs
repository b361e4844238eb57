//! Prepare command - the full build step
//!
//! Proxy selection, then the package stage, then the asset copy. Each stage
//! is awaited before the next starts.

use super::assets::run_copy;
use super::packages::{enforce_strict, node_loader, run_stage};
use super::proxy::init_proxy;
use super::Workspace;
use crate::cli::args::PrepareArgs;
use crate::error::StageResult;
use crate::ui::{self, UiContext};

/// Execute the prepare command
pub async fn execute(args: PrepareArgs, ws: &Workspace) -> StageResult<()> {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "pystage prepare");

    let proxy = init_proxy(ws, &ctx);
    let outcome = run_stage(ws, proxy, &node_loader(ws), &ctx).await?;
    let report = run_copy(ws, &ctx).await?;

    enforce_strict(args.strict, &outcome)?;

    if outcome.is_complete() && report.unreadable.is_empty() {
        ui::outro_success(&ctx, "Pyodide staged");
    } else {
        ui::outro_warn(&ctx, "Pyodide staged with warnings");
    }

    Ok(())
}
