//! Assets command - copy the runtime distribution into the static directory

use super::Workspace;
use crate::assets::{AssetCopier, CopyMode, CopyReport};
use crate::error::StageResult;
use crate::ui::{self, UiContext};
use tracing::info;

/// Copy runtime assets and report the result.
///
/// A copy failure other than an already-present file is returned as an error.
pub async fn run_copy(ws: &Workspace, ctx: &UiContext) -> StageResult<CopyReport> {
    let copier = AssetCopier::new(
        ws.resolve(&ws.config.paths.dist_dir),
        ws.resolve(&ws.config.assets.dest_dir),
        CopyMode::from_overwrite(ws.config.assets.overwrite),
    );

    ui::section(ctx, "Runtime assets");
    info!(
        "Copying {} into {}",
        copier.source().display(),
        copier.dest().display()
    );

    let report = copier.copy().await?;

    for path in &report.unreadable {
        ui::step_warn_hint(
            ctx,
            &format!("Skipped {}", path.display()),
            "could not read metadata",
        );
    }

    ui::step_ok_detail(
        ctx,
        &format!("Copied runtime into {}", copier.dest().display()),
        &format!(
            "{} copied, {} already present",
            report.files_copied, report.already_present
        ),
    );

    Ok(report)
}

/// Execute the assets command
pub async fn execute(ws: &Workspace) -> StageResult<()> {
    let ctx = UiContext::detect();
    run_copy(ws, &ctx).await.map(|_| ())
}
