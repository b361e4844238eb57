//! Packages command - stage packages into the runtime cache

use super::proxy::init_proxy;
use super::Workspace;
use crate::cli::args::PrepareArgs;
use crate::error::{StageError, StageResult};
use crate::proxy::ProxySelection;
use crate::runtime::{NodeRuntimeLoader, RuntimeLoader};
use crate::stager::{PackageStager, StageEvent, StageOutcome};
use crate::ui::{self, InstallProgress, UiContext};

/// Stage packages with the given loader and render progress.
///
/// Returns an error only for fatal failures; a stage that stopped early is
/// reported through the outcome.
pub async fn run_stage(
    ws: &Workspace,
    proxy: ProxySelection,
    loader: &dyn RuntimeLoader,
    ctx: &UiContext,
) -> StageResult<StageOutcome> {
    let stager = PackageStager::from_config(&ws.config, &ws.root, proxy);

    ui::section(ctx, "Packages");
    ui::key_value(ctx, "cache", &stager.cache_dir().display().to_string());
    ui::key_value(ctx, "packages", &stager.packages().join(", "));

    let progress = InstallProgress::new(ctx, stager.packages().len());
    let on_event = |event: StageEvent| match event {
        StageEvent::RuntimeLoaded { version } => ui::step_ok_detail(
            ctx,
            "Runtime loaded",
            version.as_deref().unwrap_or("unknown version"),
        ),
        StageEvent::CacheCleared { cached, target } => ui::step_warn_hint(
            ctx,
            &format!("Runtime changed from {} to {}", cached, target),
            "cache directory cleared",
        ),
        StageEvent::Installing {
            index,
            total,
            package,
        } => progress.installing(index, total, &package),
        StageEvent::Freezing => {
            progress.finish();
            ui::step_info(ctx, "Freezing installed packages into lock file");
        }
    };

    let outcome = stager.stage(loader, &on_event).await;
    progress.finish();
    let outcome = outcome?;

    match &outcome {
        StageOutcome::Completed { .. } => ui::step_ok(ctx, &outcome.summary()),
        StageOutcome::RuntimeUnavailable { .. } => ui::step_warn_hint(
            ctx,
            &outcome.summary(),
            "check that `npm install` has run and Node.js is available",
        ),
        _ => ui::step_warn(ctx, &outcome.summary()),
    }

    Ok(outcome)
}

/// Fail the run when strict mode requires a complete stage
pub fn enforce_strict(strict: bool, outcome: &StageOutcome) -> StageResult<()> {
    if strict && !outcome.is_complete() {
        return Err(StageError::User(format!(
            "Package stage incomplete (--strict): {}",
            outcome.summary()
        )));
    }
    Ok(())
}

/// Loader for the configured Node.js runtime
pub fn node_loader(ws: &Workspace) -> NodeRuntimeLoader {
    NodeRuntimeLoader::new(ws.config.runtime.node.clone(), ws.root.clone())
}

/// Execute the packages command
pub async fn execute(args: PrepareArgs, ws: &Workspace) -> StageResult<()> {
    let ctx = UiContext::detect();
    let proxy = init_proxy(ws, &ctx);

    let outcome = run_stage(ws, proxy, &node_loader(ws), &ctx).await?;
    enforce_strict(args.strict, &outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn strict_rejects_incomplete_stage() {
        let outcome = StageOutcome::RuntimeUnavailable {
            reason: "node not found".into(),
        };
        assert!(enforce_strict(false, &outcome).is_ok());
        let err = enforce_strict(true, &outcome).unwrap_err();
        assert!(err.to_string().contains("--strict"));
    }

    #[test]
    fn strict_accepts_complete_stage() {
        let outcome = StageOutcome::Completed {
            lock_path: PathBuf::from("static/pyodide/pyodide-lock.json"),
            installed: 16,
            digest: "0123456789ab".into(),
        };
        assert!(enforce_strict(true, &outcome).is_ok());
    }
}
