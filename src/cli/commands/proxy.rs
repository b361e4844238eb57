//! Proxy command - show the selected proxy and optionally probe through it

use super::Workspace;
use crate::cli::args::ProxyArgs;
use crate::error::StageResult;
use crate::proxy::{probe, ProxySelection};
use crate::ui::{self, TaskSpinner, UiContext};
use std::time::Duration;

/// Select the proxy for this run, log it and show it.
///
/// Never fails: rejected proxies are reported and the run continues without one.
pub fn init_proxy(ws: &Workspace, ctx: &UiContext) -> ProxySelection {
    let selection = ws.select_proxy();
    selection.log();
    show_selection(ctx, &selection);
    selection
}

fn show_selection(ctx: &UiContext, selection: &ProxySelection) {
    match selection {
        ProxySelection::None => {}
        ProxySelection::Selected(settings) => ui::step_ok_detail(
            ctx,
            &format!("Using network proxy {}", settings.as_str()),
            settings.source(),
        ),
        ProxySelection::Unsupported { source, value } => ui::step_warn_hint(
            ctx,
            &format!("Ignoring proxy \"{}\" from {}", value, source),
            "only http(s) proxies are supported",
        ),
        ProxySelection::Invalid {
            source,
            value,
            reason,
        } => ui::step_warn_hint(
            ctx,
            &format!("Invalid proxy URL \"{}\" from {}", value, source),
            reason,
        ),
    }
}

/// Execute the proxy command
pub async fn execute(args: ProxyArgs, ws: &Workspace) -> StageResult<()> {
    let ctx = UiContext::detect();
    let selection = init_proxy(ws, &ctx);

    if selection == ProxySelection::None {
        ui::step_info(&ctx, "No proxy configured, connecting directly");
    }

    if !args.check {
        return Ok(());
    }

    let network = &ws.config.network;
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Probing {} host(s)...", network.probe_urls.len()));

    let results = probe(
        &network.probe_urls,
        selection.settings(),
        Duration::from_secs(network.probe_timeout_secs),
    )
    .await?;

    let unreachable = results.iter().filter(|r| !r.reachable()).count();
    if unreachable == 0 {
        spinner.stop("All hosts reachable");
    } else {
        spinner.stop_error(&format!("{} host(s) unreachable", unreachable));
    }

    for result in &results {
        match &result.outcome {
            Ok(status) if result.reachable() => {
                ui::step_ok_detail(&ctx, &result.url, &format!("HTTP {}", status))
            }
            Ok(status) => ui::step_error_detail(&ctx, &result.url, &format!("HTTP {}", status)),
            Err(reason) => ui::step_error_detail(&ctx, &result.url, reason),
        }
    }

    Ok(())
}
