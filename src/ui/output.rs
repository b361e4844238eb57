//! Step and summary lines for the staging pipeline
//!
//! Interactive terminals get cliclack's log lines. Everything else (CI, pipes,
//! `--log-format json` runs captured to a file) gets one plain line per event
//! with a fixed-width status column so build logs can be grepped.

use super::context::UiContext;
use console::{style, StyledObject};

/// Status column for plain output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn text(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn label(self) -> StyledObject<&'static str> {
        let text = style(self.text());
        match self {
            Self::Ok => text.green(),
            Self::Warn => text.yellow(),
            Self::Fail => text.red(),
            Self::Info => text.cyan(),
        }
    }
}

/// Width of the status column, including padding
const STATUS_WIDTH: usize = 6;

pub(super) fn plain_line(status: Status, message: &str) {
    // pad on the raw text; ANSI codes would skew `{:<width$}`
    let pad = STATUS_WIDTH.saturating_sub(status.text().len());
    println!("  {}{}{}", status.label(), " ".repeat(pad), message);
}

fn plain_hint(hint: &str) {
    println!("  {}{}", " ".repeat(STATUS_WIDTH), style(format!("hint: {}", hint)).dim());
}

/// Pipeline title
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).yellow().bold()).ok();
    } else {
        println!("== {} ==", style(title).bold());
    }
}

/// Final line when every stage completed
pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).green().bold()).ok();
    } else {
        println!("== {} ==", style(message).green());
    }
}

/// Final line when a stage ended early or skipped entries
pub fn outro_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).yellow().bold()).ok();
    } else {
        println!("== {} ==", style(message).yellow());
    }
}

/// Stage header
pub fn section(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::info(style(title).bold()).ok();
    } else {
        println!("{}", style(format!("-- {}", title)).bold());
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(message).ok();
    } else {
        plain_line(Status::Ok, message);
    }
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(format!("{} ({})", message, style(detail).dim())).ok();
    } else {
        plain_line(Status::Ok, &format!("{} ({})", message, detail));
    }
}

pub fn step_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(message).ok();
    } else {
        plain_line(Status::Warn, message);
    }
}

/// Warning with a follow-up hint on its own line in plain mode
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(format!("{}\n{}", message, style(hint).dim())).ok();
    } else {
        plain_line(Status::Warn, message);
        plain_hint(hint);
    }
}

pub fn step_error_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::error(format!("{}: {}", message, style(detail).red())).ok();
    } else {
        plain_line(Status::Fail, &format!("{}: {}", message, detail));
    }
}

pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::info(message).ok();
    } else {
        plain_line(Status::Info, message);
    }
}

/// Setting shown under a stage header, e.g. `cache: static/pyodide`
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    let key = format!("{}:", key);
    if ctx.use_fancy_output() {
        println!("│  {} {}", style(format!("{:<10}", key)).dim(), value);
    } else {
        println!("  {}{:<10} {}", " ".repeat(STATUS_WIDTH), key, value);
    }
}
