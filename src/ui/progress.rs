//! Progress indicators with CI fallback

use super::context::UiContext;
use super::output::{plain_line, Status};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (shows on `start` in interactive mode)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            plain_line(Status::Info, message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else {
            plain_line(Status::Ok, message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else {
            plain_line(Status::Fail, message);
        }
    }
}

/// Progress bar for sequential package installs.
///
/// Shows an indicatif bar in interactive mode and one line per package in CI.
/// The bar stays hidden until the first install starts.
pub struct InstallProgress {
    bar: Option<ProgressBar>,
}

impl InstallProgress {
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden());
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  {spinner:.yellow} Installing  {bar:20.yellow/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                    .progress_chars("━╸─"),
            );
            Some(bar)
        } else {
            None
        };
        Self { bar }
    }

    /// Report that package `index` (1-based) of `total` is being installed
    pub fn installing(&self, index: usize, total: usize, package: &str) {
        if let Some(ref bar) = self.bar {
            if bar.is_hidden() {
                bar.set_draw_target(ProgressDrawTarget::stderr());
                bar.enable_steady_tick(std::time::Duration::from_millis(120));
            }
            bar.set_length(total as u64);
            bar.set_position(index.saturating_sub(1) as u64);
            bar.set_message(package.to_string());
        } else {
            plain_line(Status::Info, &format!("[{}/{}] {}", index, total, package));
        }
    }

    /// Mark every install done (or abandoned) and clear the bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}
