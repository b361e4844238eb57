//! Terminal output for pystage
//!
//! Uses `cliclack` for interactive output with automatic fallback to plain
//! lines in CI and when stdout is not a terminal. Diagnostics go through
//! `tracing`; this module only renders progress and results.

mod context;
mod output;
mod progress;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, section, step_error_detail, step_info, step_ok,
    step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{InstallProgress, TaskSpinner};
pub use theme::{init_theme, StageTheme};
