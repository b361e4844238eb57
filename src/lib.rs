//! pystage - Pyodide build staging
//!
//! Selects an outbound proxy, stages Python packages into the Pyodide
//! package cache with micropip, freezes them into a lock file and copies
//! the runtime distribution into a static-assets directory.

pub mod assets;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod proxy;
pub mod runtime;
pub mod stager;
pub mod ui;

pub use error::{StageError, StageResult};
