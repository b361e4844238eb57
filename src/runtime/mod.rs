//! Embedded interpreter runtime
//!
//! Provides the runtime traits used by the package stager and the Node.js
//! bridge implementation that hosts Pyodide and micropip.

mod node;
pub mod protocol;
#[allow(clippy::module_inception)]
mod runtime;

pub use node::{bridge_file_name, default_script_dir, NodeRuntimeLoader, BRIDGE_JS};
pub use runtime::{InterpreterRuntime, RuntimeLoader};
