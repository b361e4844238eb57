//! Pyodide runtime hosted by Node.js
//!
//! Implements the runtime traits by spawning `node` on the embedded bridge
//! script and exchanging JSON lines with it. The bridge resolves `pyodide`
//! (and `undici`, for proxy support) from the project's `node_modules`.

use crate::error::{StageError, StageResult};
use crate::proxy::ProxySelection;
use crate::runtime::protocol::{BridgeOp, BridgeRequest, BridgeResponse};
use crate::runtime::runtime::{InterpreterRuntime, RuntimeLoader};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

/// Bridge program run by Node.js
pub const BRIDGE_JS: &str = include_str!("../../runtime/bridge.cjs");

/// Content-addressed file name for the bridge script
pub fn bridge_file_name() -> String {
    let mut hasher = Sha256::new();
    hasher.update(BRIDGE_JS.as_bytes());
    let result = hasher.finalize();
    format!("bridge-{}.cjs", hex::encode(&result[..6]))
}

/// Default directory the bridge script is extracted to
pub fn default_script_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pystage")
}

/// Loader for the Node.js-hosted runtime
pub struct NodeRuntimeLoader {
    node: String,
    project_root: PathBuf,
    script_dir: PathBuf,
}

impl NodeRuntimeLoader {
    /// Create a loader running `node` from the project root
    pub fn new(node: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            node: node.into(),
            project_root: project_root.into(),
            script_dir: default_script_dir(),
        }
    }

    /// Extract the bridge script somewhere other than the user cache
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = dir.into();
        self
    }

    /// Write the embedded bridge script unless this version already exists
    async fn bridge_script(&self) -> StageResult<PathBuf> {
        let path = self.script_dir.join(bridge_file_name());
        if path.exists() {
            return Ok(path);
        }

        fs::create_dir_all(&self.script_dir).await.map_err(|e| {
            StageError::io(format!("creating directory {}", self.script_dir.display()), e)
        })?;
        fs::write(&path, BRIDGE_JS)
            .await
            .map_err(|e| StageError::io(format!("writing bridge script {}", path.display()), e))?;

        debug!("Extracted runtime bridge to {}", path.display());
        Ok(path)
    }
}

#[async_trait]
impl RuntimeLoader for NodeRuntimeLoader {
    async fn load(
        &self,
        cache_dir: &Path,
        proxy: &ProxySelection,
    ) -> StageResult<Box<dyn InterpreterRuntime>> {
        let script = self.bridge_script().await?;
        let command = format!("{} {}", self.node, script.display());

        let mut cmd = Command::new(&self.node);
        cmd.arg(&script)
            .current_dir(&self.project_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(settings) = proxy.settings() {
            cmd.envs(settings.child_env());
        }

        debug!("Executing: {}", command);
        let mut child = cmd
            .spawn()
            .map_err(|e| StageError::RuntimeSpawn { command, source: e })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| StageError::Internal("bridge stdin not piped".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| StageError::Internal("bridge stdout not piped".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        let mut runtime = NodeRuntime {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
            version: None,
        };

        let loaded = runtime
            .call(BridgeOp::Load {
                cache_dir: cache_dir.to_path_buf(),
                proxy: proxy.settings().map(|s| s.as_str().to_string()),
            })
            .await?;

        runtime.version = loaded
            .get("version")
            .and_then(|v| v.as_str())
            .map(String::from);
        info!(
            "Loaded Pyodide {}",
            runtime.version.as_deref().unwrap_or("(unknown version)")
        );

        Ok(Box::new(runtime))
    }

    fn runtime_name(&self) -> &'static str {
        "Pyodide (Node.js)"
    }
}

/// Forward bridge stderr to debug logs until the pipe closes
async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("bridge: {}", line);
    }
}

/// A running bridge process
struct NodeRuntime {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    version: Option<String>,
}

impl NodeRuntime {
    /// Send one request and wait for its response
    async fn call(&mut self, op: BridgeOp) -> StageResult<serde_json::Value> {
        let id = self.next_id;
        self.next_id += 1;

        let mut line = serde_json::to_string(&BridgeRequest { id, op: &op })?;
        line.push('\n');

        debug!("Bridge request #{}: {}", id, op.name());
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| StageError::io(format!("sending '{}' to runtime bridge", op.name()), e))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| StageError::io(format!("sending '{}' to runtime bridge", op.name()), e))?;

        loop {
            let next = self.stdout.next_line().await.map_err(|e| {
                StageError::io(format!("reading '{}' response from runtime bridge", op.name()), e)
            })?;

            let Some(line) = next else {
                return Err(StageError::BridgeClosed {
                    op: op.name().to_string(),
                });
            };

            match BridgeResponse::parse_line(&line) {
                Some(resp) if resp.id == Some(id) => {
                    return resp
                        .into_result()
                        .map_err(|reason| StageError::bridge(op.name(), reason));
                }
                Some(resp) if resp.id.is_none() => {
                    let reason = resp
                        .into_result()
                        .err()
                        .unwrap_or_else(|| "response without request id".to_string());
                    return Err(StageError::bridge(op.name(), reason));
                }
                _ => debug!("bridge: {}", line),
            }
        }
    }
}

#[async_trait]
impl InterpreterRuntime for NodeRuntime {
    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    async fn load_installer(&mut self, name: &str) -> StageResult<()> {
        self.call(BridgeOp::LoadInstaller {
            name: name.to_string(),
        })
        .await
        .map(|_| ())
    }

    async fn install(&mut self, package: &str) -> StageResult<()> {
        self.call(BridgeOp::Install {
            package: package.to_string(),
        })
        .await
        .map(|_| ())
    }

    async fn freeze(&mut self) -> StageResult<serde_json::Value> {
        self.call(BridgeOp::Freeze).await
    }

    async fn shutdown(&mut self) -> StageResult<()> {
        match self.call(BridgeOp::Shutdown).await {
            Ok(_) | Err(StageError::BridgeClosed { .. }) => {}
            Err(e) => {
                debug!("Bridge did not acknowledge shutdown: {}", e);
                self.child
                    .kill()
                    .await
                    .map_err(|e| StageError::io("killing runtime bridge", e))?;
            }
        }

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| StageError::io("waiting for runtime bridge", e))?;
        debug!("Runtime bridge exited: {}", status);
        Ok(())
    }
}
