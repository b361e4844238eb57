//! Init command - create a project-local pystage.toml

use crate::cli::args::InitArgs;
use crate::config::CONFIG_FILE_NAME;
use crate::error::{StageError, StageResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# pystage project configuration
# Every value below is the default; uncomment to change it.

[paths]
# project_manifest = "package.json"
# cache_dir = "static/pyodide"
# dist_dir = "node_modules/pyodide"
# lock_file = "pyodide-lock.json"

[runtime]
# node = "node"
# package = "pyodide"
# installer = "micropip"

[packages]
install = [
    "micropip",
    "packaging",
    "requests",
    "beautifulsoup4",
    "numpy",
    "pandas",
    "matplotlib",
    "scikit-learn",
    "scipy",
    "regex",
    "sympy",
    "tiktoken",
    "seaborn",
    "pytz",
    "black",
    "openai",
]

[assets]
# dest_dir = "static/pyodide"
# overwrite = true

[network]
# proxy = "http://proxy.internal:3128"   # overrides https_proxy/all_proxy/http_proxy
# probe_timeout_secs = 10
"#;

/// Execute the init command
pub async fn execute(args: InitArgs, project_root: &Path) -> StageResult<()> {
    let ctx = UiContext::detect();
    let config_path = project_root.join(CONFIG_FILE_NAME);

    if config_path.exists() && !args.force {
        return Err(StageError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    fs::create_dir_all(project_root).await.map_err(|e| {
        StageError::io(format!("creating directory {}", project_root.display()), e)
    })?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| StageError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok_detail(
        &ctx,
        "Created project config",
        &config_path.display().to_string(),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{schema::DEFAULT_PACKAGES, Config};
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_config() {
        let temp = TempDir::new().unwrap();
        execute(InitArgs { force: false }, temp.path()).await.unwrap();

        let content = std::fs::read_to_string(temp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(content.contains("[packages]"));
        assert!(content.contains("[network]"));
    }

    #[tokio::test]
    async fn init_refuses_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "existing").unwrap();

        let result = execute(InitArgs { force: false }, temp.path()).await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("already exists"));
    }

    #[tokio::test]
    async fn init_overwrites_with_force() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "old content").unwrap();

        execute(InitArgs { force: true }, temp.path()).await.unwrap();

        let content = std::fs::read_to_string(temp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(content.contains("[packages]"));
    }

    #[test]
    fn template_matches_defaults() {
        let config: Config = toml::from_str(INIT_TEMPLATE).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.packages.install, DEFAULT_PACKAGES);
    }
}
