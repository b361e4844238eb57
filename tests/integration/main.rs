//! Integration tests for pystage

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    const PROXY_VARS: [&str; 6] = [
        "https_proxy",
        "HTTPS_PROXY",
        "all_proxy",
        "ALL_PROXY",
        "http_proxy",
        "HTTP_PROXY",
    ];

    /// Command with a clean proxy environment and no inherited config
    fn pystage() -> Command {
        let mut cmd = cargo_bin_cmd!("pystage");
        for var in PROXY_VARS {
            cmd.env_remove(var);
        }
        cmd.env_remove("PYSTAGE_CONFIG");
        cmd
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn help_displays() {
        pystage()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("stage Pyodide packages"));
    }

    #[test]
    fn version_displays() {
        pystage()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pystage"));
    }

    #[test]
    fn config_path_without_file() {
        let temp = TempDir::new().unwrap();
        pystage()
            .args(["config", "path", "-p"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("pystage.toml"))
            .stdout(predicate::str::contains("using defaults"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        pystage()
            .args(["config", "show", "-p"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("[paths]"))
            .stdout(predicate::str::contains("micropip"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        pystage()
            .args(["config", "show", "-c"])
            .arg(temp.path().join("missing.toml"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn invalid_config_rejected() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("pystage.toml"),
            "[packages]\ninstall = [\"numpy\", \"numpy\"]\n",
        );
        pystage()
            .args(["config", "show", "-p"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("numpy"));
    }

    #[test]
    fn proxy_from_environment() {
        let temp = TempDir::new().unwrap();
        pystage()
            .args(["proxy", "-p"])
            .arg(temp.path())
            .env("https_proxy", "http://proxy.internal:3128")
            .env("http_proxy", "http://ignored.internal:8080")
            .assert()
            .success()
            .stdout(predicate::str::contains("proxy.internal:3128"))
            .stdout(predicate::str::contains("ignored.internal").not());
    }

    #[test]
    fn proxy_unsupported_scheme_ignored() {
        let temp = TempDir::new().unwrap();
        pystage()
            .args(["proxy", "-p"])
            .arg(temp.path())
            .env("all_proxy", "socks5://proxy.internal:1080")
            .assert()
            .success()
            .stdout(predicate::str::contains("Ignoring proxy"));
    }

    #[test]
    fn proxy_none() {
        let temp = TempDir::new().unwrap();
        pystage()
            .args(["proxy", "-p"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("No proxy configured"));
    }

    #[test]
    fn no_proxy_flag_wins() {
        let temp = TempDir::new().unwrap();
        pystage()
            .args(["--no-proxy", "proxy", "-p"])
            .arg(temp.path())
            .env("HTTPS_PROXY", "http://proxy.internal:3128")
            .assert()
            .success()
            .stdout(predicate::str::contains("No proxy configured"));
    }

    #[test]
    fn assets_copies_runtime() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("node_modules/pyodide/pyodide.asm.wasm"),
            "wasm",
        );
        write(
            &temp.path().join("node_modules/pyodide/ffi/index.d.ts"),
            "types",
        );

        pystage()
            .args(["assets", "-p"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("2 copied"));

        assert!(temp.path().join("static/pyodide/pyodide.asm.wasm").exists());
        assert!(temp.path().join("static/pyodide/ffi/index.d.ts").exists());
    }

    #[test]
    fn assets_missing_dist_skipped() {
        let temp = TempDir::new().unwrap();
        pystage()
            .args(["assets", "-p"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Skipped"));
    }

    #[test]
    fn init_then_refuse() {
        let temp = TempDir::new().unwrap();
        pystage()
            .args(["init", "-p"])
            .arg(temp.path())
            .assert()
            .success();
        assert!(temp.path().join("pystage.toml").exists());

        pystage()
            .args(["init", "-p"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn completions_bash() {
        pystage()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("pystage"));
    }

    fn project_without_node(temp: &TempDir) {
        write(
            &temp.path().join("pystage.toml"),
            "[runtime]\nnode = \"pystage-no-such-node\"\n",
        );
        write(
            &temp.path().join("package.json"),
            r#"{"dependencies": {"pyodide": "^0.27.2"}}"#,
        );
    }

    #[test]
    fn packages_without_runtime_reports_and_continues() {
        let temp = TempDir::new().unwrap();
        project_without_node(&temp);

        pystage()
            .args(["packages", "-p"])
            .arg(temp.path())
            .env("XDG_CACHE_HOME", temp.path().join(".cache"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Failed to load runtime"));

        assert!(!temp.path().join("static/pyodide/pyodide-lock.json").exists());
    }

    #[test]
    fn packages_strict_fails_without_runtime() {
        let temp = TempDir::new().unwrap();
        project_without_node(&temp);

        pystage()
            .args(["packages", "--strict", "-p"])
            .arg(temp.path())
            .env("XDG_CACHE_HOME", temp.path().join(".cache"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("--strict"));
    }

    #[test]
    fn prepare_copies_assets_after_failed_stage() {
        let temp = TempDir::new().unwrap();
        project_without_node(&temp);
        write(&temp.path().join("node_modules/pyodide/pyodide.mjs"), "js");

        pystage()
            .args(["prepare", "-p"])
            .arg(temp.path())
            .env("XDG_CACHE_HOME", temp.path().join(".cache"))
            .assert()
            .success()
            .stdout(predicate::str::contains("staged with warnings"));

        assert!(temp.path().join("static/pyodide/pyodide.mjs").exists());
    }

    #[test]
    fn prepare_continues_past_invalid_proxy() {
        let temp = TempDir::new().unwrap();
        project_without_node(&temp);
        write(&temp.path().join("node_modules/pyodide/pyodide.mjs"), "js");

        pystage()
            .args(["prepare", "-p"])
            .arg(temp.path())
            .env("HTTPS_PROXY", "http://")
            .env("XDG_CACHE_HOME", temp.path().join(".cache"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Invalid proxy URL"))
            .stdout(predicate::str::contains("Using network proxy").not());

        assert!(temp.path().join("static/pyodide/pyodide.mjs").exists());
    }
}
