//! Configuration schema for pystage
//!
//! Configuration is read from `pystage.toml` in the project root. Every
//! field has a default, so an empty file (or no file) stages the standard
//! package set into `static/pyodide`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Packages staged when the configuration does not list any
pub const DEFAULT_PACKAGES: &[&str] = &[
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
];

/// Hosts the runtime loader and installer talk to
pub const DEFAULT_PROBE_URLS: &[&str] = &[
    "https://cdn.jsdelivr.net",
    "https://pypi.org",
    "https://files.pythonhosted.org",
];

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Input and output locations
    pub paths: PathsConfig,

    /// Runtime bridge settings
    pub runtime: RuntimeConfig,

    /// Packages to stage
    pub packages: PackagesConfig,

    /// Static asset copy settings
    pub assets: AssetsConfig,

    /// Proxy and probe settings
    pub network: NetworkConfig,
}

impl Config {
    /// Check the configuration for values the stages cannot work with.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        self.packages.validate()?;

        match self.general.log_format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(format!(
                    "general.log_format must be \"text\" or \"json\", got \"{}\"",
                    other
                ))
            }
        }

        if self.runtime.node.trim().is_empty() {
            return Err("runtime.node must not be empty".to_string());
        }
        if self.runtime.installer.trim().is_empty() {
            return Err("runtime.installer must not be empty".to_string());
        }
        if self.paths.lock_file.as_os_str().is_empty() {
            return Err("paths.lock_file must not be empty".to_string());
        }

        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Filesystem locations, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Project manifest declaring the runtime version
    pub project_manifest: PathBuf,

    /// Runtime package cache directory
    pub cache_dir: PathBuf,

    /// Runtime distribution directory to copy from
    pub dist_dir: PathBuf,

    /// Lock file name inside the cache directory
    pub lock_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_manifest: PathBuf::from("package.json"),
            cache_dir: PathBuf::from("static/pyodide"),
            dist_dir: PathBuf::from("node_modules/pyodide"),
            lock_file: PathBuf::from("pyodide-lock.json"),
        }
    }
}

/// Runtime bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Node.js executable used to host the runtime
    pub node: String,

    /// npm package name of the runtime (also the manifest dependency key)
    pub package: String,

    /// Installer module loaded into the runtime
    pub installer: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            package: "pyodide".to_string(),
            installer: "micropip".to_string(),
        }
    }
}

/// Package list configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagesConfig {
    /// Packages installed in order
    pub install: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            install: DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PackagesConfig {
    /// Reject blank names and duplicates
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for (idx, name) in self.install.iter().enumerate() {
            let name = name.trim();
            if name.is_empty() {
                return Err(format!("packages.install[{}] is empty", idx));
            }
            if !seen.insert(name) {
                return Err(format!("packages.install lists '{}' more than once", name));
            }
        }
        Ok(())
    }

    /// Trimmed package names in install order
    pub fn names(&self) -> Vec<String> {
        self.install.iter().map(|p| p.trim().to_string()).collect()
    }
}

/// Asset copy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Destination directory for the runtime distribution
    pub dest_dir: PathBuf,

    /// Replace files that already exist at the destination
    pub overwrite: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dest_dir: PathBuf::from("static/pyodide"),
            overwrite: true,
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Explicit proxy URL, takes precedence over proxy environment variables
    pub proxy: Option<String>,

    /// URLs checked by `pystage proxy --check`
    pub probe_urls: Vec<String>,

    /// Per-request timeout for probes
    pub probe_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            probe_urls: DEFAULT_PROBE_URLS.iter().map(|u| u.to_string()).collect(),
            probe_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[packages]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.paths.cache_dir, PathBuf::from("static/pyodide"));
        assert_eq!(config.packages.install.len(), DEFAULT_PACKAGES.len());
        assert_eq!(config.packages.install[0], "micropip");
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [packages]
            install = ["micropip", "numpy"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.packages.install, vec!["micropip", "numpy"]);
        assert_eq!(config.runtime.installer, "micropip"); // default preserved
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn duplicate_packages_rejected() {
        let packages = PackagesConfig {
            install: vec!["numpy".into(), " numpy ".into()],
        };
        let err = packages.validate().unwrap_err();
        assert!(err.contains("'numpy' more than once"));
    }

    #[test]
    fn blank_package_rejected() {
        let packages = PackagesConfig {
            install: vec!["numpy".into(), "  ".into()],
        };
        assert!(packages.validate().unwrap_err().contains("install[1]"));
    }

    #[test]
    fn names_are_trimmed_in_order() {
        let packages = PackagesConfig {
            install: vec![" scipy".into(), "numpy ".into()],
        };
        assert_eq!(packages.names(), vec!["scipy", "numpy"]);
    }

    #[test]
    fn unknown_log_format_rejected() {
        let mut config = Config::default();
        config.general.log_format = "yaml".to_string();
        assert!(config.validate().unwrap_err().contains("log_format"));
    }
}
