//! Outbound proxy selection
//!
//! The proxy is chosen once per run from the environment (or an explicit
//! config value) and passed to every component that makes network calls.
//!
//! Precedence:
//! 1. `--no-proxy` disables selection.
//! 2. Config `network.proxy` overrides the environment.
//! 3. `https_proxy`, `HTTPS_PROXY`
//! 4. `all_proxy`, `ALL_PROXY`
//! 5. `http_proxy`, `HTTP_PROXY`
//!
//! Only the single preferred value is considered. If it is not an http(s)
//! URL there is no fallback to a lower tier.

use crate::error::{StageError, StageResult};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Proxy environment variables by tier, lowercase name first
pub const PROXY_ENV_TIERS: [(&str, &str); 3] = [
    ("https_proxy", "HTTPS_PROXY"),
    ("all_proxy", "ALL_PROXY"),
    ("http_proxy", "HTTP_PROXY"),
];

/// Source label used when the proxy comes from configuration
pub const CONFIG_SOURCE: &str = "network.proxy";

/// A validated proxy URL and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    url: Url,
    source: String,
}

impl ProxySettings {
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Environment variable (or config key) the proxy was read from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Environment for child processes that should route through this proxy
    pub fn child_env(&self) -> Vec<(&'static str, String)> {
        let url = self.as_str().to_string();
        vec![
            ("HTTPS_PROXY", url.clone()),
            ("https_proxy", url.clone()),
            ("HTTP_PROXY", url.clone()),
            ("http_proxy", url),
            ("NODE_USE_ENV_PROXY", "1".to_string()),
        ]
    }
}

/// Result of proxy selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxySelection {
    /// No proxy configured (or selection disabled)
    None,
    /// Preferred value uses a scheme other than http(s), e.g. socks5
    Unsupported { source: String, value: String },
    /// Preferred value could not be parsed as a URL
    Invalid {
        source: String,
        value: String,
        reason: String,
    },
    /// Proxy to use for all outbound requests
    Selected(ProxySettings),
}

impl ProxySelection {
    /// Select a proxy from the process environment
    pub fn from_env() -> Self {
        select_proxy(|name| std::env::var(name).ok())
    }

    /// The usable proxy, if one was selected
    pub fn settings(&self) -> Option<&ProxySettings> {
        match self {
            Self::Selected(settings) => Some(settings),
            _ => None,
        }
    }

    /// Log the selection outcome. Rejected values are never fatal.
    pub fn log(&self) {
        match self {
            Self::None => debug!("No network proxy configured"),
            Self::Unsupported { source, value } => {
                info!(
                    "Ignoring proxy \"{}\" from {}: only http(s) proxies are supported",
                    value, source
                );
            }
            Self::Invalid { value, reason, .. } => {
                warn!("Invalid network proxy URL: \"{}\" ({})", value, reason);
            }
            Self::Selected(settings) => {
                info!(
                    "Initialized network proxy \"{}\" from {}",
                    settings.as_str(),
                    settings.source()
                );
            }
        }
    }
}

/// First non-empty variable of a tier, lowercase name first
fn first_set(
    lookup: &impl Fn(&str) -> Option<String>,
    (lower, upper): (&'static str, &'static str),
) -> Option<(&'static str, String)> {
    [lower, upper].into_iter().find_map(|name| {
        lookup(name)
            .filter(|value| !value.is_empty())
            .map(|value| (name, value))
    })
}

/// Pick the preferred proxy variable and its value without validating it
pub fn preferred_candidate(
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<(&'static str, String)> {
    PROXY_ENV_TIERS
        .into_iter()
        .find_map(|tier| first_set(&lookup, tier))
}

/// Validate a single candidate value
fn validate_candidate(source: &str, value: &str) -> ProxySelection {
    let unsupported = || ProxySelection::Unsupported {
        source: source.to_string(),
        value: value.to_string(),
    };

    if !value.starts_with("http") {
        return unsupported();
    }

    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            ProxySelection::Selected(ProxySettings {
                url,
                source: source.to_string(),
            })
        }
        Ok(_) => unsupported(),
        Err(e) => ProxySelection::Invalid {
            source: source.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        },
    }
}

/// Select a proxy from an environment lookup function
pub fn select_proxy(lookup: impl Fn(&str) -> Option<String>) -> ProxySelection {
    match preferred_candidate(lookup) {
        Some((source, value)) => validate_candidate(source, &value),
        None => ProxySelection::None,
    }
}

/// Resolve the effective proxy from CLI flags, config and environment
pub fn resolve_proxy(
    disabled: bool,
    configured: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> ProxySelection {
    if disabled {
        debug!("Proxy selection disabled (--no-proxy)");
        return ProxySelection::None;
    }

    if let Some(value) = configured.map(str::trim).filter(|v| !v.is_empty()) {
        return validate_candidate(CONFIG_SOURCE, value);
    }

    select_proxy(lookup)
}

/// Outcome of probing one URL
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub url: String,
    /// HTTP status on success, error text otherwise
    pub outcome: Result<u16, String>,
}

impl ProbeResult {
    pub fn reachable(&self) -> bool {
        matches!(self.outcome, Ok(status) if status < 500)
    }
}

/// Send a HEAD request to each URL through the selected proxy
pub async fn probe(
    urls: &[String],
    proxy: Option<&ProxySettings>,
    timeout: Duration,
) -> StageResult<Vec<ProbeResult>> {
    let urls = urls.to_vec();
    let proxy_url = proxy.map(|p| p.as_str().to_string());

    tokio::task::spawn_blocking(move || probe_blocking(&urls, proxy_url.as_deref(), timeout))
        .await
        .map_err(|e| StageError::Internal(format!("probe task failed: {}", e)))?
}

fn probe_blocking(
    urls: &[String],
    proxy_url: Option<&str>,
    timeout: Duration,
) -> StageResult<Vec<ProbeResult>> {
    let proxy = proxy_url
        .map(ureq::Proxy::new)
        .transpose()
        .map_err(|e| StageError::Probe(format!("proxy rejected by HTTP client: {}", e)))?;

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .proxy(proxy)
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into();

    let results = urls
        .iter()
        .map(|url| {
            debug!("Probing {}", url);
            let outcome = agent
                .head(url.as_str())
                .call()
                .map(|resp| resp.status().as_u16())
                .map_err(|e| e.to_string());
            ProbeResult {
                url: url.clone(),
                outcome,
            }
        })
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn selected_source(selection: &ProxySelection) -> &str {
        selection.settings().expect("proxy selected").source()
    }

    // ---- precedence ----

    #[test]
    fn each_variable_alone_is_selected() {
        for (lower, upper) in PROXY_ENV_TIERS {
            for name in [lower, upper] {
                let selection = select_proxy(env(&[(name, "http://proxy:3128")]));
                assert_eq!(selected_source(&selection), name);
            }
        }
    }

    #[test]
    fn https_beats_all_and_http() {
        let selection = select_proxy(env(&[
            ("HTTP_PROXY", "http://h:1"),
            ("ALL_PROXY", "http://a:1"),
            ("HTTPS_PROXY", "http://s:1"),
        ]));
        assert_eq!(selected_source(&selection), "HTTPS_PROXY");
    }

    #[test]
    fn all_beats_http() {
        let selection = select_proxy(env(&[
            ("http_proxy", "http://h:1"),
            ("ALL_PROXY", "http://a:1"),
        ]));
        assert_eq!(selected_source(&selection), "ALL_PROXY");
    }

    #[test]
    fn lowercase_beats_uppercase_within_tier() {
        for (lower, upper) in PROXY_ENV_TIERS {
            let selection = select_proxy(env(&[(upper, "http://up:1"), (lower, "http://low:1")]));
            assert_eq!(selected_source(&selection), lower);
        }
    }

    #[test]
    fn empty_value_counts_as_unset() {
        let selection = select_proxy(env(&[("https_proxy", ""), ("HTTPS_PROXY", "http://s:1")]));
        assert_eq!(selected_source(&selection), "HTTPS_PROXY");
    }

    #[test]
    fn nothing_set() {
        assert_eq!(select_proxy(env(&[])), ProxySelection::None);
    }

    // ---- validation ----

    #[test]
    fn socks_proxy_is_unsupported_without_fallback() {
        let selection = select_proxy(env(&[
            ("https_proxy", "socks5://127.0.0.1:1080"),
            ("http_proxy", "http://fallback:3128"),
        ]));
        assert!(matches!(selection, ProxySelection::Unsupported { .. }));
        assert!(selection.settings().is_none());
    }

    #[test]
    fn non_http_scheme_with_http_prefix_is_unsupported() {
        let selection = select_proxy(env(&[("all_proxy", "httpx://proxy:1")]));
        assert!(matches!(selection, ProxySelection::Unsupported { .. }));
    }

    #[test]
    fn unparsable_url_is_invalid() {
        let selection = select_proxy(env(&[("HTTPS_PROXY", "http://")]));
        match selection {
            ProxySelection::Invalid { source, value, .. } => {
                assert_eq!(source, "HTTPS_PROXY");
                assert_eq!(value, "http://");
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn selected_url_is_normalized() {
        let selection = select_proxy(env(&[("http_proxy", "http://Proxy.Local:3128")]));
        assert_eq!(
            selection.settings().unwrap().as_str(),
            "http://proxy.local:3128/"
        );
    }

    #[test]
    fn child_env_routes_both_schemes() {
        let selection = select_proxy(env(&[("https_proxy", "https://p:8443")]));
        let child_env = selection.settings().unwrap().child_env();
        assert!(child_env.contains(&("HTTPS_PROXY", "https://p:8443/".to_string())));
        assert!(child_env.contains(&("HTTP_PROXY", "https://p:8443/".to_string())));
        assert!(child_env.contains(&("NODE_USE_ENV_PROXY", "1".to_string())));
    }

    // ---- resolve_proxy ----

    #[test]
    fn disabled_ignores_everything() {
        let selection = resolve_proxy(
            true,
            Some("http://cfg:1"),
            env(&[("https_proxy", "http://s:1")]),
        );
        assert_eq!(selection, ProxySelection::None);
    }

    #[test]
    fn configured_proxy_overrides_env() {
        let selection = resolve_proxy(
            false,
            Some("http://cfg:1"),
            env(&[("https_proxy", "http://s:1")]),
        );
        assert_eq!(selected_source(&selection), CONFIG_SOURCE);
    }

    #[test]
    fn blank_configured_proxy_falls_back_to_env() {
        let selection = resolve_proxy(false, Some("  "), env(&[("http_proxy", "http://h:1")]));
        assert_eq!(selected_source(&selection), "http_proxy");
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        let names: Vec<&str> = PROXY_ENV_TIERS
            .iter()
            .flat_map(|(lower, upper)| [*lower, *upper])
            .collect();
        let saved: Vec<(&str, Option<String>)> =
            names.iter().map(|n| (*n, std::env::var(n).ok())).collect();

        for name in &names {
            std::env::remove_var(name);
        }
        std::env::set_var("ALL_PROXY", "http://from-env:8080");

        let selection = ProxySelection::from_env();

        for (name, value) in saved {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }

        assert_eq!(selected_source(&selection), "ALL_PROXY");
    }

    #[test]
    fn probe_result_reachability() {
        let ok = ProbeResult {
            url: "https://pypi.org".into(),
            outcome: Ok(200),
        };
        let down = ProbeResult {
            url: "https://pypi.org".into(),
            outcome: Ok(503),
        };
        let failed = ProbeResult {
            url: "https://pypi.org".into(),
            outcome: Err("timeout".into()),
        };
        assert!(ok.reachable());
        assert!(!down.reachable());
        assert!(!failed.reachable());
    }
}
