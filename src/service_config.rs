// =============================================================================
// Service Configuration
// =============================================================================
//
// Startup settings for the TickerLens API. Loaded once from
// `service_config.json`; every field carries a serde default so a partial or
// missing file still yields a working service. A handful of `TICKERLENS_*`
// environment variables override the file after loading.
//
// The config is read-only after startup and shared behind an `Arc`.
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::span;
use crate::types::SourceKind;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_span() -> String {
    "2y".to_string()
}

// =============================================================================
// ServiceConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Which bar source backs the service.
    #[serde(default)]
    pub source: SourceKind,

    /// Base URL of the HTTP upstream (`source = "http"`).
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Directory of `{TICKER}.json` files (`source = "directory"`).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Upper bound on a single source fetch, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Span token used when a request does not name one.
    #[serde(default = "default_span")]
    pub default_span: String,

    /// Attach fundamentals unless the request says otherwise.
    #[serde(default = "default_true")]
    pub include_fundamentals: bool,

    /// Round prices to 2 decimals and MACD to 4 in responses.
    #[serde(default = "default_true")]
    pub round_output: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            source: SourceKind::default(),
            upstream_url: default_upstream_url(),
            data_dir: default_data_dir(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            default_span: default_span(),
            include_fundamentals: true,
            round_output: true,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing or unreadable file is an error so the caller can fall back to
    /// defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read service config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse service config from {}", path.display()))?;

        info!(
            path = %path.display(),
            source = %config.source,
            bind_addr = %config.bind_addr,
            "service config loaded"
        );

        Ok(config)
    }

    /// Apply `TICKERLENS_*` overrides. `lookup` is `std::env::var` in
    /// production and a map in tests. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(raw) = get("TICKERLENS_SOURCE") {
            match raw.parse::<SourceKind>() {
                Ok(kind) => self.source = kind,
                Err(e) => warn!(error = %e, "ignoring TICKERLENS_SOURCE"),
            }
        }
        if let Some(addr) = get("TICKERLENS_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(url) = get("TICKERLENS_UPSTREAM_URL") {
            self.upstream_url = url;
        }
        if let Some(dir) = get("TICKERLENS_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(token) = get("TICKERLENS_DEFAULT_SPAN") {
            if span::try_resolve(&token).is_none() {
                warn!(token = %token, "TICKERLENS_DEFAULT_SPAN is not a known span, requests will use 2y");
            }
            self.default_span = token;
        }
    }

    /// Timeout applied to each source fetch. Never zero.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000");
        assert_eq!(cfg.source, SourceKind::Http);
        assert_eq!(cfg.default_span, "2y");
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(15));
        assert!(cfg.include_fundamentals);
        assert!(cfg.round_output);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, ServiceConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "source": "directory", "data_dir": "/srv/bars", "round_output": false }"#;
        let cfg: ServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.source, SourceKind::Directory);
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/bars"));
        assert!(!cfg.round_output);
        assert!(cfg.include_fundamentals);
        assert_eq!(cfg.upstream_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "bind_addr": "127.0.0.1:9000" }}"#).unwrap();
        let cfg = ServiceConfig::load(file.path()).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");

        assert!(ServiceConfig::load("/definitely/not/here.json").is_err());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [
            ("TICKERLENS_SOURCE", "dir"),
            ("TICKERLENS_BIND_ADDR", "127.0.0.1:7000"),
            ("TICKERLENS_DATA_DIR", "./fixtures"),
            ("TICKERLENS_DEFAULT_SPAN", "ytd"),
            ("TICKERLENS_UPSTREAM_URL", "   "),
        ]
        .into_iter()
        .collect();

        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.source, SourceKind::Directory);
        assert_eq!(cfg.bind_addr, "127.0.0.1:7000");
        assert_eq!(cfg.data_dir, PathBuf::from("./fixtures"));
        assert_eq!(cfg.default_span, "ytd");
        // Blank value leaves the default in place.
        assert_eq!(cfg.upstream_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn bad_source_override_is_ignored() {
        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(|k| (k == "TICKERLENS_SOURCE").then(|| "ftp".to_string()));
        assert_eq!(cfg.source, SourceKind::Http);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let cfg = ServiceConfig {
            fetch_timeout_secs: 0,
            ..ServiceConfig::default()
        };
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(1));
    }
}
