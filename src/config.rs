//! TOML configuration for the Routewarden daemon.
//!
//! Layered model: an explicit path (CLI flag), then the `ROUTEWARDEN_CONFIG`
//! environment variable, then `/etc/routewarden/routewarden.toml`, then
//! compiled-in defaults. Every section has sane defaults so a bare binary
//! runs a full drill out of the box.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub sentinel: SentinelConfig,
    #[serde(default)]
    pub brain: BrainConfig,
    #[serde(default)]
    pub route: RouteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WardenConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try to load configuration from, in order:
    /// 1. The path specified by the `ROUTEWARDEN_CONFIG` environment variable.
    /// 2. `/etc/routewarden/routewarden.toml`.
    /// 3. Fall back to compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var("ROUTEWARDEN_CONFIG") {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "ROUTEWARDEN_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let system_path = Path::new("/etc/routewarden/routewarden.toml");
        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Sentinel loop
// ---------------------------------------------------------------------------

/// Timing and buffer sizing for the sense-think-act loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Period of the probe tick in milliseconds.
    pub tick_interval_ms: u64,
    /// Delay between a critical verdict and the simulated failover.
    pub failover_delay_ms: u64,
    /// Delay between chaos clearing and the primary route being restored.
    pub route_restore_delay_ms: u64,
    /// Probe readings retained for charting.
    pub history_len: usize,
    /// Journal entries retained.
    pub journal_len: usize,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            failover_delay_ms: 1500,
            route_restore_delay_ms: 3000,
            history_len: 20,
            journal_len: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// Brain
// ---------------------------------------------------------------------------

/// Remote analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Environment variable holding the API key. Unset or empty means the
    /// local heuristic runs alone.
    pub api_key_env: String,
    /// Model identifier passed to the remote endpoint.
    pub model: String,
    /// Base URL of the Generative Language API.
    pub endpoint: String,
    /// Hard timeout on the remote call, in seconds.
    pub timeout_sec: u64,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GEMINI_API_KEY".to_string(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            timeout_sec: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// Addresses used in the simulated DNS record change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Primary A record target.
    pub primary_addr: String,
    /// Backup provider A record target.
    pub backup_addr: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            primary_addr: "192.0.2.1".to_string(),
            backup_addr: "203.0.113.5".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// HTTP API listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the JSON API.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = WardenConfig::default();

        assert_eq!(cfg.sentinel.tick_interval_ms, 2000);
        assert_eq!(cfg.sentinel.failover_delay_ms, 1500);
        assert_eq!(cfg.sentinel.route_restore_delay_ms, 3000);
        assert_eq!(cfg.sentinel.history_len, 20);
        assert_eq!(cfg.sentinel.journal_len, 50);

        assert_eq!(cfg.brain.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.brain.model, "gemini-2.5-flash");
        assert_eq!(cfg.brain.timeout_sec, 10);

        assert_eq!(cfg.route.primary_addr, "192.0.2.1");
        assert_eq!(cfg.route.backup_addr, "203.0.113.5");

        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_parse_example_toml() {
        let toml_str = r#"
[sentinel]
tick_interval_ms = 500
failover_delay_ms = 100
route_restore_delay_ms = 250
history_len = 10
journal_len = 25

[brain]
api_key_env = "WARDEN_MODEL_KEY"
model = "gemini-2.0-flash"
endpoint = "https://example.invalid"
timeout_sec = 3

[route]
primary_addr = "198.51.100.7"
backup_addr = "203.0.113.99"

[server]
bind = "127.0.0.1:9090"

[logging]
level = "debug"
"#;

        let cfg: WardenConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(cfg.sentinel.tick_interval_ms, 500);
        assert_eq!(cfg.sentinel.history_len, 10);
        assert_eq!(cfg.brain.api_key_env, "WARDEN_MODEL_KEY");
        assert_eq!(cfg.brain.endpoint, "https://example.invalid");
        assert_eq!(cfg.route.primary_addr, "198.51.100.7");
        assert_eq!(cfg.server.bind, "127.0.0.1:9090");
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[sentinel]
tick_interval_ms = 250
"#;

        let cfg: WardenConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(cfg.sentinel.tick_interval_ms, 250);
        // Everything else should be defaults.
        assert_eq!(cfg.sentinel.failover_delay_ms, 1500);
        assert_eq!(cfg.brain.model, "gemini-2.5-flash");
        assert_eq!(cfg.route.backup_addr, "203.0.113.5");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let cfg: WardenConfig = toml::from_str("").unwrap();
        let defaults = WardenConfig::default();

        assert_eq!(cfg.sentinel.tick_interval_ms, defaults.sentinel.tick_interval_ms);
        assert_eq!(cfg.brain.api_key_env, defaults.brain.api_key_env);
        assert_eq!(cfg.server.bind, defaults.server.bind);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("routewarden.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "0.0.0.0:9999"
"#,
        )
        .unwrap();

        let cfg = WardenConfig::load(&path).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:9999");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = WardenConfig::load(Path::new("/nonexistent/path/routewarden.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let cfg = WardenConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let roundtripped: WardenConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(cfg.sentinel.journal_len, roundtripped.sentinel.journal_len);
        assert_eq!(cfg.brain.model, roundtripped.brain.model);
        assert_eq!(cfg.route.primary_addr, roundtripped.route.primary_addr);
    }
}
