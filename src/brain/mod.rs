//! Health analysis -- the "Brain" role.
//!
//! The brain turns one probe sweep into a verdict: healthy, warning, or
//! critical, plus a recommended action. The primary implementation asks a
//! remote model; every failure mode (missing credential, HTTP error,
//! timeout, malformed response) degrades to a deterministic local
//! heuristic, so callers always get a valid verdict.

pub mod remote;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::BrainConfig;
use crate::probe::{Region, RegionStatus};

/// Latency above which a single region is considered critically degraded (ms).
pub const CRITICAL_LATENCY_MS: u32 = 400;

/// Overall verdict on the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Critical,
    Warning,
}

/// What the brain recommends doing about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    None,
    Failover,
    ScaleUp,
}

/// Structured analysis result. The remote model is constrained to exactly
/// this shape; anything missing, extra, or out-of-enum fails decode and
/// routes to the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Analysis {
    pub status: HealthStatus,
    pub reasoning: String,
    pub recommended_action: RecommendedAction,
}

/// Pluggable health classifier seam. The sentinel loop only sees this
/// trait; tests substitute fixed or failing implementations.
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, regions: &[Region]) -> Result<Analysis>;
}

/// Deterministic local verdict: any region timing out or above the
/// critical latency threshold makes the sweep CRITICAL.
pub fn heuristic(regions: &[Region]) -> Analysis {
    let critical_count = regions
        .iter()
        .filter(|r| r.status == RegionStatus::Timeout || r.latency > CRITICAL_LATENCY_MS)
        .count();

    if critical_count >= 1 {
        Analysis {
            status: HealthStatus::Critical,
            reasoning: format!(
                "Detected critical failure in {} region(s). Latency spikes exceed {}ms or timeouts observed. Primary path compromised.",
                critical_count, CRITICAL_LATENCY_MS
            ),
            recommended_action: RecommendedAction::Failover,
        }
    } else {
        Analysis {
            status: HealthStatus::Healthy,
            reasoning: "Global latency within nominal operational parameters. No anomalies detected in ingress traffic.".to_string(),
            recommended_action: RecommendedAction::None,
        }
    }
}

/// Production brain: remote model when a credential is configured, local
/// heuristic otherwise (and on any remote failure).
pub struct Brain {
    remote: Option<remote::GeminiClient>,
    model: String,
}

impl Brain {
    /// Build from config. The API key is read from the environment variable
    /// named by the config; absent or empty means local-only operation.
    pub fn from_config(cfg: &BrainConfig) -> Self {
        let remote = match std::env::var(&cfg.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Some(remote::GeminiClient::new(cfg, key)),
            _ => None,
        };
        Self {
            remote,
            model: cfg.model.clone(),
        }
    }

    /// A brain that never calls out. Used by immediate-mode CLI paths and
    /// anywhere a credential lookup is undesirable.
    pub fn local_only() -> Self {
        Self {
            remote: None,
            model: String::new(),
        }
    }

    /// One-line description of the analyzer mode, for the boot journal.
    pub fn describe(&self) -> String {
        match &self.remote {
            Some(_) => format!("Connected to remote analyzer ({}).", self.model),
            None => "No API credential configured. Using local heuristic analyzer.".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Analyzer for Brain {
    async fn analyze(&self, regions: &[Region]) -> Result<Analysis> {
        if let Some(client) = &self.remote {
            match client.classify(regions).await {
                Ok(analysis) => return Ok(analysis),
                Err(e) => {
                    warn!(error = %e, "remote analysis failed, falling back to local heuristic");
                }
            }
        }
        Ok(heuristic(regions))
    }
}
