//! Remote model client for health analysis.
//!
//! Speaks the Generative Language `generateContent` REST surface. The
//! request pins a JSON response schema and a low temperature so verdicts
//! stay near-deterministic; the response is decoded strictly into
//! [`Analysis`](super::Analysis). Every failure is a typed [`RemoteError`]
//! that the caller maps to the local fallback -- nothing propagates.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::Analysis;
use crate::config::BrainConfig;
use crate::probe::Region;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("empty response from model")]
    EmptyResponse,
    #[error("response failed schema validation: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Thin client over the remote model endpoint.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(cfg: &BrainConfig, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(cfg.timeout_sec))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
        }
    }

    /// Classify one probe sweep.
    pub async fn classify(&self, regions: &[Region]) -> Result<Analysis, RemoteError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(regions) }] }],
            "generationConfig": {
                "temperature": 0.1,
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = payload
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .ok_or(RemoteError::EmptyResponse)?;

        Ok(serde_json::from_str(text)?)
    }
}

fn build_prompt(regions: &[Region]) -> String {
    let metrics = serde_json::to_string_pretty(regions).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are an autonomous infrastructure reliability engineer.\n\
         Analyze the following DNS probe data from {} global regions.\n\n\
         Normal thresholds:\n\
         - US: < 100ms\n\
         - EU: < 150ms\n\
         - Asia: < 250ms\n\n\
         If multiple regions show high latency (>300ms) or TIMEOUT, declare CRITICAL status and recommend FAILOVER.\n\n\
         Current Metrics:\n{}",
        regions.len(),
        metrics
    )
}

/// Response schema sent with every request. Keeps the model output inside
/// the three-field verdict shape.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "status": { "type": "STRING", "enum": ["HEALTHY", "CRITICAL", "WARNING"] },
            "reasoning": { "type": "STRING" },
            "recommendedAction": { "type": "STRING", "enum": ["NONE", "FAILOVER", "SCALE_UP"] }
        },
        "required": ["status", "reasoning", "recommendedAction"]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{RegionId, RegionStatus};

    fn sample_regions() -> Vec<Region> {
        vec![
            Region {
                id: RegionId::UsCentral1,
                name: "US Central (Iowa)".to_string(),
                latency: 1250,
                status: RegionStatus::Degraded,
            },
            Region {
                id: RegionId::EuropeWest1,
                name: "Europe West (Belgium)".to_string(),
                latency: 2100,
                status: RegionStatus::Timeout,
            },
        ]
    }

    #[test]
    fn test_prompt_carries_metrics_and_rubric() {
        let prompt = build_prompt(&sample_regions());
        assert!(prompt.contains("2 global regions"));
        assert!(prompt.contains("us-central1"));
        assert!(prompt.contains("TIMEOUT"));
        assert!(prompt.contains("declare CRITICAL status and recommend FAILOVER"));
    }

    #[test]
    fn test_response_schema_is_closed() {
        let schema = response_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 3);
        let status_enum = schema["properties"]["status"]["enum"].as_array().unwrap();
        assert_eq!(status_enum.len(), 3);
    }

    #[test]
    fn test_candidate_envelope_decodes() {
        let raw = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "{\"status\":\"CRITICAL\",\"reasoning\":\"x\",\"recommendedAction\":\"FAILOVER\"}" } ] } }
            ]
        }"#;
        let payload: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text = &payload.candidates[0].content.parts[0].text;
        let analysis: Analysis = serde_json::from_str(text).unwrap();
        assert_eq!(analysis.status, super::super::HealthStatus::Critical);
    }

    #[test]
    fn test_empty_candidates_decodes_to_empty_vec() {
        let payload: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(payload.candidates.is_empty());
    }
}
