//! Google Gemini integration.
//!
//! Implements the `Summarizer` trait against the `generateContent` REST
//! endpoint. One request per call; failures are returned, not retried.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Summarizer;
use crate::providers::{ensure_success, http_client, USER_AGENT};
use crate::types::ScoutError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const PROVIDER_NAME: &str = "gemini";

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

fn reply_text(body: GenerateResponse) -> Result<String> {
    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ScoutError::malformed(PROVIDER_NAME, "response has no candidates"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        anyhow::bail!(ScoutError::malformed(
            PROVIDER_NAME,
            format!("empty reply (finish reason: {reason})")
        ));
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    http: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, model: Option<String>, timeout_secs: u64) -> Result<Self> {
        let http = http_client(USER_AGENT, timeout_secs)
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending Gemini request");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret().as_str())
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?;

        let resp = ensure_success(resp, PROVIDER_NAME).await?;
        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ScoutError::malformed(PROVIDER_NAME, e.to_string()))?;

        if let Some(usage) = &body.usage_metadata {
            info!(
                model = %self.model,
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini reply received"
            );
        }

        reply_text(body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some("hello".to_string()),
                }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "contents": [{ "parts": [{ "text": "hello" }] }] })
        );
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let body: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Moderately " }, { "text": "Bullish" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 8 }
        }))
        .unwrap();
        assert_eq!(reply_text(body).unwrap(), "Moderately Bullish");
    }

    #[test]
    fn test_reply_text_blocked() {
        let body: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();
        let err = reply_text(body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_no_candidates() {
        let body: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(reply_text(body).is_err());
    }

    #[test]
    fn test_default_model() {
        let client = GeminiClient::new(SecretString::new("k".to_string()), None, 5).unwrap();
        assert_eq!(client.model_name(), "gemini-2.5-flash");
    }
}
