//! Gemini-backed oracle
//!
//! Sends the audio inline with a fixed forensic prompt and a structured-output
//! schema. Uses a long-lived reqwest::Client for connection pooling.

use crate::config::OracleConfig;
use crate::error::AnalysisError;
use crate::input::AudioPayload;
use crate::models::Sample;
use crate::oracle::Oracle;
use crate::schema::{parse_sample, response_schema};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

const MAX_ERROR_BODY_CHARS: usize = 512;

const ANALYSIS_PROMPT: &str = r#"You are a world-class Forensic Vocal Scientist and A&R Executive.

CRITICAL IDENTIFICATION CHALLENGE:
1. DETECT THE SOURCE: Distinguish between the original artist and cover artists (e.g. an original singer vs. a cover singer performing the same song).
2. VOCAL PRINTING: Analyze the formant signatures, vibrato rate (Hz), and harmonic series of the voice. Famous artists have unique frequency "fingerprints."
3. AUTHENTICITY: If the audio is pitch-shifted, speed-altered, or AI-generated to mimic an artist, call it out in 'signatureReasoning'.
4. MUSIC THEORY: Verify if the singer is actually in key. If they are off-key, identify the specific dissonance.

All scores are on a 0-100 scale.
Provide a technical, clinical, and brutally honest report in JSON."#;

/// Reusable Gemini oracle (connection-pooled)
pub struct GeminiOracle {
    client: Client,
    config: OracleConfig,
}

impl GeminiOracle {
    pub fn new(config: OracleConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AnalysisError::Config(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn build_request(&self, payload: &AudioPayload) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: payload.mime_type.clone(),
                            data: payload.data.clone(),
                        },
                    },
                    Part::Text {
                        text: ANALYSIS_PROMPT.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
                temperature: self.config.temperature,
                thinking_config: ThinkingConfig {
                    thinking_budget: self.config.thinking_budget,
                },
            },
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Timeout(self.config.timeout)
        } else {
            AnalysisError::Transport(format!("Gemini API error: {}", e))
        }
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn classify(&self, payload: &AudioPayload) -> Result<Sample> {
        let request = self.build_request(payload);

        info!(model = %self.config.model, mime_type = %payload.mime_type, "Calling Gemini API");

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                self.transport_error(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let error_text: String = error_text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(AnalysisError::Transport(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let envelope: GenerateResponse = response.json().await.map_err(|e| {
            error!("Failed to read Gemini response: {}", e);
            self.transport_error(e)
        })?;

        if let Some(usage) = &envelope.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                candidate_tokens = usage.candidates_token_count,
                thoughts_tokens = usage.thoughts_token_count,
                "Gemini usage"
            );
        }

        let text = extract_text(&envelope)?;
        parse_sample(&text)
    }
}

/// Pull the answer text out of the first candidate, skipping thought parts
fn extract_text(envelope: &GenerateResponse) -> Result<String> {
    if let Some(reason) = envelope
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(AnalysisError::SchemaValidation(format!(
            "prompt blocked by Gemini: {}",
            reason
        )));
    }

    let candidate = envelope.candidates.first().ok_or_else(|| {
        AnalysisError::SchemaValidation("No candidates in Gemini response".to_string())
    })?;

    debug!(finish_reason = ?candidate.finish_reason, "Gemini candidate received");

    let text: String = candidate
        .content
        .as_ref()
        .map(|content| {
            content
                .parts
                .iter()
                .filter(|p| !p.thought.unwrap_or(false))
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::SchemaValidation(format!(
            "Empty response from Gemini (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
    temperature: f32,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i64>,
    candidates_token_count: Option<i64>,
    thoughts_token_count: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn oracle() -> GeminiOracle {
        GeminiOracle::new(OracleConfig::new("test-key")).unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let payload = AudioPayload {
            mime_type: "audio/mpeg".to_string(),
            data: "SUQz".to_string(),
        };

        let value = serde_json::to_value(oracle().build_request(&payload)).unwrap();
        let parts = &value["contents"][0]["parts"];

        assert_eq!(parts[0]["inlineData"]["mimeType"], json!("audio/mpeg"));
        assert_eq!(parts[0]["inlineData"]["data"], json!("SUQz"));
        assert!(parts[1]["text"].as_str().unwrap().contains("Forensic Vocal Scientist"));

        let generation = &value["generationConfig"];
        assert_eq!(generation["responseMimeType"], json!("application/json"));
        assert_eq!(generation["thinkingConfig"]["thinkingBudget"], json!(16384));
        assert_eq!(generation["responseSchema"]["type"], json!("OBJECT"));
    }

    #[test]
    fn test_missing_api_key() {
        assert!(GeminiOracle::new(OracleConfig::new("")).is_err());
    }

    #[test]
    fn test_extract_text_skips_thoughts() {
        let envelope: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking about formants", "thought": true },
                    { "text": "{\"a\":" },
                    { "text": "1}" }
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(extract_text(&envelope).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_extract_text_failures_are_schema_errors() {
        let blocked: GenerateResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        let err = extract_text(&blocked).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert!(err.to_string().contains("SAFETY"));

        let empty: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "MAX_TOKENS" }]
        }))
        .unwrap();
        let err = extract_text(&empty).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }
}
