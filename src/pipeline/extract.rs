//! VLM interaction: send the encoded boletim to Gemini and read the scores.
//!
//! One `generateContent` request per analysis, carrying the document as
//! `inlineData`, the extraction instruction, and a `responseSchema` that pins
//! the answer to the six expected fields. All prompt text lives in
//! [`crate::prompts`] and all response cleanup in
//! [`crate::pipeline::postprocess`].
//!
//! There is deliberately no retry: a failed attempt is reported to the
//! participant, who can try again. A request timeout bounds the wait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{FlowConfig, API_KEY_ENV_VARS};
use crate::error::BoletimError;
use crate::output::ReportCardData;
use crate::pipeline::encode::EncodedDocument;
use crate::pipeline::postprocess::parse_report_card;
use crate::prompts::{response_schema, EXTRACTION_PROMPT};

/// Provider name used in errors and logs.
pub const PROVIDER: &str = "gemini";

/// Anything that can read scores out of an encoded boletim.
///
/// [`GeminiExtractor`] is the production implementation; tests and
/// alternative front-ends can supply their own.
#[async_trait]
pub trait ScoreExtractor: Send + Sync {
    async fn extract(&self, document: &EncodedDocument) -> Result<ReportCardData, BoletimError>;
}

/// Extraction client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    prompt: String,
    timeout_secs: u64,
}

impl GeminiExtractor {
    pub fn new(config: &FlowConfig) -> Result<Self, BoletimError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| BoletimError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.api_base_url, config.model
            ),
            prompt: config
                .extraction_prompt
                .clone()
                .unwrap_or_else(|| EXTRACTION_PROMPT.to_string()),
            timeout_secs: config.api_timeout_secs,
        })
    }

    fn build_request<'a>(&'a self, document: &'a EncodedDocument) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: &document.content_type,
                            data: &document.data,
                        },
                    },
                    Part::Text { text: &self.prompt },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        }
    }
}

#[async_trait]
impl ScoreExtractor for GeminiExtractor {
    async fn extract(&self, document: &EncodedDocument) -> Result<ReportCardData, BoletimError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BoletimError::ProviderNotConfigured {
                provider: PROVIDER.to_string(),
                hint: format!("Set {} with a Google AI Studio key.", API_KEY_ENV_VARS.join(" or ")),
            })?;

        let start = Instant::now();
        info!(
            "Sending {} document ({} bytes base64) for extraction",
            document.content_type,
            document.data.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&self.build_request(document))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BoletimError::ApiTimeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    BoletimError::LlmApiError {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let body = response.text().await.unwrap_or_default();
            let detail = api_error_message(&body).unwrap_or_else(|| format!("HTTP {status}"));
            warn!("Extraction request failed: HTTP {}: {}", status, detail);
            return Err(match status.as_u16() {
                401 | 403 => BoletimError::AuthError {
                    provider: PROVIDER.to_string(),
                    detail,
                },
                429 => BoletimError::RateLimitExceeded {
                    provider: PROVIDER.to_string(),
                    retry_after_secs,
                },
                _ => BoletimError::LlmApiError {
                    message: format!("HTTP {status}: {detail}"),
                },
            });
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                BoletimError::ApiTimeout {
                    secs: self.timeout_secs,
                }
            } else {
                BoletimError::MalformedResponse {
                    detail: e.to_string(),
                }
            }
        })?;

        if let Some(usage) = &body.usage_metadata {
            debug!(
                "{} input tokens, {} output tokens, {:?}",
                usage.prompt_token_count,
                usage.candidates_token_count,
                start.elapsed()
            );
        }

        let text = body.text().ok_or(BoletimError::EmptyResponse)?;
        let data = parse_report_card(&text)?;
        info!(
            "Extraction finished in {}ms (passing: {})",
            start.elapsed().as_millis(),
            data.is_passing
        );
        Ok(data)
    }
}

/// Pull `error.message` out of a Gemini error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> EncodedDocument {
        EncodedDocument {
            data: "QUJD".into(),
            content_type: "image/png".into(),
        }
    }

    #[test]
    fn request_body_shape() {
        let config = FlowConfig::builder().api_key("k").build().unwrap();
        let extractor = GeminiExtractor::new(&config).unwrap();
        let doc = document();
        let body = serde_json::to_value(extractor.build_request(&doc)).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "QUJD");
        assert!(parts[1]["text"].as_str().unwrap().contains("Encceja"));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn endpoint_uses_model() {
        let config = FlowConfig::builder()
            .api_base_url("http://localhost:1234")
            .model("gemini-test")
            .build()
            .unwrap();
        let extractor = GeminiExtractor::new(&config).unwrap();
        assert_eq!(
            extractor.endpoint,
            "http://localhost:1234/v1beta/models/gemini-test:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let config = FlowConfig::builder()
            .api_base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let extractor = GeminiExtractor::new(&config).unwrap();
        let err = extractor.extract(&document()).await.unwrap_err();
        assert!(matches!(err, BoletimError::ProviderNotConfigured { .. }));
    }

    #[test]
    fn response_text_concatenates_parts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"essay\":"},{"text":"7}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.text().as_deref(), Some("{\"essay\":7}"));
    }

    #[test]
    fn response_without_text_is_empty() {
        let body: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(body.text(), None);
        let body: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.text(), None);
    }

    #[test]
    fn api_error_message_extraction() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body).as_deref(), Some("API key not valid"));
        assert_eq!(api_error_message("<html>"), None);
    }
}
