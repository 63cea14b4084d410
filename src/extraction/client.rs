// src/extraction/client.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use crate::errors::ExtractionError;
use crate::types::response::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GoogleErrorEnvelope, RequestPart,
};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const JSON_MIME_TYPE: &str = "application/json";

/// Sends the extraction contract to a generative model and returns its raw text.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        system_instruction: &str,
        user_payload: &str,
    ) -> Result<String, ExtractionError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Extractor for GeminiClient {
    async fn extract(
        &self,
        system_instruction: &str,
        user_payload: &str,
    ) -> Result<String, ExtractionError> {
        if self.api_key.trim().is_empty() {
            return Err(ExtractionError::Auth("API key is empty".to_string()));
        }

        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart {
                    text: system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: user_payload }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE,
            },
        };

        info!("Sending extraction request to model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let err = classify_error(status.as_u16(), &body);
            error!("Model API error {}: {}", status, err);
            return Err(err);
        }

        let text = response_text(&body)?;
        debug!("Model returned {} bytes of text", text.len());
        Ok(text)
    }
}

/// Pulls the candidate text out of a successful `generateContent` envelope.
fn response_text(body: &str) -> Result<String, ExtractionError> {
    let envelope: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        ExtractionError::MalformedResponse(format!("response envelope is not valid JSON: {}", e))
    })?;

    if let Some(usage) = &envelope.usage_metadata {
        debug!(
            "Model usage: prompt_tokens={}, candidate_tokens={}",
            usage.prompt_token_count, usage.candidates_token_count
        );
    }

    if let Some(text) = envelope.text() {
        return Ok(text);
    }

    let reason = envelope
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
        .map(|r| format!("prompt blocked: {}", r))
        .or_else(|| {
            envelope
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .map(|r| format!("no text in candidate (finish reason {})", r))
        })
        .unwrap_or_else(|| "no candidates returned".to_string());

    Err(ExtractionError::MalformedResponse(reason))
}

/// Maps a non-success model response onto the extraction error taxonomy.
pub fn classify_error(status: u16, body: &str) -> ExtractionError {
    let parsed = serde_json::from_str::<GoogleErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .unwrap_or_else(|| body.to_string());

    let (api_status, key_invalid) = parsed
        .as_ref()
        .map(|e| (e.error.status.as_str(), e.error.has_reason("API_KEY_INVALID")))
        .unwrap_or(("", false));

    match status {
        401 | 403 => ExtractionError::Auth(message),
        400 if key_invalid => ExtractionError::Auth(message),
        429 => ExtractionError::Quota(message),
        _ if api_status == "RESOURCE_EXHAUSTED" => ExtractionError::Quota(message),
        _ => ExtractionError::Api { status, message },
    }
}
