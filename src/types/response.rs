// src/types/response.rs
//! Wire types for the remote services the pipeline talks to.

use serde::{Deserialize, Serialize};

// ===== Gemini generateContent =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    pub system_instruction: Content<'a>,
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
    pub parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RequestPart<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig<'a> {
    pub response_mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ===== Google API error envelope (Gemini, Sheets, Drive) =====

#[derive(Debug, Deserialize)]
pub struct GoogleErrorEnvelope {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub details: Vec<GoogleErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorDetail {
    pub reason: Option<String>,
}

impl GoogleErrorBody {
    pub fn has_reason(&self, reason: &str) -> bool {
        self.details
            .iter()
            .any(|d| d.reason.as_deref() == Some(reason))
    }
}

/// Best-effort extraction of the `error.message` field, falling back to the raw body.
pub fn google_error_message(body: &str) -> String {
    serde_json::from_str::<GoogleErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// ===== OAuth, Drive, Sheets =====

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Spreadsheet {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
pub struct Sheet {
    pub properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
pub struct SheetProperties {
    pub title: String,
    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Serialize)]
pub struct ValueRange<'a> {
    pub values: Vec<&'a [String]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    pub updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_rows: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.text().as_deref(), Some("{\"a\":1}"));
        assert_eq!(resp.usage_metadata.unwrap().prompt_token_count, 10);
    }

    #[test]
    fn test_blocked_prompt_has_no_text() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(resp.text().is_none());
        assert_eq!(
            resp.prompt_feedback.and_then(|f| f.block_reason).as_deref(),
            Some("SAFETY")
        );
    }

    #[test]
    fn test_google_error_envelope() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT",
            "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}]}}"#;
        let env: GoogleErrorEnvelope = serde_json::from_str(body).unwrap();
        assert!(env.error.has_reason("API_KEY_INVALID"));
        assert_eq!(google_error_message(body), "API key not valid.");
        assert_eq!(google_error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let req = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart { text: "sys" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }
}
