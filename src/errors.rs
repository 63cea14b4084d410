// src/errors.rs
//! Stage error taxonomy. Each pipeline stage owns one enum so the orchestrator
//! can tell the failure kinds apart without string matching.

use thiserror::Error;

/// Startup failures. Nothing runs until these are resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing secret: {0}")]
    MissingSecret(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Format { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL is empty")]
    EmptyUrl,

    #[error("Failed to fetch {url}: {message}")]
    Network { url: String, message: String },

    #[error("Fetch of {url} returned HTTP {status}")]
    Status { url: String, status: u16, body: String },

    #[error("No readable content found at {0}")]
    NoContent(String),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Model rejected the API key: {0}")]
    Auth(String),

    #[error("Model quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("Model response was malformed: {0}")]
    MalformedResponse(String),

    #[error("Model request failed: {0}")]
    Network(String),

    #[error("Model API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// The model answered, but not with a JSON object. `raw` keeps the text
/// exactly as received so it can be shown to the user.
#[derive(Debug, Error)]
#[error("Response is not a JSON object: {message}")]
pub struct ParseError {
    pub message: String,
    pub raw: String,
}

#[derive(Debug, Error)]
#[error("Record violates the extraction contract: {}", .violations.join("; "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Spreadsheet '{0}' not found (check the name and that it is shared with the service account)")]
    NotFound(String),

    #[error("Permission denied by the spreadsheet service: {0}")]
    Permission(String),

    #[error("Transient spreadsheet failure: {0}")]
    Transient(String),

    #[error("Could not obtain a spreadsheet access token: {0}")]
    Credential(String),

    #[error("Spreadsheet API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl SinkError {
    /// Maps an HTTP status from the Sheets/Drive APIs onto the sink taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => SinkError::Permission(message),
            404 => SinkError::NotFound(message),
            429 | 500..=599 => SinkError::Transient(message),
            _ => SinkError::Api { status, message },
        }
    }
}

/// The cause carried by a failed run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "FetchError",
            PipelineError::Extraction(_) => "ExtractionError",
            PipelineError::Parse(_) => "ParseError",
            PipelineError::Validation(_) => "ValidationError",
            PipelineError::Sink(_) => "SinkError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_status_mapping() {
        assert!(matches!(
            SinkError::from_status(403, "denied".into()),
            SinkError::Permission(_)
        ));
        assert!(matches!(
            SinkError::from_status(401, "expired".into()),
            SinkError::Permission(_)
        ));
        assert!(matches!(
            SinkError::from_status(503, "busy".into()),
            SinkError::Transient(_)
        ));
        assert!(matches!(
            SinkError::from_status(429, "slow down".into()),
            SinkError::Transient(_)
        ));
        assert!(matches!(
            SinkError::from_status(400, "bad range".into()),
            SinkError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_pipeline_error_kind() {
        let err: PipelineError = ParseError {
            message: "expected value".into(),
            raw: "nope".into(),
        }
        .into();
        assert_eq!(err.kind(), "ParseError");

        let err: PipelineError = SinkError::NotFound("2026 Job Search".into()).into();
        assert_eq!(err.kind(), "SinkError");
        assert!(err.to_string().contains("2026 Job Search"));
    }
}
