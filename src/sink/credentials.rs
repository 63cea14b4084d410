// src/sink/credentials.rs
//! How the sink authenticates to the spreadsheet service.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, error};

use crate::errors::{ConfigError, SinkError};
use crate::types::response::{google_error_message, TokenResponse};

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkCredentialStrategy {
    /// `[gcp_service_account]` table in the secrets file
    #[default]
    ServiceAccountInline,
    /// Service account key JSON on disk
    ServiceAccountFile,
    /// Pre-issued OAuth bearer token
    AccessToken,
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Format {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_toml(value: toml::Value) -> Result<Self, ConfigError> {
        value.try_into().map_err(|e: toml::de::Error| ConfigError::Format {
            path: "gcp_service_account".to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// A resolved sink credential, ready to produce bearer tokens.
#[derive(Clone)]
pub enum SinkCredential {
    ServiceAccount(ServiceAccountKey),
    AccessToken(String),
}

impl fmt::Debug for SinkCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkCredential::ServiceAccount(key) => {
                f.debug_tuple("ServiceAccount").field(key).finish()
            }
            SinkCredential::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

impl SinkCredential {
    pub async fn access_token(&self, client: &Client) -> Result<String, SinkError> {
        match self {
            SinkCredential::AccessToken(token) => Ok(token.clone()),
            SinkCredential::ServiceAccount(key) => exchange_assertion(client, key).await,
        }
    }
}

fn signed_assertion(key: &ServiceAccountKey, now: i64) -> Result<String, SinkError> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SHEETS_SCOPES,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
        SinkError::Credential(format!("invalid service account private key: {}", e))
    })?;

    encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| SinkError::Credential(format!("failed to sign token request: {}", e)))
}

async fn exchange_assertion(
    client: &Client,
    key: &ServiceAccountKey,
) -> Result<String, SinkError> {
    let assertion = signed_assertion(key, chrono::Utc::now().timestamp())?;

    debug!("Requesting access token for {}", key.client_email);

    let response = client
        .post(&key.token_uri)
        .form(&[
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await
        .map_err(|e| SinkError::Transient(format!("token request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SinkError::Transient(format!("failed to read token response: {}", e)))?;

    if status.is_server_error() {
        return Err(SinkError::Transient(format!(
            "token endpoint returned {}",
            status
        )));
    }
    if !status.is_success() {
        error!(
            "Token endpoint rejected service account {}: {}",
            key.client_email, body
        );
        return Err(SinkError::Credential(google_error_message(&body)));
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| SinkError::Credential(format!("unexpected token response: {}", e)))?;
    debug!("Access token valid for {}s", token.expires_in);

    Ok(token.access_token)
}
