// src/core/secrets.rs
//! API keys and Google credentials from `secrets.toml`, overridable from the
//! process environment.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::ConfigError;
use crate::sink::{ServiceAccountKey, SinkCredential, SinkCredentialStrategy};

pub const DEFAULT_SECRETS_PATH: &str = ".secrets/secrets.toml";

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const GOOGLE_SHEETS_ACCESS_TOKEN: &str = "GOOGLE_SHEETS_ACCESS_TOKEN";

#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(rename = "GEMINI_API_KEY")]
    gemini_api_key: Option<String>,
    #[serde(rename = "GOOGLE_SHEETS_ACCESS_TOKEN")]
    access_token: Option<String>,
    gcp_service_account: Option<toml::Value>,
}

#[derive(Clone, Default)]
pub struct Secrets {
    pub gemini_api_key: Option<String>,
    pub service_account: Option<ServiceAccountKey>,
    pub service_account_file: Option<PathBuf>,
    pub access_token: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<set>"))
            .field("service_account", &self.service_account)
            .field("service_account_file", &self.service_account_file)
            .field("access_token", &self.access_token.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl Secrets {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Reads `path` if it exists, then applies overrides from `lookup`.
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str::<SecretsFile>(&content).map_err(|e| ConfigError::Format {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            debug!("No secrets file at {}", path.display());
            SecretsFile::default()
        };

        let service_account = file
            .gcp_service_account
            .map(ServiceAccountKey::from_toml)
            .transpose()?;
        let from_env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            gemini_api_key: from_env(GEMINI_API_KEY).or(file.gemini_api_key),
            service_account,
            service_account_file: from_env(GOOGLE_APPLICATION_CREDENTIALS).map(PathBuf::from),
            access_token: from_env(GOOGLE_SHEETS_ACCESS_TOKEN).or(file.access_token),
        })
    }

    pub fn gemini_api_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingSecret(GEMINI_API_KEY.to_string()))
    }

    /// Resolves the credential the sink authenticates with. `configured_file`
    /// is the key path from the config file, used when the environment has none.
    pub fn sink_credential(
        &self,
        strategy: SinkCredentialStrategy,
        configured_file: Option<&Path>,
    ) -> Result<SinkCredential, ConfigError> {
        match strategy {
            SinkCredentialStrategy::ServiceAccountInline => self
                .service_account
                .clone()
                .map(SinkCredential::ServiceAccount)
                .ok_or_else(|| ConfigError::MissingSecret("gcp_service_account".to_string())),
            SinkCredentialStrategy::ServiceAccountFile => {
                let path = self
                    .service_account_file
                    .as_deref()
                    .or(configured_file)
                    .ok_or_else(|| {
                        ConfigError::MissingSecret(GOOGLE_APPLICATION_CREDENTIALS.to_string())
                    })?;
                ServiceAccountKey::from_json_file(path).map(SinkCredential::ServiceAccount)
            }
            SinkCredentialStrategy::AccessToken => self
                .access_token
                .clone()
                .map(SinkCredential::AccessToken)
                .ok_or_else(|| {
                    ConfigError::MissingSecret(GOOGLE_SHEETS_ACCESS_TOKEN.to_string())
                }),
        }
    }
}
