// src/environment.rs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::ConfigError;
use crate::extraction::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::fetch::reader_proxy::DEFAULT_READER_BASE_URL;
use crate::fetch::{FetchStrategy, NonSuccessPolicy};
use crate::sink::google_sheets::DEFAULT_SPREADSHEET_NAME;
use crate::sink::SinkCredentialStrategy;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub fetch_strategy: FetchStrategy,
    pub reader_base_url: String,
    pub non_success_policy: NonSuccessPolicy,
    pub model: String,
    pub model_base_url: String,
    pub spreadsheet_name: String,
    pub credential_strategy: SinkCredentialStrategy,
    /// Key file for `service-account-file`; `GOOGLE_APPLICATION_CREDENTIALS` wins.
    pub service_account_file: Option<PathBuf>,
    pub strict_validation: bool,
    pub timeouts: Timeouts,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            fetch_strategy: FetchStrategy::Direct,
            reader_base_url: DEFAULT_READER_BASE_URL.to_string(),
            non_success_policy: NonSuccessPolicy::default(),
            model: DEFAULT_MODEL.to_string(),
            model_base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_name: DEFAULT_SPREADSHEET_NAME.to_string(),
            credential_strategy: SinkCredentialStrategy::default(),
            service_account_file: None,
            strict_validation: false,
            timeouts: Timeouts::default(),
        }
    }
}

/// Per-call timeouts in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub fetch_secs: u64,
    pub model_secs: u64,
    pub sheets_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            fetch_secs: 60,
            model_secs: 120,
            sheets_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl EnvironmentConfig {
    /// Load configuration based on environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(|| {
            std::env::var("JOB_EXTRACTOR_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
        });
        Self::load_from_file(&config_path, &Self::get_environment())
    }

    pub fn get_environment() -> String {
        std::env::var("JOB_EXTRACTOR_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn load_from_file(config_path: &Path, environment: &str) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            info!(
                "No {} found, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let config_content =
            std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
                path: config_path.display().to_string(),
                source,
            })?;

        let config_file: ConfigFile =
            serde_yaml::from_str(&config_content).map_err(|e| ConfigError::Format {
                path: config_path.display().to_string(),
                message: e.to_string(),
            })?;

        info!("Loaded configuration for environment: {}", environment);
        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };
        env_config.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        if self.spreadsheet_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "spreadsheet_name must not be empty".to_string(),
            ));
        }
        let t = self.timeouts;
        if t.fetch_secs == 0 || t.model_secs == 0 || t.sheets_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
