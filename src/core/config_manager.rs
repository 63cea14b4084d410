// src/core/config_manager.rs
//! Configuration and secrets in one place, plus the stage builders that
//! depend on them.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use super::secrets::{Secrets, DEFAULT_SECRETS_PATH};
use crate::environment::EnvironmentConfig;
use crate::errors::ConfigError;
use crate::extraction::{Extractor, GeminiClient};
use crate::fetch::{ContentFetcher, DirectFetcher, FetchStrategy, JobScraper, ReaderProxyFetcher};
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::sink::{GoogleSheetsSink, RecordSink};

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub secrets: Secrets,
}

impl ConfigManager {
    /// Loads `.env`, the config file and the secrets file. Explicit paths win
    /// over `JOB_EXTRACTOR_CONFIG` and `JOB_EXTRACTOR_SECRETS`.
    pub fn load(
        config_path: Option<&Path>,
        secrets_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }

        let environment = EnvironmentConfig::load(config_path)?;
        let secrets_path = secrets_path.map(Path::to_path_buf).unwrap_or_else(|| {
            std::env::var("JOB_EXTRACTOR_SECRETS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_PATH))
        });
        let secrets = Secrets::load(&secrets_path)?;

        Ok(Self {
            environment,
            secrets,
        })
    }

    pub fn build_fetcher(&self, strategy: FetchStrategy) -> Result<Box<dyn ContentFetcher>> {
        let env = &self.environment;
        let fetcher: Box<dyn ContentFetcher> = match strategy {
            FetchStrategy::Direct => Box::new(DirectFetcher),
            FetchStrategy::ReaderProxy => Box::new(ReaderProxyFetcher::new(
                env.reader_base_url.clone(),
                env.non_success_policy,
                env.timeouts.fetch_secs,
            )?),
            FetchStrategy::Scrape => Box::new(JobScraper::new(
                env.non_success_policy,
                env.timeouts.fetch_secs,
            )?),
        };
        Ok(fetcher)
    }

    pub fn build_extractor(&self) -> Result<Box<dyn Extractor>> {
        let env = &self.environment;
        let client = GeminiClient::new(
            self.secrets.gemini_api_key()?.to_string(),
            env.model.clone(),
            env.model_base_url.clone(),
            env.timeouts.model_secs,
        )?;
        Ok(Box::new(client))
    }

    pub fn build_sink(&self, spreadsheet_name: Option<String>) -> Result<Box<dyn RecordSink>> {
        let env = &self.environment;
        let credential = self.secrets.sink_credential(
            env.credential_strategy,
            env.service_account_file.as_deref(),
        )?;
        let sink = GoogleSheetsSink::new(
            credential,
            spreadsheet_name.unwrap_or_else(|| env.spreadsheet_name.clone()),
            env.timeouts.sheets_secs,
        )?;
        Ok(Box::new(sink))
    }

    /// Wires up a pipeline. Sink credentials are only resolved when `save`
    /// is set, so a dry run needs nothing but the model key.
    pub fn build_pipeline(
        &self,
        strategy: FetchStrategy,
        spreadsheet_name: Option<String>,
        options: PipelineOptions,
        save: bool,
    ) -> Result<Pipeline> {
        let sink = if save {
            Some(self.build_sink(spreadsheet_name)?)
        } else {
            None
        };
        Ok(Pipeline::new(
            self.build_fetcher(strategy)?,
            self.build_extractor()?,
            sink,
            options,
        ))
    }
}
