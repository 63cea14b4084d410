// src/fetch/reader_proxy.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use super::{detect_login_wall, ContentFetcher, FetchResult, FetchStrategy, NonSuccessPolicy};
use crate::errors::FetchError;

pub const DEFAULT_READER_BASE_URL: &str = "https://r.jina.ai";

/// Fetches a plain-text rendering of a page through a reader service
/// (`<base>/<url>`).
pub struct ReaderProxyFetcher {
    client: Client,
    base_url: String,
    policy: NonSuccessPolicy,
}

impl ReaderProxyFetcher {
    pub fn new(base_url: String, policy: NonSuccessPolicy, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        })
    }

    pub fn proxy_url(&self, url: &str) -> String {
        format!("{}/{}", self.base_url, url)
    }
}

#[async_trait]
impl ContentFetcher for ReaderProxyFetcher {
    fn strategy(&self) -> FetchStrategy {
        FetchStrategy::ReaderProxy
    }

    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let proxy_url = self.proxy_url(url);
        info!("Fetching job post through reader proxy: {}", proxy_url);

        let response = self
            .client
            .get(&proxy_url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            match self.policy {
                NonSuccessPolicy::Fatal => {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                        body: text,
                    });
                }
                NonSuccessPolicy::PassThrough => {
                    warn!("Reader proxy returned {}, passing body through", status);
                }
            }
        }

        let login_wall_warning = detect_login_wall(&text);
        if let Some(warning) = &login_wall_warning {
            warn!("{}", warning);
        }

        info!("Fetched {} bytes for {}", text.len(), url);

        Ok(FetchResult {
            url: url.to_string(),
            text,
            strategy: FetchStrategy::ReaderProxy,
            status: Some(status.as_u16()),
            login_wall_warning,
        })
    }
}
