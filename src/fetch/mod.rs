// src/fetch/mod.rs
//! Content fetching strategies for a job posting URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::FetchError;

pub mod job_scraper;
pub mod reader_proxy;

pub use job_scraper::JobScraper;
pub use reader_proxy::ReaderProxyFetcher;

/// Sites that serve a sign-in page instead of the posting to anonymous readers.
pub const GATED_SITES: [&str; 3] = ["LinkedIn", "Glassdoor", "Indeed"];
const LOGIN_WALL_WINDOW: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
    /// Send only the URL string to the model
    Direct,
    /// Fetch a text rendering through the reader proxy
    ReaderProxy,
    /// Fetch the page and pull the posting text out of the HTML
    Scrape,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchStrategy::Direct => "direct",
            FetchStrategy::ReaderProxy => "reader-proxy",
            FetchStrategy::Scrape => "scrape",
        };
        f.write_str(name)
    }
}

/// What to do with a page that answered with a non-2xx status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonSuccessPolicy {
    /// Use the error page body as content anyway
    PassThrough,
    /// Abort the run before the model is called
    #[default]
    Fatal,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    pub text: String,
    pub strategy: FetchStrategy,
    pub status: Option<u16>,
    pub login_wall_warning: Option<String>,
}

impl FetchResult {
    /// True when `text` is page content rather than the bare URL.
    pub fn has_content(&self) -> bool {
        self.strategy != FetchStrategy::Direct
    }
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    fn strategy(&self) -> FetchStrategy;

    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;
}

/// Hands the URL itself to the model. No network access.
pub struct DirectFetcher;

#[async_trait]
impl ContentFetcher for DirectFetcher {
    fn strategy(&self) -> FetchStrategy {
        FetchStrategy::Direct
    }

    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        Ok(FetchResult {
            url: url.to_string(),
            text: url.to_string(),
            strategy: FetchStrategy::Direct,
            status: None,
            login_wall_warning: None,
        })
    }
}

/// Advisory check for a sign-in page standing in for the posting.
pub fn detect_login_wall(text: &str) -> Option<String> {
    let head: String = text.chars().take(LOGIN_WALL_WINDOW).collect();
    if !head.contains("Sign In") {
        return None;
    }
    GATED_SITES
        .iter()
        .find(|site| head.contains(*site))
        .map(|site| {
            format!(
                "Content looks like a {} sign-in page rather than the job posting",
                site
            )
        })
}
