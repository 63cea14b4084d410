// src/fetch/job_scraper.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, warn};

use super::{detect_login_wall, ContentFetcher, FetchResult, FetchStrategy, NonSuccessPolicy};
use crate::errors::FetchError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const LINKEDIN_TITLE_SELECTORS: [&str; 4] = [
    "h1.top-card-layout__title",
    ".job-details-jobs-unified-top-card__job-title",
    "h1[data-test-id='job-title']",
    ".jobs-unified-top-card__job-title",
];

const LINKEDIN_COMPANY_SELECTORS: [&str; 4] = [
    ".job-details-jobs-unified-top-card__company-name",
    ".top-card-layout__card .top-card-layout__second-subline",
    "a[data-test-id='job-poster-name']",
    ".jobs-unified-top-card__company-name",
];

const LINKEDIN_LOCATION_SELECTORS: [&str; 4] = [
    ".job-details-jobs-unified-top-card__bullet",
    ".top-card-layout__card .top-card-layout__first-subline",
    "[data-test-id='job-location']",
    ".jobs-unified-top-card__bullet",
];

const LINKEDIN_DESCRIPTION_SELECTORS: [&str; 5] = [
    ".show-more-less-html__markup",
    ".jobs-box__html-content",
    ".jobs-description__container",
    ".jobs-description-content__text",
    "[data-test-id='job-description']",
];

const GENERIC_TITLE_SELECTORS: [&str; 4] = [
    "h1",
    "[class*='job-title']",
    "[class*='title']",
    "[class*='position']",
];

const GENERIC_DESCRIPTION_SELECTORS: [&str; 5] = [
    "[class*='description']",
    "[class*='content']",
    "[class*='details']",
    "main",
    "article",
];

/// Fetches the posting page directly and reduces its HTML to readable text.
pub struct JobScraper {
    client: Client,
    policy: NonSuccessPolicy,
}

impl JobScraper {
    pub fn new(policy: NonSuccessPolicy, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, policy })
    }
}

#[async_trait]
impl ContentFetcher for JobScraper {
    fn strategy(&self) -> FetchStrategy {
        FetchStrategy::Scrape
    }

    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        info!("Fetching job post: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let html = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            if self.policy == NonSuccessPolicy::Fatal {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                    body: html,
                });
            }
            warn!("Job page returned {}, scraping it anyway", status);
        }

        let text = page_text(&html).ok_or_else(|| FetchError::NoContent(url.to_string()))?;
        let login_wall_warning = detect_login_wall(&text);
        if let Some(warning) = &login_wall_warning {
            warn!("{}", warning);
        }

        Ok(FetchResult {
            url: url.to_string(),
            text,
            strategy: FetchStrategy::Scrape,
            status: Some(status.as_u16()),
            login_wall_warning,
        })
    }
}

/// Text of the posting: LinkedIn layout first, then a generic layout, then the
/// whole body.
pub fn page_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    parse_linkedin_job(&document)
        .or_else(|| parse_generic_job(&document))
        .or_else(|| {
            warn!("No job container found, using the page body");
            find_text_by_selectors(&document, &["body"])
        })
}

fn parse_linkedin_job(document: &Html) -> Option<String> {
    let title = find_text_by_selectors(document, &LINKEDIN_TITLE_SELECTORS)?;
    let description = find_text_by_selectors(document, &LINKEDIN_DESCRIPTION_SELECTORS)?;
    let company =
        find_text_by_selectors(document, &LINKEDIN_COMPANY_SELECTORS).unwrap_or_default();
    let location =
        find_text_by_selectors(document, &LINKEDIN_LOCATION_SELECTORS).unwrap_or_default();

    Some(join_sections(&[title, company, location, description]))
}

fn parse_generic_job(document: &Html) -> Option<String> {
    let title = find_text_by_selectors(document, &GENERIC_TITLE_SELECTORS)?;
    let description = find_text_by_selectors(document, &GENERIC_DESCRIPTION_SELECTORS)?;

    Some(join_sections(&[title, description]))
}

fn join_sections(sections: &[String]) -> String {
    sections
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn find_text_by_selectors(document: &Html, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
                if text.len() > 5 {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linkedin_layout() {
        let html = r#"<html><body>
            <h1 class="top-card-layout__title">Staff Rust Engineer</h1>
            <div class="top-card-layout__card">
                <span class="top-card-layout__second-subline">Acme Robotics</span>
                <span class="top-card-layout__first-subline">Berlin, Germany</span>
            </div>
            <div class="show-more-less-html__markup">
                <p>Build   the control plane.</p>
                <ul><li>5+ years of Rust</li></ul>
            </div>
        </body></html>"#;

        let text = page_text(html).unwrap();
        assert_eq!(
            text,
            "Staff Rust Engineer\nAcme Robotics\nBerlin, Germany\nBuild the control plane. 5+ years of Rust"
        );
    }

    #[test]
    fn test_generic_layout() {
        let html = r#"<html><body>
            <h1>Data Engineer</h1>
            <main><p>Own our ingestion pipelines.</p></main>
        </body></html>"#;

        let text = page_text(html).unwrap();
        assert!(text.starts_with("Data Engineer\n"));
        assert!(text.contains("Own our ingestion pipelines."));
    }

    #[test]
    fn test_body_fallback() {
        let html = "<html><body><p>LinkedIn Sign In to view this job</p></body></html>";
        let text = page_text(html).unwrap();
        assert_eq!(text, "LinkedIn Sign In to view this job");
        assert!(detect_login_wall(&text).is_some());
    }

    #[test]
    fn test_empty_page_has_no_text() {
        assert!(page_text("<html><body></body></html>").is_none());
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a \n\n b\t c "), "a b c");
    }
}
