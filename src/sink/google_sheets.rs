// src/sink/google_sheets.rs
//! Appends records to the first worksheet of a Google spreadsheet found by title.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::credentials::SinkCredential;
use super::RecordSink;
use crate::errors::SinkError;
use crate::types::response::{
    google_error_message, AppendValuesResponse, DriveFileList, Spreadsheet, ValueRange,
};
use crate::types::JobPosting;

pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_SPREADSHEET_NAME: &str = "2026 Job Search";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

pub struct GoogleSheetsSink {
    client: Client,
    credential: SinkCredential,
    spreadsheet_name: String,
    drive_base_url: Url,
    sheets_base_url: Url,
}

impl GoogleSheetsSink {
    pub fn new(
        credential: SinkCredential,
        spreadsheet_name: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            credential,
            spreadsheet_name,
            drive_base_url: Url::parse(DRIVE_BASE_URL).context("Invalid Drive base URL")?,
            sheets_base_url: Url::parse(SHEETS_BASE_URL).context("Invalid Sheets base URL")?,
        })
    }

    /// Points the sink at different API hosts.
    pub fn with_base_urls(mut self, drive: &str, sheets: &str) -> Result<Self> {
        self.drive_base_url =
            Url::parse(drive).with_context(|| format!("Invalid Drive base URL: {}", drive))?;
        self.sheets_base_url =
            Url::parse(sheets).with_context(|| format!("Invalid Sheets base URL: {}", sheets))?;
        Ok(self)
    }

    async fn find_spreadsheet(&self, token: &str) -> Result<String, SinkError> {
        let url = endpoint(&self.drive_base_url, &["files"])?;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_drive_query(&self.spreadsheet_name),
            SPREADSHEET_MIME_TYPE
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await
            .map_err(transient)?;

        let list: DriveFileList = self.read_json(response).await?;
        let file = list
            .files
            .into_iter()
            .find(|f| f.name == self.spreadsheet_name)
            .ok_or_else(|| SinkError::NotFound(self.spreadsheet_name.clone()))?;

        debug!("Spreadsheet '{}' has id {}", file.name, file.id);
        Ok(file.id)
    }

    async fn first_sheet_title(
        &self,
        token: &str,
        spreadsheet_id: &str,
    ) -> Result<String, SinkError> {
        let url = endpoint(&self.sheets_base_url, &["spreadsheets", spreadsheet_id])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties")])
            .send()
            .await
            .map_err(transient)?;

        let spreadsheet: Spreadsheet = self.read_json(response).await?;
        spreadsheet
            .sheets
            .into_iter()
            .min_by_key(|s| s.properties.index)
            .map(|s| s.properties.title)
            .ok_or_else(|| SinkError::Api {
                status: 200,
                message: format!("spreadsheet '{}' has no worksheets", self.spreadsheet_name),
            })
    }

    async fn append_row(
        &self,
        token: &str,
        spreadsheet_id: &str,
        sheet_title: &str,
        row: &[String],
    ) -> Result<AppendValuesResponse, SinkError> {
        let range = format!("{}:append", a1_sheet_range(sheet_title));
        let url = endpoint(
            &self.sheets_base_url,
            &["spreadsheets", spreadsheet_id, "values", &range],
        )?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&ValueRange { values: vec![row] })
            .send()
            .await
            .map_err(transient)?;

        self.read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T, SinkError> {
        let status = response.status();
        let body = response.text().await.map_err(transient)?;

        if !status.is_success() {
            let err = SinkError::from_status(status.as_u16(), google_error_message(&body));
            return Err(match err {
                SinkError::NotFound(_) => SinkError::NotFound(self.spreadsheet_name.clone()),
                other => other,
            });
        }

        serde_json::from_str(&body).map_err(|e| SinkError::Api {
            status: status.as_u16(),
            message: format!("unexpected response: {}", e),
        })
    }
}

#[async_trait]
impl RecordSink for GoogleSheetsSink {
    fn target(&self) -> &str {
        &self.spreadsheet_name
    }

    async fn append(&self, record: &JobPosting) -> Result<(), SinkError> {
        let token = self.credential.access_token(&self.client).await?;
        let spreadsheet_id = self.find_spreadsheet(&token).await?;
        let sheet_title = self.first_sheet_title(&token, &spreadsheet_id).await?;

        let row = record.to_row();
        let result = self
            .append_row(&token, &spreadsheet_id, &sheet_title, &row)
            .await?;

        let updated = result.updates.as_ref();
        info!(
            "Appended {} cells to '{}' ({})",
            row.len(),
            self.spreadsheet_name,
            updated
                .and_then(|u| u.updated_range.as_deref())
                .unwrap_or(sheet_title.as_str())
        );
        Ok(())
    }
}

fn transient(e: reqwest::Error) -> SinkError {
    SinkError::Transient(e.to_string())
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, SinkError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SinkError::Api {
            status: 0,
            message: format!("cannot build API path from {}", base),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn escape_drive_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Whole-sheet A1 range, quoting the title as Sheets requires.
fn a1_sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}
