// src/sink/csv_export.rs
//! Single-record delimited-text export.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::types::JobPosting;
use crate::utils::{ensure_parent_dir, get_file_extension};

/// Renders a header row and one value row.
pub fn to_delimited(record: &JobPosting, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer
        .write_record(record.header())
        .context("Failed to write header row")?;
    writer
        .write_record(record.to_row())
        .context("Failed to write value row")?;

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush export: {}", e))?;
    String::from_utf8(bytes).context("Export is not valid UTF-8")
}

/// Writes the record to `path`; `.tsv` files are tab-separated, anything else CSV.
pub async fn export_record(record: &JobPosting, path: &Path) -> Result<()> {
    let delimiter = match get_file_extension(&path.to_string_lossy()).as_deref() {
        Some("tsv") => b'\t',
        _ => b',',
    };

    let content = to_delimited(record, delimiter)?;
    ensure_parent_dir(path).await?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write export: {}", path.display()))?;

    info!("Exported record to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn posting() -> JobPosting {
        let mut map = Map::new();
        map.insert("company".into(), json!("Acme, Inc."));
        map.insert("skills_keywords".into(), json!(["rust", "sql"]));
        JobPosting::from_map(map)
    }

    #[test]
    fn test_csv_quotes_fields() {
        let text = to_delimited(&posting(), b',').unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("job_id,source,job_url,company,"));
        let values = lines.next().unwrap();
        assert!(values.contains("\"Acme, Inc.\""));
        assert!(values.contains(r#""[""rust"",""sql""]""#));
    }

    #[tokio::test]
    async fn test_export_picks_delimiter_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("job.tsv");

        export_record(&posting(), &path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(content.as_bytes());
        let headers = reader.headers().unwrap().clone();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(headers.len(), row.len());
        assert_eq!(&row[3], "Acme, Inc.");
        assert_eq!(&row[17], r#"["rust","sql"]"#);
    }
}
