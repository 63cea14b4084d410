// src/utils.rs
use anyhow::{Context, Result};
use std::path::Path;

/// Trim whitespace a user may paste around a URL.
pub fn normalize_url(input: &str) -> String {
    input.trim().to_string()
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Ensure the directory holding `path` exists
pub async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("  https://acme.io/jobs/7 \n"),
            "https://acme.io/jobs/7"
        );
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("abcdef", 3), "abc…");
        assert_eq!(preview("abc", 3), "abc");
        assert_eq!(preview("ééé", 2), "éé…");
    }

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension("job.TSV"), Some("tsv".to_string()));
        assert_eq!(get_file_extension("out/job.csv"), Some("csv".to_string()));
        assert_eq!(get_file_extension("noext"), None);
    }

    #[tokio::test]
    async fn test_ensure_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("file.csv");
        ensure_parent_dir(&path).await.unwrap();
        assert!(dir.path().join("a").join("b").is_dir());

        ensure_parent_dir(Path::new("file.csv")).await.unwrap();
    }
}
