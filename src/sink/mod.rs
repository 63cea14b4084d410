// src/sink/mod.rs
use async_trait::async_trait;

use crate::errors::SinkError;
use crate::types::JobPosting;

pub mod credentials;
pub mod csv_export;
pub mod google_sheets;

pub use credentials::{ServiceAccountKey, SinkCredential, SinkCredentialStrategy};
pub use google_sheets::GoogleSheetsSink;

/// Append-only destination for extracted records. Appending the same record
/// twice writes two rows.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Human-readable name of the destination, for status messages.
    fn target(&self) -> &str;

    async fn append(&self, record: &JobPosting) -> Result<(), SinkError>;
}
