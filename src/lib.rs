//! Turns a job posting URL into a normalized record and appends it to a
//! Google spreadsheet.

pub mod cli;
pub mod core;
pub mod environment;
pub mod errors;
pub mod extraction;
pub mod fetch;
pub mod pipeline;
pub mod sink;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use crate::core::ConfigManager;
pub use errors::PipelineError;
pub use pipeline::{Outcome, Pipeline, PipelineOptions, Progress, RunReport, Stage};
pub use types::JobPosting;
