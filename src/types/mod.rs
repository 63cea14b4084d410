// src/types/mod.rs
pub mod job_posting;
pub mod response;

pub use job_posting::{cell_text, JobPosting, JOB_POSTING_KEYS};
