// src/extraction/mod.rs
pub mod client;
pub mod parser;
pub mod prompts;
pub mod validator;

pub use client::{Extractor, GeminiClient};
pub use parser::parse;
pub use prompts::JOB_EXTRACTION_PROMPT;
pub use validator::{validate, Violation};
