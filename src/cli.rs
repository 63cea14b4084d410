// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use crate::core::ConfigManager;
use crate::errors::PipelineError;
use crate::extraction::{parse, validate, Violation, JOB_EXTRACTION_PROMPT};
use crate::fetch::FetchStrategy;
use crate::pipeline::{Outcome, PipelineOptions, Progress, RunReport, Stage};
use crate::sink::csv_export::export_record;
use crate::types::{cell_text, JobPosting};
use crate::utils::preview;

pub const EXIT_DONE: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_PARTIAL: i32 = 2;
/// EX_CONFIG from sysexits.h
pub const EXIT_CONFIG: i32 = 78;

const RAW_PREVIEW_CHARS: usize = 2000;

#[derive(Parser)]
#[command(name = "job-extractor")]
#[command(about = "Extract a job posting into a structured record and append it to a spreadsheet")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: $JOB_EXTRACTOR_CONFIG or config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Secrets file (default: $JOB_EXTRACTOR_SECRETS or .secrets/secrets.toml)
    #[arg(long, global = true)]
    pub secrets: Option<PathBuf>,

    /// Also print log output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract one job posting and save it
    Extract {
        url: String,
        /// How the posting content is obtained
        #[arg(long, value_enum)]
        mode: Option<FetchStrategy>,
        /// Spreadsheet title to append to
        #[arg(long)]
        sheet: Option<String>,
        /// Fail instead of warning when the record breaks the schema rules
        #[arg(long)]
        strict: bool,
        /// Stop after parsing; nothing is written to the spreadsheet
        #[arg(long)]
        dry_run: bool,
        /// Also write the record to a CSV (or .tsv) file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Print the record as JSON only
        #[arg(long)]
        json: bool,
        /// Print the raw model response as well
        #[arg(long)]
        raw: bool,
    },
    /// Print the extraction instruction sent to the model
    Prompt,
    /// Parse and check a saved model response
    Validate {
        file: PathBuf,
        /// Job URL the response was produced for
        #[arg(long, default_value = "")]
        url: String,
    },
}

/// Prints stage changes as they happen.
pub struct ConsoleProgress {
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Progress for ConsoleProgress {
    fn stage(&mut self, stage: Stage, message: &str) {
        if self.quiet && stage != Stage::Failed {
            return;
        }
        let icon = match stage {
            Stage::Idle => "•",
            Stage::Fetching => "🌐",
            Stage::Extracting => "🤖",
            Stage::Parsing => "🧩",
            Stage::Saving => "💾",
            Stage::Done => "✅",
            Stage::Failed => "❌",
        };
        eprintln!("{} {}", icon, message);
    }

    fn warning(&mut self, message: &str) {
        eprintln!("⚠️  {}", message);
    }
}

pub async fn handle_command(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Extract {
            url,
            mode,
            sheet,
            strict,
            dry_run,
            export,
            json,
            raw,
        } => {
            let config = ConfigManager::load(cli.config.as_deref(), cli.secrets.as_deref())?;
            let strategy = mode.unwrap_or(config.environment.fetch_strategy);
            let options = PipelineOptions {
                strict: strict || config.environment.strict_validation,
            };
            let pipeline = config.build_pipeline(strategy, sheet, options, !dry_run)?;

            let mut progress = ConsoleProgress::new(json);
            let report = pipeline.run(&url, &mut progress).await;

            if json {
                if let Some(record) = &report.record {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(record).context("Failed to render record")?
                    );
                }
            } else {
                print!("{}", render_report(&report, raw));
            }

            if let (Some(path), Some(record)) = (&export, &report.record) {
                export_record(record, path).await?;
                eprintln!("📄 Exported to {}", path.display());
            }

            let code = exit_code(report.outcome());
            info!("Run {} finished with exit code {}", report.run_id, code);
            Ok(code)
        }

        Command::Prompt => {
            println!("{}", JOB_EXTRACTION_PROMPT.trim());
            Ok(EXIT_DONE)
        }

        Command::Validate { file, url } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            match parse(&content) {
                Ok(record) => {
                    let violations = validate(&record, &url);
                    print!("{}", render_record(&record));
                    print!("{}", render_violations(&violations));
                    if violations.is_empty() {
                        println!("✅ {} matches the extraction schema", file.display());
                        Ok(EXIT_DONE)
                    } else {
                        Ok(EXIT_FAILED)
                    }
                }
                Err(e) => {
                    error!("Validation of {} failed: {}", file.display(), e);
                    println!("❌ {}", e);
                    Ok(EXIT_FAILED)
                }
            }
        }
    }
}

pub fn exit_code(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Done => EXIT_DONE,
        Outcome::PartialSuccess => EXIT_PARTIAL,
        Outcome::Failed => EXIT_FAILED,
    }
}

/// Human-readable summary of a finished run.
pub fn render_report(report: &RunReport, show_raw: bool) -> String {
    let mut out = String::new();

    if let Some(record) = &report.record {
        out.push_str(&format!(
            "\n{} at {}\n",
            record.job_title(),
            record.company()
        ));
        out.push_str(&render_record(record));
    }
    out.push_str(&render_violations(&report.violations));

    match (&report.error, report.outcome()) {
        (Some(err), Outcome::PartialSuccess) => {
            out.push_str(&format!(
                "\n⚠️  Extracted but not saved: {}\nThe record above can be added by hand.\n",
                err
            ));
        }
        (Some(err), _) => {
            let stage = report.failed_at.unwrap_or(report.stage);
            out.push_str(&format!("\n❌ Failed while {} ({}): {}\n", stage, err.kind(), err));
            if let PipelineError::Parse(parse_error) = err {
                out.push_str("\nModel response:\n");
                out.push_str(&preview(&parse_error.raw, RAW_PREVIEW_CHARS));
                out.push('\n');
            }
        }
        (None, _) if report.saved => out.push_str("\n✅ Saved\n"),
        (None, _) => out.push_str("\n✅ Done (not saved)\n"),
    }

    if show_raw {
        if let Some(raw) = &report.raw_response {
            out.push_str("\nRaw response:\n");
            out.push_str(raw);
            out.push('\n');
        }
    }
    out
}

/// One `key: value` line per field, schema keys first.
pub fn render_record(record: &JobPosting) -> String {
    record
        .header()
        .iter()
        .map(|key| {
            let value = record.get(key).map(cell_text).unwrap_or_default();
            format!("{}: {}\n", key, value)
        })
        .collect()
}

fn render_violations(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return String::new();
    }
    let mut out = format!("\n{} schema issue(s):\n", violations.len());
    for violation in violations {
        out.push_str(&format!("  - {}\n", violation));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn record() -> JobPosting {
        let mut map = Map::new();
        map.insert("job_title".into(), json!("Staff Engineer"));
        map.insert("company".into(), json!("Acme"));
        map.insert("skills_keywords".into(), json!(["rust"]));
        map.insert("comp_base_min".into(), json!(null));
        JobPosting::from_map(map)
    }

    #[test]
    fn test_parses_extract_flags() {
        let cli = Cli::try_parse_from([
            "job-extractor",
            "extract",
            "https://acme.io/jobs/7",
            "--mode",
            "reader-proxy",
            "--sheet",
            "Interviews",
            "--dry-run",
            "--export",
            "out/job.tsv",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Extract {
                url,
                mode,
                sheet,
                dry_run,
                export,
                strict,
                ..
            } => {
                assert_eq!(url, "https://acme.io/jobs/7");
                assert_eq!(mode, Some(FetchStrategy::ReaderProxy));
                assert_eq!(sheet.as_deref(), Some("Interviews"));
                assert!(dry_run);
                assert!(!strict);
                assert_eq!(export, Some(PathBuf::from("out/job.tsv")));
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["job-extractor", "extract", "u", "--mode", "browser"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Outcome::Done), 0);
        assert_eq!(exit_code(Outcome::Failed), 1);
        assert_eq!(exit_code(Outcome::PartialSuccess), 2);
    }

    #[test]
    fn test_render_record_lists_schema_keys() {
        let text = render_record(&record());
        assert!(text.starts_with("job_id: \n"));
        assert!(text.contains("company: Acme\n"));
        assert!(text.contains("skills_keywords: [\"rust\"]\n"));
        assert!(text.contains("comp_base_min: null\n"));
        assert_eq!(text.lines().count(), crate::types::JOB_POSTING_KEYS.len());
    }

    #[tokio::test]
    async fn test_validate_command_on_saved_response() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let mut map = Map::new();
        for key in crate::types::JOB_POSTING_KEYS {
            map.insert(key.to_string(), json!("Unknown"));
        }
        map.insert("source".into(), json!("Other"));
        map.insert("skills_keywords".into(), json!([]));
        map.insert("comp_base_min".into(), json!(null));
        map.insert("comp_base_max".into(), json!(null));
        std::fs::write(&good, serde_json::Value::Object(map).to_string()).unwrap();

        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "Sorry, I can't open links.").unwrap();

        let run = |file: PathBuf| Cli {
            command: Command::Validate {
                file,
                url: String::new(),
            },
            config: None,
            secrets: None,
            verbose: false,
        };

        assert_eq!(handle_command(run(good)).await.unwrap(), EXIT_DONE);
        assert_eq!(handle_command(run(bad)).await.unwrap(), EXIT_FAILED);
        assert!(handle_command(run(dir.path().join("missing.json")))
            .await
            .is_err());
    }
}
