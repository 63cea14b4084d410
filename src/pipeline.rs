// src/pipeline.rs
//! One extraction run: fetch, extract, parse, save. Every failure is captured
//! in the returned [`RunReport`]; nothing is retried.

use std::fmt;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::{FetchError, PipelineError, ValidationError};
use crate::extraction::prompts::{content_payload, direct_payload};
use crate::extraction::{parse, validate, Extractor, Violation, JOB_EXTRACTION_PROMPT};
use crate::fetch::ContentFetcher;
use crate::sink::RecordSink;
use crate::types::JobPosting;
use crate::utils::normalize_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Extracting,
    Parsing,
    Saving,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    /// Legal transitions. `Parsing -> Done` is the dry-run exit.
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (Idle, Fetching)
            | (Fetching, Extracting)
            | (Extracting, Parsing)
            | (Parsing, Saving)
            | (Parsing, Done)
            | (Saving, Done) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Parsing => "parsing",
            Stage::Saving => "saving",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Status updates for whoever is watching a run.
pub trait Progress {
    fn stage(&mut self, _stage: Stage, _message: &str) {}

    fn warning(&mut self, _message: &str) {}
}

pub struct NullProgress;
impl Progress for NullProgress {}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Fail the run when the record breaks the extraction contract.
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The record was extracted but could not be saved.
    PartialSuccess,
    Failed,
}

#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub url: String,
    pub stage: Stage,
    pub history: Vec<Stage>,
    pub failed_at: Option<Stage>,
    pub fetch_status: Option<u16>,
    pub warnings: Vec<String>,
    pub raw_response: Option<String>,
    pub record: Option<JobPosting>,
    pub violations: Vec<Violation>,
    pub saved: bool,
    pub error: Option<PipelineError>,
}

impl RunReport {
    fn new(url: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            url,
            stage: Stage::Idle,
            history: vec![Stage::Idle],
            failed_at: None,
            fetch_status: None,
            warnings: Vec::new(),
            raw_response: None,
            record: None,
            violations: Vec::new(),
            saved: false,
            error: None,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match (self.stage, self.failed_at) {
            (Stage::Done, _) => Outcome::Done,
            (_, Some(Stage::Saving)) if self.record.is_some() => Outcome::PartialSuccess,
            _ => Outcome::Failed,
        }
    }

    fn advance(&mut self, next: Stage, progress: &mut dyn Progress, message: &str) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal transition {} -> {}",
            self.stage,
            next
        );
        info!("Stage {} -> {}: {}", self.stage, next, message);
        self.stage = next;
        self.history.push(next);
        progress.stage(next, message);
    }

    fn warn(&mut self, message: String, progress: &mut dyn Progress) {
        warn!("{}", message);
        progress.warning(&message);
        self.warnings.push(message);
    }

    fn fail(&mut self, err: PipelineError, progress: &mut dyn Progress) {
        error!("Run failed while {}: {}", self.stage, err);
        self.failed_at = Some(self.stage);
        let message = err.to_string();
        self.error = Some(err);
        self.advance(Stage::Failed, progress, &message);
    }
}

/// The fetch → extract → parse → save sequence with its collaborators injected.
/// Without a sink the run ends after parsing (dry run).
pub struct Pipeline {
    fetcher: Box<dyn ContentFetcher>,
    extractor: Box<dyn Extractor>,
    sink: Option<Box<dyn RecordSink>>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        fetcher: Box<dyn ContentFetcher>,
        extractor: Box<dyn Extractor>,
        sink: Option<Box<dyn RecordSink>>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            sink,
            options,
        }
    }

    /// Runs once for `url`. Each call starts from `Idle` with no state carried
    /// over from earlier runs.
    pub async fn run(&self, url: &str, progress: &mut dyn Progress) -> RunReport {
        let mut report = RunReport::new(normalize_url(url));
        let span = info_span!("run", run_id = %report.run_id, url = %report.url);

        self.execute(&mut report, progress).instrument(span).await;
        report
    }

    async fn execute(&self, report: &mut RunReport, progress: &mut dyn Progress) {
        if report.url.is_empty() {
            return report.fail(FetchError::EmptyUrl.into(), progress);
        }

        report.advance(
            Stage::Fetching,
            progress,
            &format!("Fetching content ({})", self.fetcher.strategy()),
        );
        let fetched = match self.fetcher.fetch(&report.url).await {
            Ok(fetched) => fetched,
            Err(e) => return report.fail(e.into(), progress),
        };
        report.fetch_status = fetched.status;
        if let Some(warning) = fetched.login_wall_warning.clone() {
            report.warn(warning, progress);
        }

        let payload = if fetched.has_content() {
            content_payload(&fetched.url, &fetched.text)
        } else {
            direct_payload(&fetched.url)
        };

        report.advance(
            Stage::Extracting,
            progress,
            "Asking the model to extract the posting",
        );
        let raw = match self.extractor.extract(JOB_EXTRACTION_PROMPT, &payload).await {
            Ok(raw) => raw,
            Err(e) => return report.fail(e.into(), progress),
        };

        report.advance(Stage::Parsing, progress, "Parsing the model response");
        let parsed = parse(&raw);
        report.raw_response = Some(raw);
        let record = match parsed {
            Ok(record) => record,
            Err(e) => return report.fail(e.into(), progress),
        };

        report.violations = validate(&record, &report.url);
        if !report.violations.is_empty() {
            let violations: Vec<String> =
                report.violations.iter().map(|v| v.to_string()).collect();
            if self.options.strict {
                report.record = Some(record);
                return report.fail(ValidationError { violations }.into(), progress);
            }
            report.warn(
                format!("Record breaks the extraction contract: {}", violations.join("; ")),
                progress,
            );
        }

        let Some(sink) = &self.sink else {
            report.record = Some(record);
            return report.advance(Stage::Done, progress, "Dry run, record not saved");
        };

        report.advance(
            Stage::Saving,
            progress,
            &format!("Saving to {}", sink.target()),
        );
        let result = sink.append(&record).await;
        // Kept on failure too, so the caller can still show it.
        report.record = Some(record);
        match result {
            Ok(()) => {
                report.saved = true;
                let message = format!("Saved to {}", sink.target());
                report.advance(Stage::Done, progress, &message);
            }
            Err(e) => report.fail(e.into(), progress),
        }
    }
}
