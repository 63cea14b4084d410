// src/extraction/validator.rs
//! Local check of a parsed record against the extraction contract.
//!
//! The model is only instructed to follow the schema; this reports where it
//! did not. Values are never rewritten.

use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;

use crate::types::job_posting::{
    EMPLOYMENT_TYPE_VALUES, JOB_POSTING_KEYS, NUMERIC_KEYS, SOURCE_VALUES, UNKNOWN,
    WORK_MODE_VALUES,
};
use crate::types::JobPosting;

/// Keys with their own type rules above.
const NON_TEXT_KEYS: [&str; 6] = [
    "job_id",
    "skills_keywords",
    "source",
    "work_mode",
    "employment_type",
    "posted_date_as_of",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub key: String,
    pub message: String,
}

impl Violation {
    fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Returns every contract violation in `record`. `url` is the link the user
/// asked about; it decides whether `source` must be "LinkedIn".
pub fn validate(record: &JobPosting, url: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    for key in JOB_POSTING_KEYS {
        if record.get(key).is_none() {
            violations.push(Violation::new(key, "missing"));
        }
    }
    for key in record.extra_keys() {
        violations.push(Violation::new(key, "not part of the schema"));
    }

    check_vocabulary(record, "source", &SOURCE_VALUES, &mut violations);
    check_vocabulary(record, "work_mode", &WORK_MODE_VALUES, &mut violations);
    check_vocabulary(
        record,
        "employment_type",
        &EMPLOYMENT_TYPE_VALUES,
        &mut violations,
    );

    if url.to_lowercase().contains("linkedin.com") {
        if let Some(Value::String(source)) = record.get("source") {
            if source != "LinkedIn" {
                violations.push(Violation::new(
                    "source",
                    format!("'{}' but the URL is a linkedin.com link", source),
                ));
            }
        }
    }

    if let Some(value) = record.get("posted_date_as_of") {
        match value.as_str() {
            Some(date) if is_posted_date(date) => {}
            _ => violations.push(Violation::new(
                "posted_date_as_of",
                format!("{} is not YYYY-MM-DD, YYYY-MM or Unknown", value),
            )),
        }
    }

    match record.get("skills_keywords") {
        Some(Value::Array(items)) => {
            for item in items {
                match item.as_str() {
                    Some(s) if s == s.to_lowercase() => {}
                    Some(s) => violations.push(Violation::new(
                        "skills_keywords",
                        format!("'{}' is not lowercase", s),
                    )),
                    None => violations.push(Violation::new(
                        "skills_keywords",
                        format!("{} is not a string", item),
                    )),
                }
            }
        }
        Some(other) => violations.push(Violation::new(
            "skills_keywords",
            format!("expected an array, got {}", other),
        )),
        None => {}
    }

    for key in NUMERIC_KEYS {
        match record.get(key) {
            Some(Value::Number(_)) | Some(Value::Null) | None => {}
            Some(other) => violations.push(Violation::new(
                key,
                format!("expected a number or null, got {}", other),
            )),
        }
    }

    if let Some(Value::Array(_)) | Some(Value::Object(_)) = record.get("job_id") {
        violations.push(Violation::new("job_id", "expected a scalar value"));
    }

    // Text fields carry "Unknown" when the posting says nothing, never null.
    for key in JOB_POSTING_KEYS
        .into_iter()
        .filter(|key| !NON_TEXT_KEYS.contains(key) && !NUMERIC_KEYS.contains(key))
    {
        match record.get(key) {
            Some(Value::String(_)) | None => {}
            Some(other) => violations.push(Violation::new(
                key,
                format!("expected text (\"{}\" when not stated), got {}", UNKNOWN, other),
            )),
        }
    }

    violations
}

fn check_vocabulary(
    record: &JobPosting,
    key: &str,
    allowed: &[&str],
    violations: &mut Vec<Violation>,
) {
    match record.get(key) {
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
        Some(value) => violations.push(Violation::new(
            key,
            format!("{} is not one of {}", value, allowed.join(", ")),
        )),
        None => {}
    }
}

fn is_posted_date(date: &str) -> bool {
    if date == UNKNOWN {
        return true;
    }
    match date.len() {
        10 => NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok(),
        7 => NaiveDate::parse_from_str(&format!("{}-01", date), "%Y-%m-%d").is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn valid_record() -> Map<String, Value> {
        let mut map = Map::new();
        for key in JOB_POSTING_KEYS {
            map.insert(key.to_string(), json!(UNKNOWN));
        }
        map.insert("job_id".into(), Value::Null);
        map.insert("source".into(), json!("LinkedIn"));
        map.insert("skills_keywords".into(), json!(["rust", "distributed systems"]));
        map.insert("comp_base_min".into(), Value::Null);
        map.insert("comp_base_max".into(), json!(180000));
        map.insert("posted_date_as_of".into(), json!("2025-11"));
        map
    }

    const LINKEDIN_URL: &str = "https://www.linkedin.com/jobs/view/12345";

    #[test]
    fn test_valid_record_has_no_violations() {
        let record = JobPosting::from_map(valid_record());
        assert!(validate(&record, LINKEDIN_URL).is_empty());
    }

    #[test]
    fn test_out_of_vocabulary_values() {
        let mut map = valid_record();
        map.insert("work_mode".into(), json!("Work from anywhere"));
        map.insert("employment_type".into(), json!("Full time"));
        let violations = validate(&JobPosting::from_map(map), LINKEDIN_URL);

        let keys: Vec<&str> = violations.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, ["work_mode", "employment_type"]);
    }

    #[test]
    fn test_linkedin_url_requires_linkedin_source() {
        let mut map = valid_record();
        map.insert("source".into(), json!("Company site"));
        let record = JobPosting::from_map(map);

        assert_eq!(validate(&record, LINKEDIN_URL).len(), 1);
        assert!(validate(&record, "https://careers.acme.io/42").is_empty());
    }

    #[test]
    fn test_missing_and_extra_keys() {
        let mut map = valid_record();
        map.remove("currency");
        map.insert("salary_notes".into(), json!("DOE"));
        let violations = validate(&JobPosting::from_map(map), LINKEDIN_URL);

        assert!(violations.contains(&Violation::new("currency", "missing")));
        assert!(violations.iter().any(|v| v.key == "salary_notes"));
    }

    #[test]
    fn test_posted_date_shapes() {
        assert!(is_posted_date("2025-11-03"));
        assert!(is_posted_date("2025-11"));
        assert!(is_posted_date("Unknown"));
        assert!(!is_posted_date("2025-13"));
        assert!(!is_posted_date("3 days ago"));
        assert!(!is_posted_date("2025-1-3"));
    }

    #[test]
    fn test_skills_and_comp_types() {
        let mut map = valid_record();
        map.insert("skills_keywords".into(), json!(["Rust", 7]));
        map.insert("comp_base_min".into(), json!("120k"));
        let violations = validate(&JobPosting::from_map(map), LINKEDIN_URL);

        assert_eq!(violations.len(), 3);
        assert_eq!(violations[2].key, "comp_base_min");
        assert!(violations[0].to_string().starts_with("skills_keywords:"));
    }

    #[test]
    fn test_text_fields_must_be_strings() {
        let mut map = valid_record();
        map.insert("company".into(), Value::Null);
        map.insert("location".into(), json!(42));
        map.insert("role_summary".into(), json!(["builds things"]));
        map.insert("source".into(), json!("Other"));
        let violations = validate(&JobPosting::from_map(map), "https://acme.io/j/1");

        let keys: Vec<&str> = violations.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, ["company", "location", "role_summary"]);
        assert_eq!(
            violations[0].to_string(),
            "company: expected text (\"Unknown\" when not stated), got null"
        );
    }

    #[test]
    fn test_job_id_may_be_null_or_text() {
        let mut map = valid_record();
        map.insert("job_id".into(), json!("12345"));
        assert!(validate(&JobPosting::from_map(map.clone()), LINKEDIN_URL).is_empty());

        map.insert("job_id".into(), json!({"id": 1}));
        let violations = validate(&JobPosting::from_map(map), LINKEDIN_URL);
        assert_eq!(violations, [Violation::new("job_id", "expected a scalar value")]);
    }

    #[test]
    fn test_empty_skills_is_valid() {
        let mut map = valid_record();
        map.insert("skills_keywords".into(), json!([]));
        assert!(validate(&JobPosting::from_map(map), LINKEDIN_URL).is_empty());
    }
}
