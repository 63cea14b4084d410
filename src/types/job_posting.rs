// src/types/job_posting.rs
//! The normalized job posting record produced by the extraction step.

use serde::Serialize;
use serde_json::{Map, Value};

/// Schema keys in row order.
pub const JOB_POSTING_KEYS: [&str; 28] = [
    "job_id",
    "source",
    "job_url",
    "company",
    "job_title",
    "team_or_org",
    "product_or_area",
    "location",
    "work_mode",
    "employment_type",
    "seniority",
    "function",
    "industry",
    "role_summary",
    "key_responsibilities",
    "minimum_qualifications",
    "preferred_qualifications",
    "skills_keywords",
    "ai_ml_relevance",
    "user_impact_type",
    "likely_interview_focus_areas",
    "resume_skills_to_emphasize",
    "potential_gaps_or_risks",
    "comp_base_min",
    "comp_base_max",
    "currency",
    "posted_date_as_of",
    "raw_posting_text_verbatim_plain",
];

/// Keys whose value is a number or null.
pub const NUMERIC_KEYS: [&str; 2] = ["comp_base_min", "comp_base_max"];

pub const SOURCE_VALUES: [&str; 3] = ["LinkedIn", "Company site", "Other"];
pub const WORK_MODE_VALUES: [&str; 4] = ["Onsite", "Hybrid", "Remote", "Unknown"];
pub const EMPLOYMENT_TYPE_VALUES: [&str; 5] =
    ["Full-time", "Part-time", "Contract", "Internship", "Unknown"];

/// Sentinel for text fields the model could not fill.
pub const UNKNOWN: &str = "Unknown";

/// A decoded extraction response.
///
/// The record holds whatever the model returned, in the order it returned it.
/// Schema conformance is checked separately by the validator, never coerced here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JobPosting {
    fields: Map<String, Value>,
}

impl JobPosting {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn job_title(&self) -> &str {
        self.text_or_unknown("job_title")
    }

    pub fn company(&self) -> &str {
        self.text_or_unknown("company")
    }

    fn text_or_unknown(&self, key: &str) -> &str {
        self.fields
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN)
    }

    /// Keys present in the record that are not part of the schema, in model order.
    pub fn extra_keys(&self) -> Vec<&str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|k| !JOB_POSTING_KEYS.contains(k))
            .collect()
    }

    /// Column headers matching [`JobPosting::to_row`].
    pub fn header(&self) -> Vec<String> {
        JOB_POSTING_KEYS
            .iter()
            .copied()
            .chain(self.extra_keys())
            .map(str::to_string)
            .collect()
    }

    /// Stringified values: schema keys first in fixed order (absent keys become
    /// empty cells), then any extra keys the model added.
    pub fn to_row(&self) -> Vec<String> {
        let mut row: Vec<String> = JOB_POSTING_KEYS
            .iter()
            .map(|key| self.fields.get(*key).map(cell_text).unwrap_or_default())
            .collect();

        row.extend(
            self.extra_keys()
                .into_iter()
                .filter_map(|key| self.fields.get(key))
                .map(cell_text),
        );

        row
    }
}

/// Canonical string form of a value as written to a spreadsheet cell.
///
/// Strings are written verbatim, everything else as compact JSON text
/// (`null`, `120000`, `true`, `["rust","sql"]`, `[]`). Rows written by older
/// tooling may hold Python reprs (`None`, `['rust', 'sql']`) in the same columns.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_posting() -> JobPosting {
        let mut map = Map::new();
        for key in JOB_POSTING_KEYS {
            map.insert(key.to_string(), json!(UNKNOWN));
        }
        map.insert("job_id".into(), Value::Null);
        map.insert("comp_base_min".into(), json!(120000));
        map.insert("comp_base_max".into(), json!(150000.5));
        map.insert("skills_keywords".into(), json!(["rust", "sql"]));
        JobPosting::from_map(map)
    }

    #[test]
    fn test_row_follows_schema_order() {
        let posting = complete_posting();
        let row = posting.to_row();

        assert_eq!(row.len(), JOB_POSTING_KEYS.len());
        assert_eq!(row[0], "null");
        assert_eq!(row[17], r#"["rust","sql"]"#);
        assert_eq!(row[23], "120000");
        assert_eq!(row[24], "150000.5");
        assert_eq!(posting.header()[17], "skills_keywords");
    }

    #[test]
    fn test_row_matches_cell_text_for_every_field() {
        let posting = complete_posting();
        let row = posting.to_row();
        for (i, key) in JOB_POSTING_KEYS.iter().enumerate() {
            let expected = cell_text(posting.get(key).unwrap());
            assert_eq!(row[i], expected, "column {}", key);
        }
    }

    #[test]
    fn test_empty_skills_render_as_empty_list() {
        assert_eq!(cell_text(&json!([])), "[]");
        assert_eq!(cell_text(&json!(null)), "null");
        assert_eq!(cell_text(&json!("Remote")), "Remote");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&json!(["rust", "sql"])), r#"["rust","sql"]"#);
    }

    #[test]
    fn test_missing_and_extra_keys() {
        let mut map = Map::new();
        map.insert("bonus".into(), json!("10%"));
        map.insert("company".into(), json!("Acme"));
        let posting = JobPosting::from_map(map);

        let row = posting.to_row();
        assert_eq!(row.len(), JOB_POSTING_KEYS.len() + 1);
        assert_eq!(row[3], "Acme");
        assert_eq!(row[4], "");
        assert_eq!(row.last().map(String::as_str), Some("10%"));
        assert_eq!(posting.header().last().map(String::as_str), Some("bonus"));
        assert_eq!(posting.job_title(), UNKNOWN);
        assert_eq!(posting.company(), "Acme");
    }
}
