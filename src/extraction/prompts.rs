// src/extraction/prompts.rs
//! The extraction contract: the fixed system instruction and the user payloads.

/// Sent verbatim as the system instruction on every model call.
pub const JOB_EXTRACTION_PROMPT: &str = r#"
You are an information extraction engine that turns a job posting into one normalized JSON object.

Goal:
Read the provided job link or posting text and return exactly one JSON object that follows the schema below.

Core requirements:
1) Output valid JSON only. Do not wrap it in markdown.
2) When a field is not available use "Unknown" for strings and null for numbers. Never omit a key.
3) skills_keywords is an array of lowercase keywords.
4) posted_date_as_of is "YYYY-MM-DD", "YYYY-MM" or "Unknown".

Normalization rules:
- source: "LinkedIn" if the URL contains linkedin.com, otherwise "Company site" or "Other".
- employment_type: one of "Full-time", "Part-time", "Contract", "Internship", "Unknown".
- work_mode: one of "Onsite", "Hybrid", "Remote", "Unknown".

JSON schema (exact keys required):
{
  "job_id": null,
  "source": <string>,
  "job_url": <string>,
  "company": <string>,
  "job_title": <string>,
  "team_or_org": <string>,
  "product_or_area": <string>,
  "location": <string>,
  "work_mode": <string>,
  "employment_type": <string>,
  "seniority": <string>,
  "function": <string>,
  "industry": <string>,
  "role_summary": <string>,
  "key_responsibilities": <string>,
  "minimum_qualifications": <string>,
  "preferred_qualifications": <string>,
  "skills_keywords": <array of strings>,
  "ai_ml_relevance": <string>,
  "user_impact_type": <string>,
  "likely_interview_focus_areas": <string>,
  "resume_skills_to_emphasize": <string>,
  "potential_gaps_or_risks": <string>,
  "comp_base_min": <number or null>,
  "comp_base_max": <number or null>,
  "currency": <string>,
  "posted_date_as_of": <string>,
  "raw_posting_text_verbatim_plain": <string>
}
"#;

/// Payload when only the URL string is available.
pub fn direct_payload(url: &str) -> String {
    format!("Here is the job link:\n{}", url)
}

/// Payload when page content was fetched.
pub fn content_payload(url: &str, content: &str) -> String {
    format!("URL: {}\nCONTENT:\n{}", url, content)
}
