//! The output bundle of one tailoring run, as the result pages read it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::client::storage::{SessionStorage, StorageError};

/// Storage key holding the bundle of the current generation.
pub const OUTPUTS_KEY: &str = "tms_outputs";
pub const DEFAULT_PRIMARY_COLOR: &str = "#1a1a2e";

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:html|json|text)?\n(.*?)```").expect("fenced block pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBundle {
    pub resume_html: String,
    /// Cover letter, interview answers and email are produced on demand later.
    pub cover_html: Option<String>,
    pub interview_qa: Option<String>,
    pub email_text: Option<String>,
    pub applicant_name: String,
    pub target_company: String,
    pub match_score: Option<f64>,
    pub missing_keywords: Vec<String>,
    pub company_primary_color: String,
    pub resume_text: String,
    pub job_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
}

impl OutputBundle {
    /// Builds the bundle from the model's answer: the first fenced block is the
    /// résumé HTML, the second the metadata JSON. Missing or unparsable
    /// metadata falls back to defaults.
    pub fn from_generation(content: &str, resume_text: &str, job_text: &str) -> Self {
        let blocks: Vec<&str> = FENCED_BLOCK
            .captures_iter(content)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .collect();

        let meta = blocks
            .get(1)
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .unwrap_or(Value::Null);
        let text = |field: &str| {
            meta.get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            resume_html: blocks.first().map(|b| b.to_string()).unwrap_or_default(),
            cover_html: None,
            interview_qa: None,
            email_text: None,
            applicant_name: text("applicantName").unwrap_or_default(),
            target_company: text("targetCompany").unwrap_or_default(),
            match_score: meta.get("matchScore").and_then(Value::as_f64),
            missing_keywords: meta
                .get("missingKeywords")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            company_primary_color: text("companyPrimaryColor")
                .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
            resume_text: resume_text.to_string(),
            job_text: job_text.to_string(),
            generation_id: None,
        }
    }
}

pub fn save_outputs(storage: &dyn SessionStorage, bundle: &OutputBundle) -> Result<(), StorageError> {
    let raw = serde_json::to_string(bundle).map_err(|e| StorageError::Unavailable(e.to_string()))?;
    storage.set(OUTPUTS_KEY, &raw)
}

/// The stored bundle, or `None` when nothing usable is stored.
pub fn load_outputs(storage: &dyn SessionStorage) -> Option<OutputBundle> {
    let raw = storage.get(OUTPUTS_KEY).filter(|raw| !raw.is_empty())?;
    match serde_json::from_str(&raw) {
        Ok(bundle) => Some(bundle),
        Err(e) => {
            warn!("Ignoring unreadable output bundle: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemorySessionStorage;

    const ANSWER: &str = "```html\n<h1>Ada Lovelace</h1>\n<ul><li>Built engines</li></ul>\n```\n\n```json\n{\"applicantName\":\"Ada Lovelace\",\"targetCompany\":\"Acme\",\"matchScore\":87,\"missingKeywords\":[\"Rust\",\"Kafka\"],\"companyPrimaryColor\":\"#ff0000\"}\n```";

    #[test]
    fn test_from_generation_reads_both_blocks() {
        let bundle = OutputBundle::from_generation(ANSWER, "resume", "job");
        assert_eq!(bundle.resume_html, "<h1>Ada Lovelace</h1>\n<ul><li>Built engines</li></ul>");
        assert_eq!(bundle.applicant_name, "Ada Lovelace");
        assert_eq!(bundle.target_company, "Acme");
        assert_eq!(bundle.match_score, Some(87.0));
        assert_eq!(bundle.missing_keywords, vec!["Rust", "Kafka"]);
        assert_eq!(bundle.company_primary_color, "#ff0000");
        assert_eq!(bundle.resume_text, "resume");
        assert_eq!(bundle.cover_html, None);
    }

    #[test]
    fn test_bad_metadata_falls_back_to_defaults() {
        let answer = "```html\n<p>cv</p>\n```\n```json\n{not json\n```";
        let bundle = OutputBundle::from_generation(answer, "", "");
        assert_eq!(bundle.resume_html, "<p>cv</p>");
        assert_eq!(bundle.applicant_name, "");
        assert_eq!(bundle.match_score, None);
        assert!(bundle.missing_keywords.is_empty());
        assert_eq!(bundle.company_primary_color, DEFAULT_PRIMARY_COLOR);
    }

    #[test]
    fn test_answer_without_fences_gives_empty_resume() {
        let bundle = OutputBundle::from_generation("Sorry, I can't help.", "", "");
        assert_eq!(bundle.resume_html, "");
    }

    #[test]
    fn test_save_then_load() {
        let storage = MemorySessionStorage::new();
        let bundle = OutputBundle::from_generation(ANSWER, "resume", "job");
        save_outputs(&storage, &bundle).unwrap();
        assert_eq!(load_outputs(&storage), Some(bundle));
    }

    #[test]
    fn test_load_missing_corrupt_or_empty_is_none() {
        let storage = MemorySessionStorage::new();
        assert_eq!(load_outputs(&storage), None);

        storage.set(OUTPUTS_KEY, "not-valid-json{{{").unwrap();
        assert_eq!(load_outputs(&storage), None);

        storage.set(OUTPUTS_KEY, "").unwrap();
        assert_eq!(load_outputs(&storage), None);
    }
}
