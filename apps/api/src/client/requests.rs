//! Builders for the two wizard calls and the parser for the skills answer.

use chrono::NaiveDate;

use crate::llm_client::prompts::{
    DEFAULT_STRATEGY, MISSING_SKILLS_FRAGMENT, MISSING_SKILLS_SYSTEM,
    MISSING_SKILLS_USER_TEMPLATE, PREFERENCES_FRAGMENT, TAILOR_SYSTEM_TEMPLATE,
    TAILOR_USER_TEMPLATE,
};
use crate::llm_client::strip_json_fences;
use crate::models::generation::{GenerationRequest, DEFAULT_MODEL};

pub const TAILOR_TEMPERATURE: f64 = 0.7;
pub const SKILLS_TEMPERATURE: f64 = 0.1;

/// What the user entered in the wizard.
#[derive(Debug, Clone, Default)]
pub struct TailorInput {
    pub resume_text: String,
    pub job_text: String,
    /// Free-text strategic direction, also repeated as strict preferences.
    pub preferences: Option<String>,
    /// Skills the user confirmed they have but the résumé does not mention.
    pub selected_skills: Vec<String>,
    pub model: Option<String>,
}

impl TailorInput {
    fn preferences(&self) -> Option<&str> {
        self.preferences
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Substitutes `{name}` placeholders in one pass. Inserted values are never
/// scanned again, so user text containing braces is copied verbatim.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let placeholder = values.iter().find(|(name, _)| {
            tail[1..].starts_with(name) && tail[1 + name.len()..].starts_with('}')
        });
        match placeholder {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// The single call that produces the résumé HTML and its metadata block.
pub fn tailored_resume_request(input: &TailorInput, today: NaiveDate) -> GenerationRequest {
    let missing_skills = if input.selected_skills.is_empty() {
        String::new()
    } else {
        let skills = input.selected_skills.join(", ");
        fill(MISSING_SKILLS_FRAGMENT, &[("skills", skills.as_str())])
    };
    let preferences = input
        .preferences()
        .map(|p| fill(PREFERENCES_FRAGMENT, &[("preferences", p)]))
        .unwrap_or_default();

    let system = fill(
        TAILOR_SYSTEM_TEMPLATE,
        &[
            ("strategy", input.preferences().unwrap_or(DEFAULT_STRATEGY)),
            ("missing_skills", missing_skills.as_str()),
            ("preferences", preferences.as_str()),
        ],
    );
    let today = today.format("%B %-d, %Y").to_string();
    let user = fill(
        TAILOR_USER_TEMPLATE,
        &[
            ("today", today.as_str()),
            ("resume", input.resume_text.as_str()),
            ("job", input.job_text.as_str()),
        ],
    );

    GenerationRequest::new(system, user)
        .with_model(input.model.as_deref().unwrap_or(DEFAULT_MODEL))
        .with_temperature(TAILOR_TEMPERATURE)
}

/// Asks for the hard skills the job wants and the résumé lacks, as a JSON array.
pub fn missing_skills_request(resume_text: &str, job_text: &str) -> GenerationRequest {
    let user = fill(
        MISSING_SKILLS_USER_TEMPLATE,
        &[("resume", resume_text), ("job", job_text)],
    );

    GenerationRequest::new(MISSING_SKILLS_SYSTEM, user)
        .with_model(DEFAULT_MODEL)
        .with_temperature(SKILLS_TEMPERATURE)
}

/// Parses the skills answer, tolerating a fenced code block around it.
pub fn parse_missing_skills(text: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(strip_json_fences(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> TailorInput {
        TailorInput {
            resume_text: "Ada Lovelace, analyst".into(),
            job_text: "Rust engineer at Acme".into(),
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[test]
    fn test_tailored_request_defaults() {
        let request = tailored_resume_request(&input(), today());
        let system = request.system_text();

        assert_eq!(request.model.as_deref(), Some(DEFAULT_MODEL));
        assert_eq!(request.generation_config.as_ref().unwrap().temperature, Some(0.7));
        assert!(system.contains("STRATEGIC DIRECTION TO FOLLOW: General enhancement"));
        assert!(!system.contains("CRITICAL MISSING SKILLS"));
        assert!(!system.contains("USER PREFERENCES"));
        assert!(!system.contains("{strategy}") && !system.contains("{missing_skills}"));
    }

    #[test]
    fn test_tailored_request_user_turn() {
        let request = tailored_resume_request(&input(), today());
        assert_eq!(
            request.first_user_text(),
            "Today's Date: March 7, 2026\n\nBase Resume:\nAda Lovelace, analyst\n\nTarget Job Description:\nRust engineer at Acme"
        );
        assert!(request.cache_key.is_none());
    }

    #[test]
    fn test_tailored_request_with_skills_and_preferences() {
        let input = TailorInput {
            preferences: Some("Lead with leadership".into()),
            selected_skills: vec!["AWS".into(), "Kubernetes".into()],
            model: Some("gemini-2.5-pro".into()),
            ..input()
        };
        let request = tailored_resume_request(&input, today());
        let system = request.system_text();

        assert_eq!(request.model.as_deref(), Some("gemini-2.5-pro"));
        assert!(system.contains("STRATEGIC DIRECTION TO FOLLOW: Lead with leadership"));
        assert!(system.contains("into the bullet points: AWS, Kubernetes"));
        assert!(system.contains("USER PREFERENCES (STRICTLY FOLLOW):\nLead with leadership\n"));
    }

    #[test]
    fn test_braces_in_user_text_are_not_substituted() {
        let input = TailorInput {
            resume_text: "Built {job} templating engine".into(),
            job_text: "Senior {resume} role".into(),
            preferences: Some("Keep {missing_skills} and {preferences} literal".into()),
            selected_skills: vec!["{strategy}".into()],
            ..input()
        };
        let request = tailored_resume_request(&input, today());
        let system = request.system_text();

        assert!(request
            .first_user_text()
            .ends_with("Base Resume:\nBuilt {job} templating engine\n\nTarget Job Description:\nSenior {resume} role"));
        assert!(system.contains("STRATEGIC DIRECTION TO FOLLOW: Keep {missing_skills} and {preferences} literal"));
        assert!(system.contains("into the bullet points: {strategy}"));
        assert_eq!(system.matches("CRITICAL MISSING SKILLS").count(), 1);
        assert_eq!(system.matches("USER PREFERENCES").count(), 1);
        assert!(system.contains("{\"applicantName\": string"));
    }

    #[test]
    fn test_fill_leaves_unknown_braces() {
        assert_eq!(fill("{a} {b} {", &[("a", "{b}")]), "{b} {b} {");
    }

    #[test]
    fn test_missing_skills_request() {
        let request = missing_skills_request("cv", "jd");
        assert_eq!(request.generation_config.as_ref().unwrap().temperature, Some(0.1));
        assert_eq!(request.first_user_text(), "Resume:\ncv\n\nJob Description:\njd");
        assert!(request.system_text().starts_with("You are an expert technical recruiter"));
    }

    #[test]
    fn test_parse_missing_skills() {
        assert_eq!(
            parse_missing_skills("```json\n[\"AWS\", \"B2B Sales\"]\n```").unwrap(),
            vec!["AWS", "B2B Sales"]
        );
        assert_eq!(parse_missing_skills(" [] ").unwrap(), Vec::<String>::new());
        assert!(parse_missing_skills("AWS, Kubernetes").is_err());
    }
}
