use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
/// Sampling temperature used when a request carries no generation config.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// One conversation turn, or the system instruction (which has no role).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::User),
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Concatenated text of every part.
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }

    /// Turns without an explicit role are sent by the user.
    pub fn is_user(&self) -> bool {
        matches!(self.role, None | Some(Role::User))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Any other provider parameter is forwarded untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerationConfig {
    pub fn with_temperature(temperature: f64) -> Self {
        Self {
            temperature: Some(temperature),
            extra: Map::new(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::with_temperature(DEFAULT_TEMPERATURE)
    }
}

/// Body accepted by the generation edge function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(default)]
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_seconds: Option<u64>,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            system_instruction: Some(Content::instruction(system)),
            contents: vec![Content::user(prompt)],
            generation_config: None,
            cache_key: None,
            cache_ttl_seconds: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.generation_config = Some(GenerationConfig::with_temperature(temperature));
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>, ttl_seconds: Option<u64>) -> Self {
        self.cache_key = Some(key.into());
        self.cache_ttl_seconds = ttl_seconds;
        self
    }

    /// The server-side cache key, ignoring blank values.
    pub fn server_cache_key(&self) -> Option<&str> {
        self.cache_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn system_text(&self) -> String {
        self.system_instruction
            .as_ref()
            .map(Content::text)
            .unwrap_or_default()
    }

    pub fn first_user_text(&self) -> String {
        self.contents
            .iter()
            .find(|c| c.is_user())
            .map(Content::text)
            .unwrap_or_default()
    }
}

/// Body forwarded to the provider's `generateContent` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequest<'a> {
    pub contents: &'a [Content],
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<&'a Content>,
}

impl<'a> From<&'a GenerationRequest> for ProviderRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            contents: &request.contents,
            generation_config: request.generation_config.clone().unwrap_or_default(),
            system_instruction: request.system_instruction.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_deserializes_camel_case_body() {
        let body = json!({
            "model": "gemini-2.5-pro",
            "systemInstruction": { "parts": [{ "text": "Write a haiku" }] },
            "contents": [{ "role": "user", "parts": [{ "text": "about rain" }] }],
            "generationConfig": { "temperature": 0.2, "topK": 40 },
            "cacheKey": "haiku-rain",
            "cacheTtlSeconds": 60
        });
        let request: GenerationRequest = serde_json::from_value(body).unwrap();

        assert_eq!(request.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(request.system_text(), "Write a haiku");
        assert_eq!(request.first_user_text(), "about rain");
        assert_eq!(request.server_cache_key(), Some("haiku-rain"));
        assert_eq!(request.cache_ttl_seconds, Some(60));
        let config = request.generation_config.unwrap();
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.extra.get("topK"), Some(&json!(40)));
    }

    #[test]
    fn test_turn_without_role_counts_as_user() {
        let body = json!({
            "contents": [
                { "role": "model", "parts": [{ "text": "earlier answer" }] },
                { "parts": [{ "text": "Base Resume:" }, { "text": " ..." }] }
            ]
        });
        let request: GenerationRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.first_user_text(), "Base Resume: ...");
    }

    #[test]
    fn test_blank_cache_key_is_ignored() {
        let request = GenerationRequest::new("s", "p").with_cache_key("   ", None);
        assert_eq!(request.server_cache_key(), None);
    }

    #[test]
    fn test_provider_request_defaults_generation_config() {
        let request = GenerationRequest::new("sys", "prompt").with_cache_key("k", Some(5));
        let body = serde_json::to_value(ProviderRequest::from(&request)).unwrap();

        assert_eq!(body["generationConfig"]["temperature"], json!(0.7));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(body.get("cacheKey").is_none());
        assert!(body.get("model").is_none());
    }

    #[test]
    fn test_provider_request_omits_missing_system_instruction() {
        let mut request = GenerationRequest::new("sys", "prompt");
        request.system_instruction = None;
        let body = serde_json::to_value(ProviderRequest::from(&request)).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }
}
