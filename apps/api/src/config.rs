use anyhow::{Context, Result};

use crate::cache::DEFAULT_TTL_SECS;
use crate::llm_client::GEMINI_API_BASE;
use crate::models::generation::DEFAULT_MODEL;
use crate::tools::tts::{ELEVENLABS_API_BASE, DEFAULT_VOICE_ID};
use crate::usage::DEFAULT_FREE_MONTHLY_GENERATIONS;

/// Application configuration loaded from environment variables.
///
/// Provider credentials are optional at startup: a missing key fails each
/// request that needs it instead of the whole process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Without a database the cache and usage tables live in process memory.
    pub database_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub default_model: String,
    pub cache_default_ttl_secs: u64,
    /// Return the provider's own status code for provider errors instead of 200.
    pub preserve_upstream_status: bool,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_api_base: String,
    pub elevenlabs_voice_id: String,
    pub free_monthly_generations: i32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            database_url: var("DATABASE_URL"),
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_api_base: var("GEMINI_API_BASE").unwrap_or_else(|| GEMINI_API_BASE.to_string()),
            default_model: var("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            cache_default_ttl_secs: parse_or(
                var("CACHE_DEFAULT_TTL_SECS"),
                DEFAULT_TTL_SECS,
                "CACHE_DEFAULT_TTL_SECS must be a number of seconds",
            )?,
            preserve_upstream_status: parse_or(
                var("PRESERVE_UPSTREAM_STATUS"),
                false,
                "PRESERVE_UPSTREAM_STATUS must be true or false",
            )?,
            elevenlabs_api_key: var("ELEVENLABS_API_KEY"),
            elevenlabs_api_base: var("ELEVENLABS_API_BASE")
                .unwrap_or_else(|| ELEVENLABS_API_BASE.to_string()),
            elevenlabs_voice_id: var("ELEVENLABS_VOICE_ID")
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            free_monthly_generations: parse_or(
                var("FREE_MONTHLY_GENERATIONS"),
                DEFAULT_FREE_MONTHLY_GENERATIONS,
                "FREE_MONTHLY_GENERATIONS must be an integer",
            )?,
            port: parse_or(var("PORT"), 8080, "PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T>(value: Option<String>, default: T, message: &'static str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw.trim().parse::<T>().context(message),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert_eq!(config.cache_default_ttl_secs, 86_400);
        assert!(!config.preserve_upstream_status);
        assert_eq!(config.free_monthly_generations, 5);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = config_from(&[("GEMINI_API_KEY", "  ")]).unwrap();
        assert_eq!(config.gemini_api_key, None);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/tailor"),
            ("CACHE_DEFAULT_TTL_SECS", "3600"),
            ("PRESERVE_UPSTREAM_STATUS", "true"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/tailor"));
        assert_eq!(config.cache_default_ttl_secs, 3600);
        assert!(config.preserve_upstream_status);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT must be a valid port number"));
    }
}
