//! Runtime settings read from the environment.
//!
//! Every value has a default so a bare `almostme serve` starts; a missing API
//! key is not fatal, it only means model-bound turns get the apology reply.

use std::time::Duration;

use thiserror::Error;

use crate::knowledge::ContextPolicy;
use crate::models::DEFAULT_HISTORY_CAP;
use crate::session::DEFAULT_SESSION_TTL_MINUTES;

pub const DEFAULT_MODEL_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// API key variables, most specific first.
const API_KEY_VARS: &[&str] = &["ALMOSTME_API_KEY", "OPENROUTER_API_KEY", "GITHUB_TOKEN"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid context policy '{0}' (expected all, ranked[:n] or budget:<chars>)")]
    InvalidPolicy(String),

    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Connection and sampling settings for the hosted model.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// Sent as `HTTP-Referer` (OpenRouter attribution).
    pub app_url: Option<String>,
    /// Sent as `X-Title` (OpenRouter attribution).
    pub app_title: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MODEL_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            app_url: None,
            app_title: None,
        }
    }
}

impl ModelSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; used by `from_env` and tests.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|name| get(name).filter(|v| !v.trim().is_empty()));

        Ok(Self {
            base_url: get("ALMOSTME_MODEL_URL")
                .unwrap_or(defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: get("ALMOSTME_MODEL").unwrap_or(defaults.model),
            temperature: parse_var(&get, "ALMOSTME_TEMPERATURE", defaults.temperature)?,
            max_tokens: parse_var(&get, "ALMOSTME_MAX_TOKENS", defaults.max_tokens)?,
            timeout: Duration::from_secs(parse_var(
                &get,
                "ALMOSTME_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            app_url: get("ALMOSTME_APP_URL"),
            app_title: get("ALMOSTME_APP_TITLE"),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Conversation and context settings.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub history_cap: usize,
    pub session_ttl: chrono::Duration,
    pub context_policy: ContextPolicy,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            session_ttl: chrono::Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            context_policy: ContextPolicy::default(),
        }
    }
}

impl ChatSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let context_policy = match get("ALMOSTME_CONTEXT_POLICY") {
            Some(raw) => raw.parse()?,
            None => ContextPolicy::default(),
        };
        let ttl_minutes: i64 = parse_var(
            &get,
            "ALMOSTME_SESSION_TTL_MINUTES",
            DEFAULT_SESSION_TTL_MINUTES,
        )?;
        let session_ttl = chrono::Duration::try_minutes(ttl_minutes)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "ALMOSTME_SESSION_TTL_MINUTES",
                value: ttl_minutes.to_string(),
            })?;

        Ok(Self {
            history_cap: parse_var(&get, "ALMOSTME_HISTORY_CAP", DEFAULT_HISTORY_CAP)?,
            session_ttl,
            context_policy,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn model_settings_defaults() {
        let settings = ModelSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.base_url, DEFAULT_MODEL_URL);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert!(settings.api_key.is_none());
        assert!(!settings.is_configured());
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn api_key_falls_back_through_provider_variables() {
        let settings = ModelSettings::from_lookup(lookup(&[("GITHUB_TOKEN", "gh")])).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("gh"));

        let settings = ModelSettings::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "gh"),
            ("OPENROUTER_API_KEY", "or"),
        ]))
        .unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("or"));
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let settings = ModelSettings::from_lookup(lookup(&[(
            "ALMOSTME_MODEL_URL",
            "https://models.inference.ai.azure.com/",
        )]))
        .unwrap();
        assert_eq!(settings.base_url, "https://models.inference.ai.azure.com");
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let err = ModelSettings::from_lookup(lookup(&[("ALMOSTME_MAX_TOKENS", "lots")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: "ALMOSTME_MAX_TOKENS",
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn rejects_session_ttl_out_of_range() {
        let huge = i64::MAX.to_string();
        let err = ChatSettings::from_lookup(lookup(&[("ALMOSTME_SESSION_TTL_MINUTES", huge.as_str())]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: "ALMOSTME_SESSION_TTL_MINUTES",
                value: huge.clone()
            }
        );

        assert!(
            ChatSettings::from_lookup(lookup(&[("ALMOSTME_SESSION_TTL_MINUTES", "0")])).is_err()
        );
    }

    #[test]
    fn chat_settings_read_ttl_in_minutes() {
        let settings =
            ChatSettings::from_lookup(lookup(&[("ALMOSTME_SESSION_TTL_MINUTES", "90")])).unwrap();
        assert_eq!(settings.session_ttl, chrono::Duration::minutes(90));
    }

    #[test]
    fn chat_settings_read_policy_and_cap() {
        let settings = ChatSettings::from_lookup(lookup(&[
            ("ALMOSTME_CONTEXT_POLICY", "budget:4000"),
            ("ALMOSTME_HISTORY_CAP", "10"),
        ]))
        .unwrap();
        assert_eq!(settings.history_cap, 10);
        assert_eq!(
            settings.context_policy,
            ContextPolicy::Budget { max_chars: 4000 }
        );
    }
}
