//! Environment-sourced bot configuration
//!
//! Required settings (bot token, backend URL, API key, model) fail startup
//! outright when absent; everything else has a default.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const BOT_TOKEN: &str = "BOT_TOKEN";
const BASE_URL: &str = "BOT_API__BASE_URL";
const API_KEY: &str = "BOT_API__API_KEY";
const MODEL: &str = "BOT_API__MODEL";
const SYSTEM_PROMPT_PATH: &str = "BOT_SYSTEM_PROMPT_PATH";
const COOLDOWN_SECS: &str = "BOT_JOKE_GENERATION__COOLDOWN";
const TEMPERATURE: &str = "BOT_GENERATION__TEMPERATURE";
const MAX_TOKENS: &str = "BOT_GENERATION__MAX_TOKENS";
const MAX_ATTEMPTS: &str = "BOT_GENERATION__MAX_ATTEMPTS";
const MODE: &str = "BOT_GENERATION__MODE";
const FLUSH_MILLIS: &str = "BOT_STREAM__FLUSH_MILLIS";

const DEFAULT_COOLDOWN_SECS: u64 = 60;
const DEFAULT_TEMPERATURE: f32 = 0.8;
const DEFAULT_MAX_TOKENS: u32 = 200;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_FLUSH_MILLIS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// How generated jokes are fetched from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Single request expecting a JSON envelope with a `"joke"` field,
    /// retried a bounded number of times on malformed output.
    #[default]
    Structured,
    /// Incremental token stream coalesced into rate-limited message edits.
    Streaming,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt_path: Option<PathBuf>,
    pub cooldown: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_attempts: u32,
    pub mode: GenerationMode,
    pub flush_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let cooldown_secs = parse_or(&lookup, COOLDOWN_SECS, DEFAULT_COOLDOWN_SECS)?;
        let flush_millis = parse_or(&lookup, FLUSH_MILLIS, DEFAULT_FLUSH_MILLIS)?;

        Ok(Self {
            bot_token: required(&lookup, BOT_TOKEN)?,
            base_url: required(&lookup, BASE_URL)?,
            api_key: required(&lookup, API_KEY)?,
            model: required(&lookup, MODEL)?,
            system_prompt_path: lookup(SYSTEM_PROMPT_PATH)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            cooldown: Duration::from_secs(cooldown_secs),
            temperature: parse_or(&lookup, TEMPERATURE, DEFAULT_TEMPERATURE)?,
            max_tokens: parse_or(&lookup, MAX_TOKENS, DEFAULT_MAX_TOKENS)?,
            max_attempts: parse_or(&lookup, MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)?,
            mode: parse_mode(&lookup)?,
            flush_interval: Duration::from_millis(flush_millis),
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<String, ConfigError> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

fn parse_mode(lookup: &impl Fn(&str) -> Option<String>) -> Result<GenerationMode, ConfigError> {
    match lookup(MODE) {
        None => Ok(GenerationMode::default()),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "structured" => Ok(GenerationMode::Structured),
            "streaming" => Ok(GenerationMode::Streaming),
            _ => Err(ConfigError::Invalid { name: MODE, value: raw }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (BOT_TOKEN, "123:abc"),
            (BASE_URL, "https://llm.example.com/v1"),
            (API_KEY, "sk-test"),
            (MODEL, "test-model"),
        ])
    }

    fn from_vars(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| vars.get(name).map(ToString::to_string))
    }

    #[test]
    fn test_defaults_applied() {
        let config = from_vars(&base_vars()).unwrap();
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.mode, GenerationMode::Structured);
        assert_eq!(config.flush_interval, Duration::from_millis(1000));
        assert!(config.system_prompt_path.is_none());
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let mut vars = base_vars();
        vars.remove(API_KEY);
        let err = from_vars(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(name) if name == API_KEY));
    }

    #[test]
    fn test_blank_base_url_is_fatal() {
        let mut vars = base_vars();
        vars.insert(BASE_URL, "   ");
        let err = from_vars(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(name) if name == BASE_URL));
    }

    #[test]
    fn test_overrides_parsed() {
        let mut vars = base_vars();
        vars.insert(COOLDOWN_SECS, "15");
        vars.insert(MAX_ATTEMPTS, "5");
        vars.insert(MODE, "streaming");
        vars.insert(FLUSH_MILLIS, "250");
        let config = from_vars(&vars).unwrap();
        assert_eq!(config.cooldown, Duration::from_secs(15));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.mode, GenerationMode::Streaming);
        assert_eq!(config.flush_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut vars = base_vars();
        vars.insert(COOLDOWN_SECS, "soon");
        let err = from_vars(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == COOLDOWN_SECS));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let mut vars = base_vars();
        vars.insert(MODE, "telepathic");
        assert!(from_vars(&vars).is_err());
    }
}
