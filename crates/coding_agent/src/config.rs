//! Agent configuration read from the environment.

use std::env;
use std::time::Duration;

use agent_provider_gemini::{DEFAULT_GEMINI_MODEL, DEFAULT_MAX_TURNS, GEMINI_PROVIDER_ID};
use thiserror::Error;

pub const PROVIDER_ENV_VAR: &str = "CODING_AGENT_PROVIDER";
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_ENV_VAR: &str = "CODING_AGENT_MODEL";
pub const BASE_URL_ENV_VAR: &str = "GEMINI_API_BASE_URL";
pub const TIMEOUT_ENV_VAR: &str = "CODING_AGENT_TIMEOUT_SEC";
pub const MAX_TURNS_ENV_VAR: &str = "CODING_AGENT_MAX_TURNS";
pub const SYSTEM_INSTRUCTIONS_ENV_VAR: &str = "CODING_AGENT_SYSTEM_INSTRUCTIONS";

pub const DEFAULT_PROVIDER_ID: &str = GEMINI_PROVIDER_ID;

pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str = "\
You are a helpful AI coding agent.

When a user asks a question or makes a request, make a function call plan. You can perform the following operations:

- List files and directories
- Read file contents
- Write or overwrite files
- Execute Python or shell scripts with optional arguments

All paths you provide should be relative to the working directory. You do not need to specify the working directory in your function calls as it is automatically injected for security reasons.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub provider_id: String,
    pub api_key: Option<String>,
    pub model_id: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub max_turns: usize,
    pub system_instructions: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider_id: DEFAULT_PROVIDER_ID.to_string(),
            api_key: None,
            model_id: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: None,
            timeout: None,
            max_turns: DEFAULT_MAX_TURNS,
            system_instructions: DEFAULT_SYSTEM_INSTRUCTIONS.to_string(),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let timeout = read(TIMEOUT_ENV_VAR)
            .map(|value| parse_positive(TIMEOUT_ENV_VAR, value).map(Duration::from_secs))
            .transpose()?;
        let max_turns = read(MAX_TURNS_ENV_VAR)
            .map(|value| parse_positive(MAX_TURNS_ENV_VAR, value))
            .transpose()?
            .map_or(defaults.max_turns, |turns| turns as usize);

        Ok(Self {
            provider_id: read(PROVIDER_ENV_VAR)
                .map(|value| value.to_ascii_lowercase())
                .unwrap_or(defaults.provider_id),
            api_key: read(API_KEY_ENV_VAR),
            model_id: read(MODEL_ENV_VAR).unwrap_or(defaults.model_id),
            base_url: read(BASE_URL_ENV_VAR),
            timeout,
            max_turns,
            system_instructions: read(SYSTEM_INSTRUCTIONS_ENV_VAR)
                .unwrap_or(defaults.system_instructions),
        })
    }
}

fn parse_positive(key: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            expected: "a positive integer",
        }),
    }
}
