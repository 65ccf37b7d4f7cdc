//! Configuration types.
//!
//! Everything is read from environment variables; secrets are wrapped in
//! `SecretString` so they never end up in `Debug` output or logs.

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default Trello REST API base URL.
pub const DEFAULT_TRELLO_BASE_URL: &str = "https://api.trello.com/1";

/// Default Azure OpenAI API version.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Default model for OpenAI-compatible endpoints.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default OpenAI-compatible base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Trello API credentials.
#[derive(Debug, Clone)]
pub struct TrelloConfig {
    pub api_key: String,
    pub token: SecretString,
    pub base_url: String,
}

impl TrelloConfig {
    /// Build from `TRELLO_API_KEY`, `TRELLO_API_TOKEN` and `TRELLO_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required("TRELLO_API_KEY")?,
            token: SecretString::from(required("TRELLO_API_TOKEN")?),
            base_url: std::env::var("TRELLO_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_TRELLO_BASE_URL.to_string()),
        })
    }
}

/// Dialogue tuning.
#[derive(Debug, Clone)]
pub struct DialogConfig {
    /// How many candidate names are read out after "not found, list them?".
    pub suggestion_limit: usize,
    /// Send board and list names to the classifier as catalog context.
    pub classifier_context: bool,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: 5,
            classifier_context: false,
        }
    }
}

impl DialogConfig {
    /// Build from `TRELLO_VOICE_SUGGESTION_LIMIT` and
    /// `TRELLO_VOICE_CLASSIFIER_CONTEXT`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let suggestion_limit = match std::env::var("TRELLO_VOICE_SUGGESTION_LIMIT") {
            Ok(raw) => parse_limit("TRELLO_VOICE_SUGGESTION_LIMIT", &raw)?,
            Err(_) => defaults.suggestion_limit,
        };
        let classifier_context = match std::env::var("TRELLO_VOICE_CLASSIFIER_CONTEXT") {
            Ok(raw) => parse_bool("TRELLO_VOICE_CLASSIFIER_CONTEXT", &raw)?,
            Err(_) => defaults.classifier_context,
        };
        Ok(Self {
            suggestion_limit,
            classifier_context,
        })
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub trello: TrelloConfig,
    pub llm: LlmConfig,
    pub dialog: DialogConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            trello: TrelloConfig::from_env()?,
            llm: llm_config_from_env()?,
            dialog: DialogConfig::from_env()?,
        })
    }
}

/// Select and build the LLM configuration from `TRELLO_VOICE_LLM_BACKEND`.
fn llm_config_from_env() -> Result<LlmConfig, ConfigError> {
    let backend = std::env::var("TRELLO_VOICE_LLM_BACKEND").unwrap_or_else(|_| "azure".into());
    match parse_backend(&backend)? {
        LlmBackend::AzureOpenAi => {
            let endpoint = required("AZURE_OPENAI_ENDPOINT")?;
            Ok(LlmConfig {
                backend: LlmBackend::AzureOpenAi,
                api_key: SecretString::from(required("AZURE_OPENAI_API_KEY")?),
                model: required("AZURE_OPENAI_DEPLOYMENT")?,
                base_url: endpoint,
                api_version: Some(
                    std::env::var("AZURE_OPENAI_API_VERSION")
                        .unwrap_or_else(|_| DEFAULT_AZURE_API_VERSION.to_string()),
                ),
            })
        }
        LlmBackend::OpenAi => Ok(LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: SecretString::from(required("OPENAI_API_KEY")?),
            model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            api_version: None,
        }),
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

fn parse_backend(raw: &str) -> Result<LlmBackend, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "azure" | "azure_openai" | "azure-openai" => Ok(LlmBackend::AzureOpenAi),
        "openai" => Ok(LlmBackend::OpenAi),
        other => Err(ConfigError::InvalidValue {
            key: "TRELLO_VOICE_LLM_BACKEND".into(),
            message: format!("unknown backend '{other}' (expected 'azure' or 'openai')"),
        }),
    }
}

fn parse_limit(key: &str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: "must be at least 1".into(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        }),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_defaults() {
        let config = DialogConfig::default();
        assert_eq!(config.suggestion_limit, 5);
        assert!(!config.classifier_context);
    }

    #[test]
    fn parse_backend_accepts_aliases() {
        assert_eq!(parse_backend("azure").unwrap(), LlmBackend::AzureOpenAi);
        assert_eq!(parse_backend("Azure-OpenAI").unwrap(), LlmBackend::AzureOpenAi);
        assert_eq!(parse_backend("openai").unwrap(), LlmBackend::OpenAi);
        assert!(matches!(
            parse_backend("anthropic"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn parse_limit_rejects_zero_and_garbage() {
        assert_eq!(parse_limit("K", "3").unwrap(), 3);
        assert!(parse_limit("K", "0").is_err());
        assert!(parse_limit("K", "viele").is_err());
    }

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool("K", "true").unwrap());
        assert!(parse_bool("K", " ON ").unwrap());
        assert!(!parse_bool("K", "0").unwrap());
        assert!(!parse_bool("K", "").unwrap());
        assert!(parse_bool("K", "vielleicht").is_err());
    }
}
