//! Error types for the Trello voice assistant.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Trello error: {0}")]
    Trello(#[from] TrelloError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Intent error: {0}")]
    Intent(#[from] IntentError),

    #[error("Voice error: {0}")]
    Voice(#[from] VoiceError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the Trello REST API (catalog reads and mutations alike).
#[derive(Debug, thiserror::Error)]
pub enum TrelloError {
    #[error("{operation} fehlgeschlagen: {reason}")]
    Request { operation: String, reason: String },

    #[error("{operation} fehlgeschlagen (HTTP {status}): {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Ungültige Antwort bei {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures at the classification boundary.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("Leere Spracheingabe")]
    EmptyUtterance,

    #[error("KI-Anfrage fehlgeschlagen: {0}")]
    Llm(#[from] LlmError),

    #[error("KI-Antwort nicht lesbar: {0}")]
    Parse(String),

    #[error("Unbekannte Aktion '{0}'")]
    UnknownAction(String),
}

/// Speech input/output errors.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Internal flow invariant violations. Unreachable when the state machine
/// behaves; fatal to the flow when they do occur.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("{0} fehlt")]
    MissingReference(&'static str),

    #[error("{0} fehlt")]
    MissingValue(&'static str),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
