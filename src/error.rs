//! Error types for MomBot.

use std::time::Duration;

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Interview error: {0}")]
    Interview(#[from] InterviewError),

    #[error("Session host error: {0}")]
    Host(#[from] HostError),
}

/// Configuration-related errors. Raised before a session exists.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Interview script is missing template keys: {}", .0.join(", "))]
    MissingTemplates(Vec<String>),

    #[error("Template {key} uses unknown placeholder {{{placeholder}}}")]
    UnknownPlaceholder { key: String, placeholder: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Stream from {provider} interrupted: {reason}")]
    StreamInterrupted { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Request to {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures inside a single interview turn.
///
/// These never reach the caller of `advance`; they are converted into the
/// apology reply and the turn is rolled back.
#[derive(Debug, thiserror::Error)]
pub enum InterviewError {
    #[error("Interview has not been started")]
    NotStarted,

    #[error("No resonance score recorded for problem {problem_index}")]
    MissingResonanceScore { problem_index: usize },

    #[error("Problem index {index} out of range ({total} problems)")]
    ProblemOutOfRange { index: usize, total: usize },

    #[error("Template {key} is not available")]
    Template { key: String },
}

/// Errors surfaced by the multi-session host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Interview session {id} not found")]
    NotFound { id: Uuid },

    #[error("Interview session {id} is already complete")]
    InterviewComplete { id: Uuid },

    #[error("Invalid founder configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
