//! Error Types

use thiserror::Error;

/// Result type alias for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// LLM provider error types
#[derive(Error, Debug)]
pub enum LlmError {
    /// LLM provider returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider answered but produced no text
    #[error("Provider returned an empty completion")]
    EmptyCompletion,

    /// Configuration error (missing key, bad URL)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Short category label, safe to log next to user-facing output
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider",
            Self::ProviderUnavailable(_) => "unavailable",
            Self::EmptyCompletion => "empty",
            Self::Config(_) => "config",
            Self::RateLimited(_) => "rate_limited",
            Self::Auth(_) => "auth",
            Self::Json(_) => "json",
        }
    }
}
