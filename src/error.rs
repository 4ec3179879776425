use miette::{Diagnostic, Result};
use thiserror::Error;

use crate::intent::model::NormalizedEvent;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Validation error: {0}")]
    #[diagnostic(code(planmate::validation))]
    Validation(String),

    #[error("Could not parse model reply for user {user_id}: {message}")]
    #[diagnostic(code(planmate::upstream_parse))]
    UpstreamParse {
        user_id: String,
        text: String,
        reply: String,
        message: String,
    },

    #[error("Dispatch failed for user {user_id}: {message}")]
    #[diagnostic(code(planmate::dispatch))]
    Dispatch {
        user_id: String,
        text: String,
        parsed: Box<NormalizedEvent>,
        message: String,
    },

    #[error("Language model error: {0}")]
    #[diagnostic(code(planmate::language_model))]
    LanguageModel(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(planmate::google_calendar))]
    GoogleCalendar(String),

    #[error("Storage error: {0}")]
    #[diagnostic(code(planmate::storage))]
    Storage(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(planmate::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(planmate::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(planmate::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(planmate::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(planmate::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Storage(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create storage errors
pub fn storage_error(message: &str) -> Error {
    Error::Storage(message.to_string())
}

/// Helper to create language model errors
pub fn language_model_error(message: &str) -> Error {
    Error::LanguageModel(message.to_string())
}
