//! Error types for Record-Forge
//!
//! This module defines the error types used throughout the application.
//! Field-level validation failures live in [`crate::schema::error`] and are
//! wrapped here so every fallible operation shares one `Result` alias.

use crate::schema::error::ValidationError;
use thiserror::Error;

/// Result type alias for Record-Forge
pub type Result<T> = std::result::Result<T, RecordForgeError>;

/// Main error type for Record-Forge
#[derive(Error, Debug)]
pub enum RecordForgeError {
    /// Input could not be coerced into the schema
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP-related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    /// No API key configured for a provider
    #[error("No API key configured for {0}. Use /config <provider> <key> or set OPENAI_API_KEY")]
    LLMApiKeyMissing(String),

    /// Non-success response from a completion API
    #[error("{provider} API error (status {status}): {message}")]
    LLMApiError {
        provider: String,
        message: String,
        status: u16,
    },

    /// Header could not be built from the given name or value
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The model reply did not carry usable structured output
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Command was recognised but its arguments were wrong
    #[error("Invalid syntax for {command}. Expected: {expected}")]
    InvalidCommandSyntax { command: String, expected: String },

    /// Unknown `/` command
    #[error("Unknown command: {0}. Type /help for available commands")]
    UnknownCommand(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),
}

impl RecordForgeError {
    /// Field-level errors, when this is a validation failure
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}
