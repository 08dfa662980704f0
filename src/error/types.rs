//! Error type definitions
//!
//! Defines the main error types used throughout the automation service.

use thiserror::Error;

/// Main error type for the automation service
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// Browser driver errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// Session management errors
    #[error("Session error: {0}")]
    Session(String),

    /// Login flow errors
    #[error("Login failed: {0}")]
    Login(String),

    /// Challenge processing errors
    #[error("Challenge processing failed: {stage}")]
    Challenge { stage: String },

    /// Cookie jar storage errors
    #[error("Cookie store error: {operation}")]
    Storage { operation: String },

    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Job API collaborator errors
    #[error("Job API error: {0}")]
    Api(String),

    /// Bearer token errors
    #[error("Auth error: {0}")]
    Auth(String),

    /// Webhook relay errors
    #[error("Relay error: {0}")]
    Relay(String),

    /// Network/HTTP client errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Date/time parsing errors
    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new server error
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Create a new browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a new session error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create a new login error
    pub fn login(msg: impl Into<String>) -> Self {
        Self::Login(msg.into())
    }

    /// Create a challenge error
    pub fn challenge(stage: impl Into<String>) -> Self {
        Self::Challenge {
            stage: stage.into(),
        }
    }

    /// Create a cookie store error
    pub fn storage(operation: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
        }
    }

    /// Create a scheduler error
    pub fn scheduler(msg: impl Into<String>) -> Self {
        Self::Scheduler(msg.into())
    }

    /// Create a job API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create an auth error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a relay error
    pub fn relay(msg: impl Into<String>) -> Self {
        Self::Relay(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
