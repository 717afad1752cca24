//! Error types for StudyMate

use thiserror::Error;

/// Result type alias for StudyMate operations
pub type Result<T> = std::result::Result<T, Error>;

/// StudyMate errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session name is empty or not a single token
    #[error("Invalid session name '{0}': names must be non-empty and contain no whitespace")]
    InvalidSessionName(String),

    /// Session already present in the registry
    #[error("Session '{0}' already exists")]
    SessionExists(String),

    /// Session absent from the registry
    #[error("Session '{0}' does not exist")]
    SessionNotFound(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector database error
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// The hosted API rejected the credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The hosted API is throttling requests
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error comes from talking to a remote service and may go
    /// away on a later attempt
    pub fn is_transient(&self) -> bool {
        match self {
            Error::RateLimited(_) => true,
            Error::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}
