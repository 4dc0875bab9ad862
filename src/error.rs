//! Error types for migval

use std::time::Duration;
use thiserror::Error;

/// Result type alias for migval operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Errors returned by a metric provider (GitHub, Bitbucket Server)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. Check the token for this repository.")]
    Unauthorized,

    #[error("Access denied. The token lacks permission for this resource.")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("{0} is not supported by this source")]
    Unsupported(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `migval init` to set up.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("{0} token not configured. Pass it as a flag, set it in the environment, or run `migval init`.")]
    MissingToken(&'static str),

    #[error("Bitbucket Server URL not configured. Pass --bbs-url or run `migval init`.")]
    MissingBitbucketUrl,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Migration archive errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive not found: {0}")]
    NotFound(String),

    #[error("Refusing to extract unsafe archive entry: {0}")]
    UnsafePath(String),

    #[error("Failed to extract archive: {0}")]
    Extract(String),

    #[error("Failed to parse archive file {file}: {reason}")]
    Parse { file: String, reason: String },
}

/// Session store errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not determine a data directory for saved sessions")]
    NoDataDir,

    #[error("Session storage I/O error: {0}")]
    Io(String),

    #[error("Session database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to serialize session: {0}")]
    Serialization(String),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session id prefix '{0}' matches more than one session")]
    Ambiguous(String),
}

/// Fatal validation errors raised by the retrieval orchestrator
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Cannot access {side} repository {repo}: {source}")]
    AccessDenied {
        side: &'static str,
        repo: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to retrieve any metrics for {side} repository {repo}: {}", .errors.join("; "))]
    TotalRetrievalFailure {
        side: &'static str,
        repo: String,
        errors: Vec<String>,
    },

    #[error("Retrieval task for {0} repository did not complete: {1}")]
    TaskFailed(&'static str, String),
}
