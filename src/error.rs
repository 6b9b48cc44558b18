// src/error.rs

//! Unified error handling for the crawler application.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be constructed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV encoding/decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Remote call failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record persistence failed
    #[error("Persistence error for {destination}: {message}")]
    Persistence {
        destination: String,
        message: String,
    },

    /// Crawling error
    #[error("Crawl error for {context}: {message}")]
    Crawl { context: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a persistence error for a destination.
    pub fn persistence(destination: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Persistence {
            destination: destination.into(),
            message: message.to_string(),
        }
    }

    /// Create a crawl error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

/// Failure of a single remote call.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection error, timeout or 5xx gateway status. Retried by the fetcher.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Transient failures outlasted the retry budget.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    /// Non-zero application code inside a 200 response.
    #[error("application error {code}: {message}")]
    Application { code: i64, message: String },

    /// Non-transient HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Response body was not the expected JSON envelope.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Stable label used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transient(_) => "transient",
            FetchError::Exhausted { .. } => "exhausted",
            FetchError::Application { .. } | FetchError::Status(_) => "application",
            FetchError::Decode(_) => "decode",
        }
    }
}

/// Classifies errors the retry loop is allowed to repeat.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            return FetchError::Transient(e.to_string());
        }
        match e.status() {
            Some(status) if is_transient_status(status.as_u16()) => {
                FetchError::Transient(e.to_string())
            }
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transient(e.to_string()),
        }
    }
}

/// Gateway statuses worth retrying.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 500 | 502 | 503 | 504)
}
