//! Error types for image-prober
//!
//! This module defines the error hierarchy covering:
//! - Image fetch transport errors
//! - Validation API errors (reset/validate endpoints)
//! - Configuration and CLI errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include the URL or value that failed
//! - Fetch errors are tolerated per work item; API errors abort the run

use thiserror::Error;

/// Top-level error type for the image-prober application
#[derive(Error, Debug)]
pub enum ProberError {
    /// Image fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Validation API errors
    #[error("Validation API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A spawned fetch task panicked or was cancelled
    #[error("Fetch task failed: {0}")]
    Worker(String),

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,
}

/// Errors from fetching a single image
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// Request could not be sent or the connection failed
    #[error("Request to '{url}' failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// Server answered with a non-success status
    #[error("Server returned HTTP {status} for '{url}'")]
    HttpStatus { url: String, status: u16 },

    /// Response body could not be read
    #[error("Failed to read image body from '{url}': {reason}")]
    BodyRead { url: String, reason: String },
}

impl FetchError {
    /// The URL the failing request was addressed to
    pub fn url(&self) -> &str {
        match self {
            FetchError::RequestFailed { url, .. } => url,
            FetchError::HttpStatus { url, .. } => url,
            FetchError::BodyRead { url, .. } => url,
        }
    }
}

/// Errors from the validation API (reset and validate endpoints)
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request could not be sent or the connection failed
    #[error("Request to '{endpoint}' failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    /// Validate endpoint answered with a non-success status
    #[error("Validation endpoint returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// Validate response body could not be read
    #[error("Failed to read validation response: {0}")]
    BodyRead(String),

    /// Validate response was not valid JSON of the expected shape
    #[error("Failed to decode validation response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse the server URL
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    /// Invalid iteration count
    #[error("Invalid iteration count {count}: must be between 1 and {max}")]
    InvalidIterations { count: u64, max: u64 },

    /// Invalid image ID space size
    #[error("Invalid image ID space {size}: must be at least 1")]
    InvalidIdSpace { size: u64 },

    /// Invalid in-flight request cap
    #[error("Invalid in-flight limit {limit}: must be between 1 and {max}")]
    InvalidInFlightLimit { limit: usize, max: usize },

    /// Invalid request timeout
    #[error("Invalid timeout {secs}s: must be at least 1 second")]
    InvalidTimeout { secs: u64 },

    /// Empty session token
    #[error("Session token must not be empty")]
    EmptySessionToken,
}

/// Result type alias for ProberError
pub type Result<T> = std::result::Result<T, ProberError>;

/// Result type alias for FetchError
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for ApiError
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Represents the outcome of one fetch work item
///
/// A failed fetch does not remove the identifier from the run's
/// identifier set; the identifier was counted when the work item was
/// generated.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Image bytes were retrieved
    Fetched { image_id: String, bytes: u64 },

    /// Fetch failed; tolerated, the batch continues
    Failed { image_id: String, error: FetchError },
}

impl FetchOutcome {
    /// Returns true if this outcome represents a successful fetch
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }

    /// Returns the image identifier associated with this outcome
    pub fn image_id(&self) -> &str {
        match self {
            FetchOutcome::Fetched { image_id, .. } => image_id,
            FetchOutcome::Failed { image_id, .. } => image_id,
        }
    }
}
