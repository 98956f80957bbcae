//! Error handling utilities for the daybook application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.

use std::path::PathBuf;
use thiserror::Error;

/// Represents errors raised by the blob persistence boundary.
///
/// # Examples
///
/// ```
/// use daybook::errors::StorageError;
/// use std::path::PathBuf;
///
/// let error = StorageError::Busy {
///     path: PathBuf::from("/tmp/daybook/.lock"),
/// };
/// assert!(format!("{}", error).contains("another daybook process"));
/// ```
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store directory is locked by another process.
    #[error("Blob store is locked by another daybook process: {path}. Close the other session and try again.")]
    Busy {
        /// Path of the lock file
        path: PathBuf,
    },

    /// Reading or writing a blob failed.
    #[error("Failed to access blob '{key}': {source}. Please check permissions and free disk space.")]
    Access {
        /// Key of the blob
        key: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A blob key contains characters that cannot be mapped to a file name.
    #[error("Invalid blob key: '{0}'")]
    InvalidKey(String),

    /// A blob could not be encoded for storage.
    #[error("Failed to serialize blob '{key}': {source}")]
    Serialize {
        /// Key of the blob
        key: String,
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },
}

/// Represents specific error cases that can occur while talking to the remote model.
///
/// # Examples
///
/// ```
/// use daybook::errors::AIError;
///
/// let error = AIError::HttpStatus { status: 401, body: "invalid key".to_string() };
/// assert!(format!("{}", error).contains("401"));
/// ```
#[derive(Debug, Error)]
pub enum AIError {
    /// The API could not be reached.
    #[error("API request failed: {0}. Check your network connection.")]
    Unreachable(#[source] reqwest::Error),

    /// The API answered with a non-success status code.
    #[error("API returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The response envelope did not have the expected shape.
    #[error("Invalid response from API: {0}")]
    InvalidResponse(String),
}

/// Outcomes of an analysis run that did not produce a usable result.
///
/// `NoCredential` and `NoContent` short-circuit before any network call and are
/// reported as status text. `RemoteUnavailable` and `MalformedResponse` are
/// absorbed by the fallback analyzer and only appear in logs.
///
/// # Examples
///
/// ```
/// use daybook::errors::AnalysisError;
///
/// assert!(AnalysisError::NoCredential.is_benign());
/// assert!(!AnalysisError::AnalysisFailed("empty title".to_string()).is_benign());
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// No API key is configured.
    #[error("An API key is required for analysis")]
    NoCredential,

    /// The entry has no user messages.
    #[error("Nothing to analyze yet")]
    NoContent,

    /// The remote call failed at the network or HTTP level.
    #[error("Remote analysis unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote payload could not be parsed after cleanup.
    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),

    /// Neither the remote call nor the fallback produced a valid analysis.
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
}

impl AnalysisError {
    /// Returns true for conditions shown as plain status text rather than failures.
    pub fn is_benign(&self) -> bool {
        matches!(self, AnalysisError::NoCredential | AnalysisError::NoContent)
    }
}

/// Represents all possible errors that can occur in the daybook application.
///
/// # Examples
///
/// Creating a configuration error:
/// ```
/// use daybook::errors::AppError;
///
/// let error = AppError::Config("Missing data directory".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Missing data directory");
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors in journal entry logic (e.g., invalid date formats).
    #[error("Journal logic error: {0}")]
    Journal(String),

    /// Errors raised by the blob store.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Errors related to remote model calls.
    #[error("AI error: {0}")]
    AI(#[from] AIError),

    /// Analysis could not be run or completed.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
///
/// # Examples
///
/// ```
/// use daybook::errors::{AppResult, AppError};
///
/// fn might_fail() -> AppResult<String> {
///     if false {
///         return Err(AppError::Journal("Something went wrong".to_string()));
///     }
///     Ok("Operation succeeded".to_string())
/// }
/// ```
pub type AppResult<T> = Result<T, AppError>;
