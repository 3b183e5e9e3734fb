//! Error types for tagstat
//!
//! This module defines the error types used throughout the tagstat crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! Errors fall in two groups. Fetch errors (`Network`, `Api`,
//! `QuotaExhausted`, `MalformedItem`) end the collection of a single tag and
//! are reported per tag; everything else aborts the run.
//!
//! # Example
//!
//! ```
//! use tagstat_core::error::{TagstatError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to TagstatError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Main error type for tagstat operations
#[derive(Error, Debug)]
pub enum TagstatError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error(
        "HTTP {status} | tag={tag} | page={page} | reason={} | body={body}",
        .reason.as_deref().unwrap_or("unknown")
    )]
    Api {
        /// HTTP status code
        status: u16,
        /// Tag being fetched
        tag: String,
        /// Page that failed
        page: u32,
        /// `error_name`/`error_message` from the error wrapper, if it decoded
        reason: Option<String>,
        /// Response body, truncated
        body: String,
    },

    /// The API reported `quota_remaining = 0`
    #[error("Quota exhausted (quota_remaining=0) | tag={tag} | page={page}")]
    QuotaExhausted {
        /// Tag being fetched
        tag: String,
        /// Page carrying the signal
        page: u32,
    },

    /// An item without a usable `creation_date` was received in strict mode
    #[error("Item without usable creation_date | tag={tag} | page={page}")]
    MalformedItem {
        /// Tag being fetched
        tag: String,
        /// Page containing the item
        page: u32,
    },

    /// The requested query window is empty or inverted
    #[error("Invalid query window: {0}")]
    InvalidWindow(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl TagstatError {
    /// Whether this error only ends the current tag's collection.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Json(_)
                | Self::Api { .. }
                | Self::QuotaExhausted { .. }
                | Self::MalformedItem { .. }
        )
    }
}

/// Convenience type alias for Results in tagstat
///
/// # Example
///
/// ```
/// use tagstat_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, TagstatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TagstatError::QuotaExhausted {
            tag: "rust".to_string(),
            page: 3,
        };
        assert_eq!(
            error.to_string(),
            "Quota exhausted (quota_remaining=0) | tag=rust | page=3"
        );

        let error = TagstatError::Api {
            status: 400,
            tag: "python".to_string(),
            page: 2,
            reason: None,
            body: "<html>".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "HTTP 400 | tag=python | page=2 | reason=unknown | body=<html>"
        );

        let error = TagstatError::Api {
            status: 400,
            tag: "python".to_string(),
            page: 2,
            reason: Some("bad_parameter: pagesize (error_id 400)".to_string()),
            body: r#"{"error_id":400}"#.to_string(),
        };
        assert_eq!(
            error.to_string(),
            r#"HTTP 400 | tag=python | page=2 | reason=bad_parameter: pagesize (error_id 400) | body={"error_id":400}"#
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let tagstat_error: TagstatError = io_error.into();
        assert!(matches!(tagstat_error, TagstatError::Io(_)));
        assert!(!tagstat_error.is_fetch_error());
    }

    #[test]
    fn test_fetch_error_classification() {
        assert!(
            TagstatError::MalformedItem {
                tag: "go".into(),
                page: 1
            }
            .is_fetch_error()
        );
        assert!(!TagstatError::InvalidWindow("6 <= 6".into()).is_fetch_error());
        assert!(!TagstatError::Config("bad".into()).is_fetch_error());
    }
}
