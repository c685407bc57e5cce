//! Error types for Cimientos services
//!
//! Provides a single error enum with:
//! - Distinct variants for each failure mode of the core components
//! - Machine-readable error codes for callers
//! - Classification helpers used by the request layer

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Image input errors (4xxx)
    ImageDecodeError,
    DimensionMismatch,

    // Storage errors (7xxx)
    IoError,
    EncodeError,

    // External service errors (8xxx)
    UpstreamError,
    UpstreamTimeout,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,

            ErrorCode::ImageDecodeError => 4001,
            ErrorCode::DimensionMismatch => 4002,

            ErrorCode::IoError => 7001,
            ErrorCode::EncodeError => 7002,

            ErrorCode::UpstreamError => 8001,
            ErrorCode::UpstreamTimeout => 8002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Image input errors
    #[error("Failed to decode image {path}: {message}")]
    ImageDecode { path: String, message: String },

    #[error("Invalid image dimensions for {role}: {width}x{height}")]
    DimensionMismatch {
        role: String,
        width: u32,
        height: u32,
    },

    // Storage errors
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    // External service errors
    #[error("Upstream service error ({service}): {message}")]
    Upstream {
        service: String,
        status: Option<u16>,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Build an IO error tagged with the path it occurred on
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Build an upstream error for the named service
    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        AppError::Upstream {
            service: service.to_string(),
            status: None,
            message: message.into(),
        }
    }

    /// Build an upstream error carrying the HTTP status the service answered with
    pub fn upstream_status(service: &str, status: u16, message: impl Into<String>) -> Self {
        AppError::Upstream {
            service: service.to_string(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::ImageDecode { .. } => ErrorCode::ImageDecodeError,
            AppError::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            AppError::Io { .. } => ErrorCode::IoError,
            AppError::Encode { .. } => ErrorCode::EncodeError,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::HttpClient(e) if e.is_timeout() => ErrorCode::UpstreamTimeout,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Errors caused by the caller's input rather than by this process
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::ImageDecode { .. }
                | AppError::DimensionMismatch { .. }
        )
    }

    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            // 4xx other than 429 will fail the same way again
            AppError::Upstream { status, .. } => match status {
                Some(code) => *code == 429 || *code >= 500,
                None => true,
            },
            AppError::HttpClient(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Structured error body handed to the request layer
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub numeric_code: u16,
    pub message: String,
}

impl From<&AppError> for ErrorDetails {
    fn from(err: &AppError) -> Self {
        let code = err.code();
        Self {
            code,
            numeric_code: code.as_code(),
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::ImageDecode {
            path: "base.png".into(),
            message: "bad header".into(),
        };
        assert_eq!(err.code(), ErrorCode::ImageDecodeError);
        assert_eq!(err.code().as_code(), 4001);
        assert!(err.is_client_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = AppError::io(
            Path::new("/readonly/out.png"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.code(), ErrorCode::IoError);
        assert!(err.to_string().contains("/readonly/out.png"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_upstream_is_retryable() {
        let err = AppError::upstream("openai", "502 Bad Gateway");
        assert!(err.is_retryable());
        assert_eq!(err.code(), ErrorCode::UpstreamError);
    }

    #[test]
    fn test_upstream_client_status_not_retryable() {
        assert!(!AppError::upstream_status("openai", 401, "invalid key").is_retryable());
        assert!(AppError::upstream_status("openai", 429, "slow down").is_retryable());
        assert!(AppError::upstream_status("openai", 503, "overloaded").is_retryable());
    }

    #[test]
    fn test_error_details_serialization() {
        let err = AppError::DimensionMismatch {
            role: "base".into(),
            width: 0,
            height: 600,
        };
        let details = ErrorDetails::from(&err);
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["code"], "DIMENSION_MISMATCH");
        assert_eq!(json["numeric_code"], 4002);
    }
}
