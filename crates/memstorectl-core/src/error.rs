//! Unified error handling for memstorectl-core
//!
//! Wraps API, wait-loop, validation and configuration failures with
//! consistent helper methods.
//!
//! # Example
//!
//! ```rust
//! use memstorectl_core::{ApiError, CoreError};
//!
//! let api_err = ApiError::NotFound {
//!     message: "cluster not found".to_string(),
//! };
//! let core_err: CoreError = api_err.into();
//! assert!(core_err.is_not_found());
//! assert!(!core_err.is_timeout());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::client::ApiError;
use crate::config::ConfigError;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Error returned by (or while talking to) the remote API
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The resource did not reach a terminal state before the deadline
    #[error("Timed out after {timeout:?} waiting for a stable state{}", last_seen(.last_status))]
    WaitTimeout {
        timeout: Duration,
        last_status: Option<String>,
    },

    /// The caller aborted the wait
    #[error("Wait cancelled{}", last_seen(.last_status))]
    Cancelled { last_status: Option<String> },

    /// Malformed input, rejected before any request is sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

fn last_seen(status: &Option<String>) -> String {
    match status {
        Some(status) => format!(" (last status: {})", status),
        None => String::new(),
    }
}

impl CoreError {
    /// Returns true if the remote API reported the resource as absent (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_unauthorized(),
            _ => false,
        }
    }

    /// Returns true if a deadline expired, either the wait deadline or an HTTP timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_timeout(),
            CoreError::WaitTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the caller interrupted the operation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled { .. })
    }

    /// Returns true if this is a bad request error (400 or local validation)
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_bad_request(),
            CoreError::Validation(_) => true,
            _ => false,
        }
    }

    /// Returns true if this error is potentially retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_retryable(),
            CoreError::WaitTimeout { .. } => true, // the resource may still settle
            _ => false,
        }
    }

    /// Last status observed before a wait stopped, if any
    #[must_use]
    pub fn last_status(&self) -> Option<&str> {
        match self {
            CoreError::WaitTimeout { last_status, .. } | CoreError::Cancelled { last_status } => {
                last_status.as_deref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_from_api() {
        let api_err = ApiError::NotFound {
            message: "Cluster not found".to_string(),
        };
        let core_err: CoreError = api_err.into();

        assert!(core_err.is_not_found());
        assert!(!core_err.is_unauthorized());
        assert!(!core_err.is_retryable());
    }

    #[test]
    fn test_core_error_api_helpers_delegate() {
        let unauthorized: CoreError = ApiError::AuthenticationFailed {
            message: "Bad token".to_string(),
        }
        .into();
        assert!(unauthorized.is_unauthorized());

        let rate_limited: CoreError = ApiError::RateLimited {
            message: "Too many requests".to_string(),
        }
        .into();
        assert!(rate_limited.is_retryable());

        let bad_request: CoreError = ApiError::BadRequest {
            message: "Invalid input".to_string(),
        }
        .into();
        assert!(bad_request.is_bad_request());
    }

    #[test]
    fn test_wait_timeout() {
        let err = CoreError::WaitTimeout {
            timeout: Duration::from_secs(900),
            last_status: Some("provisioning".to_string()),
        };
        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
        assert!(!err.is_not_found());
        assert_eq!(err.last_status(), Some("provisioning"));
        assert!(err.to_string().contains("last status: provisioning"));
    }

    #[test]
    fn test_cancelled_is_not_timeout() {
        let err = CoreError::Cancelled { last_status: None };
        assert!(err.is_cancelled());
        assert!(!err.is_timeout());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Wait cancelled");
    }

    #[test]
    fn test_validation() {
        let err = CoreError::Validation("private network id is empty".to_string());
        assert!(err.is_bad_request());
        assert!(!err.is_retryable());
    }
}
