//! Cost engine error types.

use std::fmt;
use std::io;

/// Cost engine error codes.
pub mod codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ARCHIVE_CORRUPT: &str = "ARCHIVE_CORRUPT";
    pub const REGISTRY_ERROR: &str = "REGISTRY_ERROR";
    pub const NETWORK_FAILURE: &str = "NETWORK_FAILURE";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const UNEXPECTED: &str = "UNEXPECTED";
}

/// Cost engine error.
#[derive(Debug)]
pub struct CostError {
    code: &'static str,
    message: String,
}

impl CostError {
    /// Create a new error with the given code and message.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, msg)
    }

    /// Create a package not found error.
    #[must_use]
    pub fn not_found(id: &str) -> Self {
        Self::new(codes::NOT_FOUND, format!("Package not found: {id}"))
    }

    /// Create a corrupt archive error.
    pub fn archive_corrupt(msg: impl Into<String>) -> Self {
        Self::new(codes::ARCHIVE_CORRUPT, msg)
    }

    /// Create a registry error.
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::new(codes::REGISTRY_ERROR, msg)
    }

    /// Create a network failure error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(codes::NETWORK_FAILURE, msg)
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::new(codes::STORE_ERROR, msg)
    }

    /// Create an unexpected failure error.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::new(codes::UNEXPECTED, msg)
    }
}

impl fmt::Display for CostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CostError {}

impl From<io::Error> for CostError {
    fn from(e: io::Error) -> Self {
        Self::new(codes::STORE_ERROR, e.to_string())
    }
}

impl From<reqwest::Error> for CostError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::new(codes::NETWORK_FAILURE, format!("Request timed out: {e}"))
        } else if e.is_connect() {
            Self::new(codes::NETWORK_FAILURE, format!("Connection failed: {e}"))
        } else {
            Self::new(codes::REGISTRY_ERROR, e.to_string())
        }
    }
}

impl From<serde_json::Error> for CostError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(codes::REGISTRY_ERROR, format!("Invalid JSON: {e}"))
    }
}
