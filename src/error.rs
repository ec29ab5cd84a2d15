//! Error types for the trace webhook

use thiserror::Error;

/// Main error type for webhook startup and serving
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration was parsed but holds invalid values
    #[error("validation error: {0}")]
    Validation(String),

    /// TLS certificate or key could not be loaded
    #[error("TLS error: {0}")]
    Tls(String),

    /// HTTPS server failed while serving
    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a TLS error with the given message
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }

    /// Create a server error with the given message
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }
}
