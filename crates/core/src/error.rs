//! Error types for the helpdesk gateway.

use thiserror::Error;

/// Result type alias using the gateway's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the helpdesk gateway.
///
/// Every variant is per-request: nothing here is fatal to the process, and
/// a failure on one request never affects other in-flight requests.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Boundary Errors (surfaced before any backend dispatch)
    // =========================================================================
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // =========================================================================
    // Backend Errors (absorbed into degraded responses where possible)
    // =========================================================================
    #[error("Backend transient failure: {0}")]
    BackendTransient(String),

    #[error("Backend permanent failure: {0}")]
    BackendPermanent(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an unauthenticated error.
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a transient backend error.
    pub fn backend_transient(msg: impl Into<String>) -> Self {
        Self::BackendTransient(msg.into())
    }

    /// Create a permanent backend error.
    pub fn backend_permanent(msg: impl Into<String>) -> Self {
        Self::BackendPermanent(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a gateway error.
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
