//! Error types for Dripflow.
//!
//! All errors in Dripflow are represented by the `DripflowError` enum.
//! The variants follow the engine's failure taxonomy: validation errors
//! dead-end a branch and are never retried, configuration errors halt a
//! run, and provider errors are node-scoped with a per-action
//! continue/halt policy decided by the executor.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Dripflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum DripflowError {
    /// Engine-level errors (startup, shutdown, dispatch while stopped).
    #[error("{0}")]
    Engine(String),

    /// Configuration file parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, enum parsing).
    #[error("{0}")]
    Convert(String),

    /// Malformed or missing node, edge, or id. Always logged; the
    /// affected branch is dead-ended and never auto-retried.
    #[error("{0}")]
    Validation(String),

    /// Missing runtime configuration (audience credentials, invalid
    /// numeric threshold). Fatal: halts the run immediately.
    #[error("{0}")]
    Configuration(String),

    /// Failure reported by an outbound collaborator (email delivery or
    /// audience sync). Node-scoped; the executor decides whether the
    /// run continues or halts.
    #[error("provider {provider}: {message}")]
    Provider {
        provider: String,
        message: String,
    },

    /// Storage operation errors.
    #[error("{0}")]
    Store(String),

    /// Trigger resolution or subject-id validation errors.
    #[error("{0}")]
    Trigger(String),

    /// Run lifecycle errors.
    #[error("{0}")]
    Run(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),

    /// Durable scheduler errors (suspend/resume).
    #[error("{0}")]
    Scheduler(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<DripflowError> for String {
    fn from(val: DripflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for DripflowError {
    fn from(error: std::io::Error) -> Self {
        DripflowError::IoError(error.to_string())
    }
}

impl From<DripflowError> for std::io::Error {
    fn from(val: DripflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for DripflowError {
    fn from(error: serde_json::Error) -> Self {
        DripflowError::Convert(error.to_string())
    }
}

impl From<strum::ParseError> for DripflowError {
    fn from(error: strum::ParseError) -> Self {
        DripflowError::Convert(error.to_string())
    }
}
