//! Unified error handling for the quagga crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`QuaggaErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! Query and detail failures are recoverable and never escalate past the
//! entity or crawl node they occur in. Storage failures are fatal to a run.

use std::io;
use thiserror::Error;

pub use crate::utils::error::{DetailError, QueryError, StorageError};

/// Common trait for all quagga error types
pub trait QuaggaErrorTrait: std::error::Error {
    /// Check if this error is recoverable (the run can continue)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Endpoint errors (HTTP, timeout, rate limit)
    Network,
    /// Parsing and data extraction errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short label for log fields and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl QuaggaErrorTrait for QueryError {
    fn is_recoverable(&self) -> bool {
        true
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Decode(_) => ErrorCategory::Parsing,
            Self::InvalidQuery(_) | Self::InvalidEndpoint(_) => ErrorCategory::Config,
            Self::Http(_) | Self::Status(_) | Self::Timeout => ErrorCategory::Network,
        }
    }
}

impl QuaggaErrorTrait for DetailError {
    fn is_recoverable(&self) -> bool {
        true
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Query { source, .. } => source.category(),
            Self::NoUsableText { .. } | Self::EmptyNeighborhood { .. } => ErrorCategory::Parsing,
        }
    }
}

impl QuaggaErrorTrait for StorageError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidIdentifier(_) => ErrorCategory::Config,
            Self::Sqlite(_) | Self::SchemaMismatch { .. } | Self::Io(_) => ErrorCategory::Storage,
        }
    }
}

/// Unified error type for the quagga crate
#[derive(Error, Debug)]
pub enum Error {
    /// SPARQL query failures
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Entity detail failures
    #[error("Detail error: {0}")]
    Detail(#[from] DetailError),

    /// Destination table failures
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl QuaggaErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Query(e) => e.is_recoverable(),
            Self::Detail(e) => e.is_recoverable(),
            Self::Storage(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Query(e) => e.category(),
            Self::Detail(e) => e.category(),
            Self::Storage(e) => e.category(),
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
