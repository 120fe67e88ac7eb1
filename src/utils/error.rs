//! Error types for the quagga dataset builder
//!
//! This module defines the domain error enums shared by the SPARQL client,
//! the entity detail fetcher and the dataset materializer.

use thiserror::Error;

/// Errors that can occur while running a SPARQL query against an endpoint
///
/// Every variant is a non-fatal query failure: call sites log it and treat
/// the result as empty or absent.
#[derive(Error, Debug)]
pub enum QueryError {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status code
    #[error("Endpoint returned status {0}")]
    Status(u16),

    /// Request did not complete within the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body could not be decoded or parsed
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Query could not be built from the given input
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Endpoint URL is malformed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl QueryError {
    /// Whether repeating the same query could succeed
    ///
    /// Retry on transport errors and 429/500/502/503/504. A timeout already
    /// spent the whole bounded wait for its step, so it is final, as are
    /// client-side errors (400, 404, malformed queries).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => false,
            Self::Http(e) => !e.is_builder() && !e.is_decode() && !e.is_timeout(),
            Self::Status(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
            Self::Decode(_) | Self::InvalidQuery(_) | Self::InvalidEndpoint(_) => false,
        }
    }
}

/// Reasons an entity yields no usable detail record
#[derive(Error, Debug)]
pub enum DetailError {
    /// No language-tagged comment survived the length filter
    #[error("No usable description for {uri}")]
    NoUsableText { uri: String },

    /// The neighborhood construct query returned nothing
    #[error("Empty RDF neighborhood for {uri}")]
    EmptyNeighborhood { uri: String },

    /// A detail query failed
    #[error("Query failed for {uri}: {source}")]
    Query {
        uri: String,
        #[source]
        source: QueryError,
    },
}

impl DetailError {
    /// URI of the entity that was skipped
    pub fn uri(&self) -> &str {
        match self {
            Self::NoUsableText { uri } | Self::EmptyNeighborhood { uri } | Self::Query { uri, .. } => {
                uri
            }
        }
    }
}

/// Errors raised while writing the dataset to its destination table
///
/// These are fatal to a run.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite backing store error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Namespace or table name is not a plain identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Existing table does not carry the expected columns
    #[error("Schema mismatch for table {table}: {reason}")]
    SchemaMismatch { table: String, reason: String },

    /// Warehouse directory I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
