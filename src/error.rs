//! Error types for pool-dl
//!
//! This module provides the error taxonomy for the library:
//! - Store errors (ledger I/O), fatal for the collection being processed
//! - Data-shape errors (metadata documents missing expected fields)
//! - Filesystem errors raised while creating directories or writing payloads
//! - Cancellation, raised once a shutdown has been requested
//!
//! Transient remote failures (timeouts, non-2xx responses) are deliberately
//! absent: the API client reports them as an absent document instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pool-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pool-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// Ledger operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A metadata document did not have the expected shape
    #[error("invalid {entity} metadata: {reason}")]
    InvalidMetadata {
        /// Which kind of document failed to parse ("pool" or "post")
        entity: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Item cannot be written (deleted upstream, no payload URL, bad response)
    #[error("item {id} unavailable: {reason}")]
    ItemUnavailable {
        /// The item ID
        id: i64,
        /// Why the payload could not be fetched
        reason: String,
    },

    /// Filesystem error tied to a specific path
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path being created or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shutdown in progress - not issuing new remote calls
    #[error("shutdown in progress: not issuing new requests")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Coarse classification of an [`Error`], used when reporting a failed collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Ledger I/O
    Store,
    /// Malformed metadata document
    DataShape,
    /// Directory creation or payload write
    Filesystem,
    /// Remote transfer of a payload
    Remote,
    /// Shutdown requested
    Cancelled,
    /// Invalid configuration
    Config,
    /// Anything else
    Other,
}

impl Error {
    /// Classify this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Database(_) | Error::Sqlx(_) => ErrorClass::Store,
            Error::InvalidMetadata { .. } | Error::Serialization(_) => ErrorClass::DataShape,
            Error::Filesystem { .. } | Error::Io(_) => ErrorClass::Filesystem,
            Error::Network(_) | Error::ItemUnavailable { .. } => ErrorClass::Remote,
            Error::ShuttingDown => ErrorClass::Cancelled,
            Error::Config { .. } => ErrorClass::Config,
            Error::Other(_) => ErrorClass::Other,
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(DatabaseError::ConnectionFailed(_)) => "database_connection_failed",
            Error::Database(DatabaseError::MigrationFailed(_)) => "database_migration_failed",
            Error::Database(DatabaseError::QueryFailed(_)) => "database_query_failed",
            Error::Sqlx(_) => "database_error",
            Error::InvalidMetadata { .. } => "invalid_metadata",
            Error::ItemUnavailable { .. } => "item_unavailable",
            Error::Filesystem { .. } => "filesystem_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }

    /// Build a [`Error::Filesystem`] for `path`
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }
}
