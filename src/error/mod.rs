//! # Error Module
//!
//! User-friendly error types for the scan history store.
//!
//! ## Design Principles
//! - **Never panic** on persisted data - return errors instead
//! - **Include context** - keys, paths, what went wrong
//! - **Recovery hints** - suggest how to fix when possible

use std::path::PathBuf;
use thiserror::Error;

/// Top-level library error
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No scan with id {id}. Run `list` to see stored scans.")]
    NotFound { id: String },
}

/// Errors raised by a persistence backend
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to open history database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("The {backend} storage lock was poisoned by an earlier panic. Restart the application.")]
    Poisoned { backend: &'static str },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors converting the history to or from its persisted form
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Failed to encode scan history: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Stored scan history is malformed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, HistoryError>;
