//! Error types for bloodbank.
//!
//! The analysis and selection core never fails; these errors come from the
//! surrounding layers (storage, configuration, user input, delivery).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for bloodbank operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored row could not be decoded.
    #[error("corrupt {table} row {id}: {message}")]
    CorruptRow {
        /// Table the row came from.
        table: &'static str,
        /// Row id.
        id: i64,
        /// What could not be decoded.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Input Errors ===
    /// A blood group tag supplied by a user could not be parsed.
    #[error("invalid blood group '{tag}' (expected one of A+, A-, B+, B-, AB+, AB-, O+, O-)")]
    InvalidBloodGroup {
        /// The offending tag.
        tag: String,
    },

    /// A stored record was not found.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Record kind ("alert", "donor").
        kind: &'static str,
        /// Requested id.
        id: i64,
    },

    // === Delivery Errors ===
    /// An alert sink failed to deliver.
    #[error("alert delivery via '{sink}' failed: {message}")]
    Delivery {
        /// Name of the sink.
        sink: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for bloodbank operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid blood group error.
    #[must_use]
    pub fn invalid_blood_group(tag: impl Into<String>) -> Self {
        Self::InvalidBloodGroup { tag: tag.into() }
    }

    /// Create a not-found error for an alert id.
    #[must_use]
    pub fn alert_not_found(id: i64) -> Self {
        Self::NotFound { kind: "alert", id }
    }

    /// Create a not-found error for a donor id.
    #[must_use]
    pub fn donor_not_found(id: i64) -> Self {
        Self::NotFound { kind: "donor", id }
    }

    /// Create a delivery error.
    #[must_use]
    pub fn delivery(sink: &'static str, message: impl Into<String>) -> Self {
        Self::Delivery {
            sink,
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a missing-record error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
