//! Error types for the patient registry.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the single [`Error`] enum defined here.

use std::path::PathBuf;
use thiserror::Error;

use crate::patient::PatientId;

/// The main error type for patient registry operations.
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

    /// The database schema is unreadable or from a newer release.
    #[error("database schema error: {message}")]
    DatabaseSchema {
        /// Description of what went wrong.
        message: String,
    },

    /// A slot write was larger than the configured quota.
    #[error("storage quota exceeded for slot '{key}': {size} bytes (limit {quota})")]
    QuotaExceeded {
        /// The slot being written.
        key: String,
        /// Size of the rejected value in bytes.
        size: usize,
        /// The configured limit in bytes.
        quota: usize,
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

    // === Record Errors ===
    /// A required patient field was empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the field, as serialized.
        field: &'static str,
    },

    /// No patient exists with the given id.
    #[error("patient not found: {id}")]
    PatientNotFound {
        /// The id that was looked up.
        id: PatientId,
    },

    // === I/O Errors ===
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

/// A specialized Result type for patient registry operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a missing-field error.
    #[must_use]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create a not-found error for a patient id.
    #[must_use]
    pub fn patient_not_found(id: PatientId) -> Self {
        Self::PatientNotFound { id }
    }

    /// Check if this error means input was refused by the presence check.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }

    /// Check if this error refers to an unknown patient.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PatientNotFound { .. })
    }

    /// Check if this error is a storage quota rejection.
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}
