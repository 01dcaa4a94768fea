//! Error types for contactbook.
//!
//! This module defines all error types used throughout the contactbook crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::Page;

/// The main error type for contactbook operations.
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

    // === Session Errors ===
    /// The supplied credentials did not match.
    #[error("invalid credentials")]
    AuthenticationFailed,

    /// The action requires a logged-in session.
    #[error("not logged in")]
    NotAuthenticated,

    /// The action is not available from the current page.
    #[error("cannot {action} from the {page} page")]
    InvalidTransition {
        /// Page the session was on.
        page: Page,
        /// The rejected action.
        action: &'static str,
    },

    /// A submitted contact form failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// No contact with the given id exists.
    #[error("no contact with id {0}")]
    ContactNotFound(i64),

    // === Transfer Errors ===
    /// The file format could not be determined or is not supported.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The import file's header row is missing a required column.
    #[error("import header is missing required column '{column}'")]
    ImportHeader {
        /// The missing column name.
        column: String,
    },

    /// A cell in the import file could not be converted.
    #[error("import row {row}, column '{column}': {message}")]
    ImportCell {
        /// 1-based spreadsheet row number (the header is row 1).
        row: usize,
        /// Column name from the header row.
        column: String,
        /// Description of the problem.
        message: String,
    },

    /// Reading or writing CSV failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing an XLSX workbook failed.
    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Reading a spreadsheet failed.
    #[error("spreadsheet read error: {0}")]
    Spreadsheet(#[from] calamine::Error),

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

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for contactbook operations.
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

    /// Create a form validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create an import cell error.
    #[must_use]
    pub fn import_cell(row: usize, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImportCell {
            row,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a rejected login.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }

    /// Check if this error came from reading an import file.
    #[must_use]
    pub fn is_import_error(&self) -> bool {
        matches!(
            self,
            Self::ImportHeader { .. }
                | Self::ImportCell { .. }
                | Self::Csv(_)
                | Self::Spreadsheet(_)
                | Self::UnsupportedFormat(_)
        )
    }
}
