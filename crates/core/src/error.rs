//! Error types shared across the Tabulon crates.

use thiserror::Error;

/// Result type alias for Tabulon operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for store, hook, and persistence failures.
///
/// No variant is fatal: hook and persistence failures are absorbed into the
/// store's error-hook channel, never surfaced to the mutating caller.
#[derive(Debug, Error)]
pub enum Error {
    /// An external storage collaborator rejected a read or write.
    #[error("storage backend failure: {message}")]
    Backend { message: String },

    /// A hook callback failed.
    #[error("hook failure: {message}")]
    Hook { message: String },

    /// A persistence policy named an id field the row does not carry.
    #[error("no resolvable id field for table {table}")]
    MissingIdField { table: String },
}

impl Error {
    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }

    /// Creates a hook error.
    pub fn hook(message: impl Into<String>) -> Self {
        Error::Hook {
            message: message.into(),
        }
    }

    /// Creates a missing-id-field error.
    pub fn missing_id_field(table: impl Into<String>) -> Self {
        Error::MissingIdField {
            table: table.into(),
        }
    }
}
