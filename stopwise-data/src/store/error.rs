use camino::Utf8PathBuf;
use rusqlite::Error as SqliteError;
use stopwise_core::StoreError;
use thiserror::Error;

/// Errors raised by [`super::SqliteAddressListStore`].
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory {path:?}")]
    CreateDirectory {
        /// Path of the directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating or migrating the schema failed.
    #[error("failed to initialise address list schema")]
    Schema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// An identifier could not be represented as an SQLite integer.
    #[error("identifier {id} exceeds SQLite i64 range")]
    IdOutOfRange {
        /// Identifier that failed the conversion.
        id: u64,
    },
    /// A stored integer could not be represented in the domain type.
    #[error("stored {column} value {value} is out of range")]
    CorruptValue {
        /// Column holding the value.
        column: &'static str,
        /// Raw stored value.
        value: i64,
    },
    /// The blocking worker running the query was cancelled or panicked.
    #[error("SQLite worker task failed")]
    Worker {
        /// Join failure reported by Tokio.
        #[source]
        source: tokio::task::JoinError,
    },
    /// Generic SQLite error while reading or writing rows.
    #[error(transparent)]
    Database(#[from] SqliteError),
}

/// Outcome of a store operation: either a domain-level rejection the caller
/// must see as-is, or a backend failure.
#[derive(Debug)]
pub(super) enum Failure {
    Domain(StoreError),
    Backend(SqliteStoreError),
}

impl From<StoreError> for Failure {
    fn from(error: StoreError) -> Self {
        Self::Domain(error)
    }
}

impl From<SqliteStoreError> for Failure {
    fn from(error: SqliteStoreError) -> Self {
        Self::Backend(error)
    }
}

impl From<SqliteError> for Failure {
    fn from(error: SqliteError) -> Self {
        Self::Backend(SqliteStoreError::Database(error))
    }
}

impl From<Failure> for StoreError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Domain(error) => error,
            Failure::Backend(error) => StoreError::backend(error),
        }
    }
}
