use thiserror::Error;

use crate::{AddressId, ListId};

/// Errors raised by [`crate::store::AddressListStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No list with this id belongs to the requesting owner.
    #[error("address list {list_id} not found")]
    NotFound {
        /// Identifier that failed to resolve.
        list_id: ListId,
    },
    /// The list changed since it was read.
    #[error("address list {list_id} is at version {found}, expected {expected}")]
    VersionConflict {
        /// List being written.
        list_id: ListId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        found: u64,
    },
    /// A write referenced an address the list does not own.
    #[error("address {address_id} does not belong to list {list_id}")]
    UnknownAddress {
        /// List being written.
        list_id: ListId,
        /// Offending address identifier.
        address_id: AddressId,
    },
    /// The storage backend failed.
    #[error("storage backend failed: {source}")]
    Backend {
        /// Backend-specific cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Wrap a backend-specific error.
    pub fn backend(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend {
            source: source.into(),
        }
    }
}
