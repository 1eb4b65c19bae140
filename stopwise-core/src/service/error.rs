use std::fmt;

use thiserror::Error;

use crate::{AddressId, GeocodeError, ListId, StoreError};

/// Malformed input rejected before it can touch stored data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A list must contain at least one address.
    #[error("at least one address is required")]
    NoAddresses,
    /// An address was empty after trimming.
    #[error("address at position {position} is blank")]
    BlankAddress {
        /// Zero-based position in the submitted batch.
        position: usize,
    },
    /// The list label was empty after trimming.
    #[error("list label must not be blank")]
    BlankLabel,
    /// An update named an address the list does not own.
    #[error("address {address_id} is not part of this list")]
    UnknownAddress {
        /// Offending identifier.
        address_id: AddressId,
    },
    /// The same address was updated twice in one request.
    #[error("address {address_id} appears more than once in the update")]
    DuplicateUpdate {
        /// Repeated identifier.
        address_id: AddressId,
    },
    /// An update tried to blank out an address's display text.
    #[error("formatted address for {address_id} must not be blank")]
    BlankFormattedAddress {
        /// Address being edited.
        address_id: AddressId,
    },
    /// Only some addresses were given a new rank.
    #[error("order indices must cover all {expected} addresses, got {supplied}")]
    PartialOrdering {
        /// Number of updates carrying an index.
        supplied: usize,
        /// Number of addresses in the list.
        expected: usize,
    },
    /// The supplied ranks were not a permutation of `0..n`.
    #[error("order indices must be a permutation of 0..{expected}")]
    InvalidOrdering {
        /// Number of addresses in the list.
        expected: usize,
    },
    /// A recipient did not look like an email address.
    #[error("{value:?} is not a valid email address")]
    InvalidRecipient {
        /// Rejected input.
        value: String,
    },
    /// The route start point was missing a component.
    #[error("start point must have both latitude and longitude")]
    StartUnresolved,
    /// The route start point lay outside WGS84 ranges.
    #[error("start point ({latitude}, {longitude}) is out of range")]
    StartOutOfRange {
        /// Supplied latitude.
        latitude: f64,
        /// Supplied longitude.
        longitude: f64,
    },
}

/// Broad category of a [`ServiceError`], suitable for mapping to a
/// transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The list does not exist or belongs to someone else.
    NotFound,
    /// The geocoding provider failed for at least one address.
    GeocodingFailure,
    /// The request was malformed.
    ValidationFailure,
    /// The list changed concurrently; reload and retry.
    Conflict,
    /// The persistence backend failed.
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not_found",
            Self::GeocodingFailure => "geocoding_failure",
            Self::ValidationFailure => "validation_failure",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Errors returned by [`crate::AddressListService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The list does not exist for this owner.
    #[error("address list {list_id} not found")]
    NotFound {
        /// Identifier that failed to resolve.
        list_id: ListId,
    },
    /// Geocoding an address failed; nothing was persisted.
    #[error("geocoding failed: {0}")]
    Geocoding(#[from] GeocodeError),
    /// The request was rejected before any write.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    /// Another writer changed the list first.
    #[error("address list {list_id} was modified concurrently; reload and retry")]
    Conflict {
        /// List that changed.
        list_id: ListId,
    },
    /// The persistence backend failed.
    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl ServiceError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Geocoding(_) => ErrorKind::GeocodingFailure,
            Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { list_id } => Self::NotFound { list_id },
            StoreError::VersionConflict { list_id, .. } => Self::Conflict { list_id },
            StoreError::UnknownAddress { address_id, .. } => {
                Self::Validation(ValidationError::UnknownAddress { address_id })
            }
            backend @ StoreError::Backend { .. } => Self::Storage(backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StoreError::NotFound { list_id: ListId(1) }, ErrorKind::NotFound)]
    #[case(
        StoreError::VersionConflict { list_id: ListId(1), expected: 0, found: 1 },
        ErrorKind::Conflict
    )]
    #[case(
        StoreError::UnknownAddress { list_id: ListId(1), address_id: AddressId(4) },
        ErrorKind::ValidationFailure
    )]
    #[case(StoreError::backend("disk full"), ErrorKind::Storage)]
    fn store_errors_map_to_kinds(#[case] error: StoreError, #[case] kind: ErrorKind) {
        assert_eq!(ServiceError::from(error).kind(), kind);
    }

    #[rstest]
    fn messages_are_human_readable() {
        let error = ServiceError::NotFound { list_id: ListId(12) };
        assert_eq!(error.to_string(), "address list 12 not found");
        assert_eq!(error.kind().to_string(), "not_found");

        let error = ServiceError::from(ValidationError::NoAddresses);
        assert_eq!(
            error.to_string(),
            "invalid request: at least one address is required"
        );
    }
}
