//! Facade crate for the Stopwise route planner.
//!
//! This crate re-exports the core domain types and exposes the HTTP geocoder
//! and SQLite store behind feature flags.

#![forbid(unsafe_code)]

pub use stopwise_core::{
    Address, AddressId, AddressList, AddressListService, AddressListStore, AddressUpdate,
    CreateAddressList, DEFAULT_SHARE_LINK_BASE, ErrorKind, GeoPoint, GeocodeError,
    GeocodeResult, Geocoder, ListId, OptimizedRoute, OwnerId, Recipient, ServiceConfig,
    ServiceError, ShareLinkBuilder, StoreError, ValidationError, haversine_km, sequence,
};

#[cfg(feature = "test-support")]
pub use stopwise_core::test_support;

#[cfg(feature = "http")]
pub use stopwise_data::{HttpGeocoder, HttpGeocoderConfig, ProviderBuildError};

#[cfg(feature = "store-sqlite")]
pub use stopwise_data::{SqliteAddressListStore, SqliteStoreError};
