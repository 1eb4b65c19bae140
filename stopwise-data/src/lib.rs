//! Adapters connecting Stopwise to the outside world.
//!
//! Responsibilities:
//! - Resolve addresses over HTTP via the Google Geocoding API.
//! - Persist address lists to SQLite.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `stopwise-core`).
//! - Keep blocking I/O off async executors; SQLite work runs on the blocking
//!   pool.
//!
//! Invariants:
//! - API keys never appear in logs, errors or `Debug` output.
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod geocoding;
pub mod store;

pub use geocoding::{HttpGeocoder, HttpGeocoderConfig, ProviderBuildError};
pub use store::{SqliteAddressListStore, SqliteStoreError};
