//! Core domain types for the Stopwise route planner.
//!
//! An owner submits a batch of free-text addresses; each is geocoded and the
//! batch is stored as an [`AddressList`]. The list can later be reordered
//! nearest-first from any start point, which persists the new ranks and
//! yields a shareable directions link.
//!
//! Providers and stores are traits so the service can run against the HTTP
//! geocoder and SQLite store in `stopwise-data` or against the in-memory
//! doubles in [`test_support`].

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod address;
mod geo_point;
pub mod geocoder;
mod sequencer;
pub mod service;
mod share_link;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use address::{
    Address, AddressId, AddressList, AddressUpdate, ListId, NewAddress, NewAddressList, OwnerId,
    Recipient,
};
pub use geo_point::{
    EARTH_RADIUS_KM, GeoPoint, UNRESOLVED_DISTANCE_KM, distance_km, haversine_km,
};
pub use geocoder::{GeocodeError, GeocodeResult, Geocoder};
pub use sequencer::{RouteComputation, Stop, route_distance_km, sequence};
pub use service::{
    AddressListService, CreateAddressList, ErrorKind, OptimizedRoute, ServiceConfig,
    ServiceError, ValidationError,
};
pub use share_link::{DEFAULT_SHARE_LINK_BASE, ShareLinkBuilder};
pub use store::{AddressListStore, StoreError};
