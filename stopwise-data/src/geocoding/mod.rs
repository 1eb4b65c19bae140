//! HTTP geocoding against the Google Geocoding API.
//!
//! [`HttpGeocoder`] implements [`stopwise_core::Geocoder`] with one request
//! per address. Timeouts, HTTP failures and non-`OK` provider statuses are
//! reported as [`stopwise_core::GeocodeError`]; an address that matches
//! nothing resolves to an unmatched result instead.

mod google;
mod provider;

pub use provider::{
    DEFAULT_GEOCODE_URL, DEFAULT_USER_AGENT, HttpGeocoder, HttpGeocoderConfig, ProviderBuildError,
};
