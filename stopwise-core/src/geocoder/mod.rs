//! Resolve free-text addresses to coordinates.
//!
//! The [`Geocoder`] trait abstracts the external geocoding provider. A lookup
//! that finds no candidate is not an error: it yields a [`GeocodeResult`]
//! echoing the input text with an unresolved location. Transport and provider
//! failures surface as [`GeocodeError`] and are never papered over with a
//! substitute coordinate.

mod error;
mod provider;

pub use error::GeocodeError;
pub use provider::{GeocodeResult, Geocoder};
