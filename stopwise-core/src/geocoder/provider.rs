//! Geocoder trait and the result shape it produces.

use async_trait::async_trait;

use crate::GeoPoint;

use super::error::GeocodeError;

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    /// Canonical address text; the input text when nothing matched.
    pub formatted_address: String,
    /// Best-match position; unresolved when nothing matched.
    pub location: GeoPoint,
}

impl GeocodeResult {
    /// Result for a lookup that found no candidate.
    ///
    /// # Examples
    /// ```
    /// use stopwise_core::{GeoPoint, GeocodeResult};
    ///
    /// let result = GeocodeResult::unmatched("Nowhere Lane");
    /// assert_eq!(result.formatted_address, "Nowhere Lane");
    /// assert_eq!(result.location, GeoPoint::UNRESOLVED);
    /// ```
    pub fn unmatched(address: impl Into<String>) -> Self {
        Self {
            formatted_address: address.into(),
            location: GeoPoint::UNRESOLVED,
        }
    }
}

/// Resolve one address via an external provider.
///
/// Each call issues at most one provider request. Implementations must be
/// `Send + Sync` so a batch can be resolved concurrently.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use stopwise_core::{GeoPoint, GeocodeError, GeocodeResult, Geocoder};
///
/// struct NullIsland;
///
/// #[async_trait]
/// impl Geocoder for NullIsland {
///     async fn resolve(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
///         Ok(GeocodeResult {
///             formatted_address: address.to_owned(),
///             location: GeoPoint::new(0.0, 0.0),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `address` to its best match.
    ///
    /// Returns [`GeocodeResult::unmatched`] when the provider found nothing and
    /// an error when the provider could not answer.
    async fn resolve(&self, address: &str) -> Result<GeocodeResult, GeocodeError>;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for std::sync::Arc<G> {
    async fn resolve(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        (**self).resolve(address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubGeocoder;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[tokio::test]
    async fn stub_distinguishes_no_match_from_failure() {
        let geocoder = StubGeocoder::default()
            .with_match("Town Hall", "Town Hall, Springfield", GeoPoint::new(1.0, 2.0))
            .with_failure(
                "Broken Rd",
                GeocodeError::NetworkError {
                    url: "http://geocoder.test".into(),
                    message: "connection refused".into(),
                },
            );

        let hit = geocoder.resolve("Town Hall").await.expect("match");
        assert_eq!(hit.formatted_address, "Town Hall, Springfield");
        assert_eq!(hit.location, GeoPoint::new(1.0, 2.0));

        let miss = geocoder.resolve("Elsewhere").await.expect("no match is not an error");
        assert_eq!(miss, GeocodeResult::unmatched("Elsewhere"));

        let err = geocoder.resolve("Broken Rd").await.expect_err("failure");
        assert!(matches!(err, GeocodeError::NetworkError { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn shared_geocoder_delegates() {
        let geocoder = Arc::new(StubGeocoder::default());
        let result = geocoder.resolve("Anywhere").await.expect("no match");
        assert_eq!(result.location, GeoPoint::UNRESOLVED);
        assert_eq!(geocoder.calls(), 1);
    }
}
