//! Google Geocoding API response types.
//!
//! Only the fields the geocoder consumes are modelled; everything else in the
//! payload is ignored.
//!
//! See: <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use serde::Deserialize;

/// Status reported when the request succeeded and returned candidates.
pub const STATUS_OK: &str = "OK";

/// Status reported when the request succeeded but nothing matched.
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Geocoding API response.
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    /// Status code from the API.
    ///
    /// Common values:
    /// - `"OK"` - At least one candidate was returned
    /// - `"ZERO_RESULTS"` - The address was valid but matched nothing
    /// - `"OVER_QUERY_LIMIT"` - The key is over quota
    /// - `"REQUEST_DENIED"` - The key is missing or invalid
    /// - `"INVALID_REQUEST"` - The address parameter was missing
    pub status: String,

    /// Candidates, best match first.
    #[serde(default)]
    pub results: Vec<Candidate>,

    /// Optional explanation when `status` is not `"OK"`.
    pub error_message: Option<String>,
}

impl Candidate {
    /// Representative point, if the candidate carried one.
    #[must_use]
    pub fn location(&self) -> Option<LatLng> {
        self.geometry.as_ref().map(|geometry| geometry.location)
    }
}

impl GeocodeResponse {
    /// The best-ranked candidate, if any.
    #[must_use]
    pub fn best(&self) -> Option<&Candidate> {
        self.results.first()
    }
}

/// A single geocoding candidate.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    /// Canonical address text; Google occasionally omits it.
    pub formatted_address: Option<String>,
    /// Geometry block holding the representative point, if present.
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// Geometry of a candidate.
#[derive(Debug, Deserialize)]
pub struct Geometry {
    /// Representative point for the match.
    pub location: LatLng,
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}
