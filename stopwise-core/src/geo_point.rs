//! Geographic coordinates that may be unresolved, and the distance between
//! them.
//!
//! A [`GeoPoint`] with a missing latitude or longitude represents a failed or
//! pending geocode. Such points are never coerced to `(0, 0)`; instead
//! [`distance_km`] reports [`UNRESOLVED_DISTANCE_KM`] for them so nearest-first
//! comparisons always rank them last.

use geo::Coord;

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance reported when either endpoint is unresolved.
///
/// Larger than any great-circle distance on Earth, and finite, so it compares
/// cleanly and never poisons sums or orderings with NaN.
pub const UNRESOLVED_DISTANCE_KM: f64 = f64::MAX / 2.0;

/// A WGS84 position whose components may be absent.
///
/// # Examples
/// ```
/// use stopwise_core::GeoPoint;
///
/// let resolved = GeoPoint::new(51.5, -0.1);
/// assert!(resolved.is_resolved());
/// assert!(!GeoPoint::UNRESOLVED.is_resolved());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    /// Latitude in degrees, if known.
    pub latitude: Option<f64>,
    /// Longitude in degrees, if known.
    pub longitude: Option<f64>,
}

impl GeoPoint {
    /// A point with neither component known.
    pub const UNRESOLVED: Self = Self {
        latitude: None,
        longitude: None,
    };

    /// Construct a fully resolved point.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Return the point as a `geo` coordinate (`x = longitude`, `y = latitude`).
    ///
    /// Yields `None` unless both components are present and finite.
    #[must_use]
    pub fn coord(&self) -> Option<Coord<f64>> {
        match (self.latitude, self.longitude) {
            (Some(y), Some(x)) if y.is_finite() && x.is_finite() => Some(Coord { x, y }),
            _ => None,
        }
    }

    /// Whether both components are present and finite.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.coord().is_some()
    }

    /// Whether the point is resolved and lies within the WGS84 ranges.
    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        self.coord().is_some_and(|coord| {
            (-90.0..=90.0).contains(&coord.y) && (-180.0..=180.0).contains(&coord.x)
        })
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(coord: Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

/// Great-circle distance between two points in kilometres.
///
/// Returns [`UNRESOLVED_DISTANCE_KM`] when either point is unresolved.
///
/// # Examples
/// ```
/// use stopwise_core::{GeoPoint, UNRESOLVED_DISTANCE_KM, distance_km};
///
/// let london = GeoPoint::new(51.5074, -0.1278);
/// let paris = GeoPoint::new(48.8566, 2.3522);
/// let km = distance_km(london, paris);
/// assert!((km - 343.5).abs() < 1.0);
/// assert_eq!(distance_km(london, GeoPoint::UNRESOLVED), UNRESOLVED_DISTANCE_KM);
/// ```
#[must_use]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    match (a.coord(), b.coord()) {
        (Some(from), Some(to)) => haversine_km(from, to),
        _ => UNRESOLVED_DISTANCE_KM,
    }
}

/// Haversine distance between two resolved coordinates in kilometres.
#[must_use]
pub fn haversine_km(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let lat_from = from.y.to_radians();
    let lat_to = to.y.to_radians();
    let delta_lat = (to.y - from.y).to_radians();
    let delta_lng = (to.x - from.x).to_radians();

    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + lat_from.cos() * lat_to.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push the term fractionally past 1 for antipodal points.
    let half_chord = half_chord.clamp(0.0, 1.0);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());
    EARTH_RADIUS_KM * angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(GeoPoint::UNRESOLVED)]
    #[case(GeoPoint { latitude: Some(1.0), longitude: None })]
    #[case(GeoPoint { latitude: None, longitude: Some(1.0) })]
    #[case(GeoPoint::new(f64::NAN, 1.0))]
    #[case(GeoPoint::new(1.0, f64::INFINITY))]
    fn unresolved_points_use_sentinel(#[case] point: GeoPoint) {
        let origin = GeoPoint::new(0.0, 0.0);
        assert_eq!(distance_km(origin, point), UNRESOLVED_DISTANCE_KM);
        assert_eq!(distance_km(point, origin), UNRESOLVED_DISTANCE_KM);
        assert!(!point.is_resolved());
    }

    #[rstest]
    fn sentinel_exceeds_any_real_distance() {
        let north = GeoPoint::new(90.0, 0.0);
        let south = GeoPoint::new(-90.0, 0.0);
        let longest = distance_km(north, south);
        assert!((longest - 20_015.086).abs() < 0.01, "got {longest}");
        assert!(UNRESOLVED_DISTANCE_KM > longest);
        assert!(UNRESOLVED_DISTANCE_KM.is_finite());
    }

    #[rstest]
    fn one_degree_of_longitude_at_the_equator() {
        let km = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((km - 111.195).abs() < 0.001, "got {km}");
    }

    #[rstest]
    fn identical_points_are_zero_apart() {
        let point = GeoPoint::new(-33.8688, 151.2093);
        assert_eq!(distance_km(point, point), 0.0);
    }

    #[rstest]
    fn antipodal_points_stay_finite() {
        let km = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        assert!(km.is_finite());
        assert!((km - 20_015.086).abs() < 0.01, "got {km}");
    }

    #[rstest]
    #[case(GeoPoint::new(90.0, 180.0), true)]
    #[case(GeoPoint::new(-90.0, -180.0), true)]
    #[case(GeoPoint::new(90.5, 0.0), false)]
    #[case(GeoPoint::new(0.0, -180.5), false)]
    #[case(GeoPoint::UNRESOLVED, false)]
    fn bounds_check(#[case] point: GeoPoint, #[case] expected: bool) {
        assert_eq!(point.is_within_bounds(), expected);
    }

    #[rstest]
    fn converts_from_geo_coord() {
        let point = GeoPoint::from(Coord { x: 2.35, y: 48.85 });
        assert_eq!(point, GeoPoint::new(48.85, 2.35));
    }
}
