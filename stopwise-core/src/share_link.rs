//! Shareable map-directions links for an ordered route.

use geo::Coord;

use crate::Address;

/// Base of the Google Maps directions URL used by default.
pub const DEFAULT_SHARE_LINK_BASE: &str = "https://www.google.com/maps/dir";

/// Builds directions URLs of the form `{base}/{start}/{lat,lng|lat,lng|...}`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use stopwise_core::{Address, AddressId, GeoPoint, ShareLinkBuilder};
///
/// let stop = Address {
///     id: AddressId(1),
///     raw_text: "1 Main St".into(),
///     formatted_address: "1 Main St".into(),
///     location: GeoPoint::new(51.5, -0.1),
///     comment: None,
///     order_index: 0,
/// };
/// let url = ShareLinkBuilder::default().build(Coord { x: -0.2, y: 51.4 }, &[stop]);
/// assert_eq!(url, "https://www.google.com/maps/dir/51.4,-0.2/51.5,-0.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLinkBuilder {
    base: String,
}

impl Default for ShareLinkBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SHARE_LINK_BASE)
    }
}

impl ShareLinkBuilder {
    /// Create a builder targeting `base`; a trailing slash is ignored.
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    /// Build the link for `start` followed by `addresses` in ascending
    /// `order_index`.
    ///
    /// Addresses without a resolved location are skipped; the start segment
    /// is always present.
    #[must_use]
    pub fn build(&self, start: Coord<f64>, addresses: &[Address]) -> String {
        let mut ordered: Vec<&Address> = addresses.iter().collect();
        ordered.sort_by_key(|address| address.order_index);
        let waypoints = ordered
            .iter()
            .filter_map(|address| address.location.coord())
            .map(format_waypoint)
            .collect::<Vec<_>>()
            .join("|");
        format!("{}/{}/{}", self.base, format_waypoint(start), waypoints)
    }
}

fn format_waypoint(coord: Coord<f64>) -> String {
    format!("{},{}", coord.y, coord.x)
}
