//! Greedy nearest-neighbour ordering of stops.
//!
//! [`sequence`] walks from a start point, repeatedly stepping to the closest
//! stop not yet visited. It is a heuristic: there is no backtracking and no
//! improvement pass, and it runs in `O(n²)` distance evaluations, which suits
//! a day's worth of stops rather than thousands.

use crate::{Address, AddressId, GeoPoint, distance_km, haversine_km};

/// A stop offered to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stop<Id> {
    /// Caller-defined identifier echoed back in the output.
    pub id: Id,
    /// Where the stop is, possibly unresolved.
    pub location: GeoPoint,
}

impl From<&Address> for Stop<AddressId> {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            location: address.location,
        }
    }
}

/// Order `stops` by repeatedly visiting the nearest remaining one.
///
/// The output is a permutation of the input ids. Ties go to the stop that
/// appears first in `stops`. Unresolved stops are still emitted, after every
/// resolved stop, and never move the walking position.
///
/// # Examples
/// ```
/// use stopwise_core::{GeoPoint, Stop, sequence};
///
/// let stops = [
///     Stop { id: "P1", location: GeoPoint::new(0.0, 1.0) },
///     Stop { id: "P2", location: GeoPoint::new(0.0, 5.0) },
///     Stop { id: "P3", location: GeoPoint::new(0.0, 2.0) },
/// ];
/// assert_eq!(sequence(GeoPoint::new(0.0, 0.0), &stops), vec!["P1", "P3", "P2"]);
/// ```
#[must_use]
pub fn sequence<Id: Copy>(start: GeoPoint, stops: &[Stop<Id>]) -> Vec<Id> {
    let mut remaining: Vec<&Stop<Id>> = stops.iter().collect();
    let mut ordered = Vec::with_capacity(stops.len());
    let mut current = start;

    while let Some(position) = nearest(current, &remaining) {
        let next = remaining.remove(position);
        ordered.push(next.id);
        if next.location.is_resolved() {
            current = next.location;
        }
    }
    ordered
}

/// Index of the first stop at minimum distance from `current`.
fn nearest<Id>(current: GeoPoint, remaining: &[&Stop<Id>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (position, stop) in remaining.iter().enumerate() {
        let distance = distance_km(current, stop.location);
        // Strict comparison keeps the earliest stop on ties.
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((position, distance));
        }
    }
    best.map(|(position, _)| position)
}

/// Great-circle length of walking from `start` through `stops` in order.
///
/// Unresolved stops contribute nothing and do not move the walking position;
/// an unresolved `start` begins the walk at the first resolved stop.
///
/// # Examples
/// ```
/// use stopwise_core::{GeoPoint, route_distance_km};
///
/// let km = route_distance_km(
///     GeoPoint::new(0.0, 0.0),
///     [GeoPoint::new(0.0, 1.0), GeoPoint::UNRESOLVED, GeoPoint::new(0.0, 2.0)],
/// );
/// assert!((km - 222.39).abs() < 0.01);
/// ```
#[must_use]
pub fn route_distance_km(start: GeoPoint, stops: impl IntoIterator<Item = GeoPoint>) -> f64 {
    let mut current = start.coord();
    let mut total = 0.0;
    for coord in stops.into_iter().filter_map(|stop| stop.coord()) {
        if let Some(previous) = current {
            total += haversine_km(previous, coord);
        }
        current = Some(coord);
    }
    total
}

/// Outcome of one sequencing run.
///
/// Ephemeral: its only durable effect is the rewritten `order_index` of the
/// list's addresses.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteComputation {
    /// Start point the walk began from.
    pub start: GeoPoint,
    /// Address identifiers in visiting order.
    pub order: Vec<AddressId>,
}

impl RouteComputation {
    /// Sequence `addresses` from `start`.
    ///
    /// Addresses are offered to the sequencer in identifier order, i.e. the
    /// order they were submitted in, so ties resolve the same way no matter
    /// how the list is currently ordered.
    #[must_use]
    pub fn plan(start: GeoPoint, addresses: &[Address]) -> Self {
        let mut stops: Vec<Stop<AddressId>> = addresses.iter().map(Stop::from).collect();
        stops.sort_by_key(|stop| stop.id);
        Self {
            start,
            order: sequence(start, &stops),
        }
    }

    /// Copy `addresses` with `order_index` rewritten to match this route.
    ///
    /// Addresses missing from the computed order keep their position after the
    /// ordered ones, so the result is always densely ranked.
    #[must_use]
    pub fn apply(&self, addresses: &[Address]) -> Vec<Address> {
        let mut reordered: Vec<Address> = Vec::with_capacity(addresses.len());
        for id in &self.order {
            if let Some(address) = addresses.iter().find(|address| address.id == *id) {
                reordered.push(address.clone());
            }
        }
        for address in addresses {
            if !self.order.contains(&address.id) {
                reordered.push(address.clone());
            }
        }
        for (rank, address) in (0_u32..).zip(reordered.iter_mut()) {
            address.order_index = rank;
        }
        reordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stop(id: &'static str, latitude: f64, longitude: f64) -> Stop<&'static str> {
        Stop {
            id,
            location: GeoPoint::new(latitude, longitude),
        }
    }

    fn unresolved(id: &'static str) -> Stop<&'static str> {
        Stop {
            id,
            location: GeoPoint::UNRESOLVED,
        }
    }

    #[rstest]
    fn visits_nearest_successively() {
        let stops = [stop("P1", 0.0, 1.0), stop("P2", 0.0, 5.0), stop("P3", 0.0, 2.0)];
        assert_eq!(
            sequence(GeoPoint::new(0.0, 0.0), &stops),
            vec!["P1", "P3", "P2"]
        );
    }

    #[rstest]
    fn unresolved_stop_comes_last() {
        let stops = [unresolved("P2"), stop("P1", 0.0, 1.0)];
        assert_eq!(sequence(GeoPoint::new(0.0, 0.0), &stops), vec!["P1", "P2"]);
    }

    #[rstest]
    fn unresolved_stop_waits_for_resolved_ones() {
        let stops = [
            stop("P1", 0.0, 1.0),
            unresolved("U"),
            stop("FAR", 0.0, 9.0),
            stop("NEAR", 0.0, 3.0),
        ];
        assert_eq!(
            sequence(GeoPoint::new(0.0, 0.0), &stops),
            vec!["P1", "NEAR", "FAR", "U"]
        );
    }

    #[rstest]
    fn ties_keep_input_order() {
        let stops = [stop("EAST", 0.0, 1.0), stop("WEST", 0.0, -1.0)];
        assert_eq!(
            sequence(GeoPoint::new(0.0, 0.0), &stops),
            vec!["EAST", "WEST"]
        );
        let swapped = [stop("WEST", 0.0, -1.0), stop("EAST", 0.0, 1.0)];
        assert_eq!(
            sequence(GeoPoint::new(0.0, 0.0), &swapped),
            vec!["WEST", "EAST"]
        );
    }

    #[rstest]
    fn all_unresolved_keeps_input_order() {
        let stops = [unresolved("A"), unresolved("B"), unresolved("C")];
        assert_eq!(
            sequence(GeoPoint::new(0.0, 0.0), &stops),
            vec!["A", "B", "C"]
        );
    }

    #[rstest]
    fn empty_input_yields_empty_order() {
        let stops: [Stop<&str>; 0] = [];
        assert!(sequence(GeoPoint::new(0.0, 0.0), &stops).is_empty());
    }

    #[rstest]
    fn route_distance_skips_unresolved_start() {
        let km = route_distance_km(
            GeoPoint::UNRESOLVED,
            [GeoPoint::new(0.0, 1.0), GeoPoint::new(0.0, 2.0)],
        );
        assert!((km - 111.195).abs() < 0.001, "got {km}");
    }

    fn address(id: u64, order_index: u32, location: GeoPoint) -> Address {
        Address {
            id: AddressId(id),
            raw_text: format!("stop {id}"),
            formatted_address: format!("stop {id}"),
            location,
            comment: None,
            order_index,
        }
    }

    #[rstest]
    fn plan_uses_submission_order_for_ties() {
        // Current ordering puts 2 first, but ids break the tie.
        let addresses = vec![
            address(2, 0, GeoPoint::new(0.0, -1.0)),
            address(1, 1, GeoPoint::new(0.0, 1.0)),
        ];
        let route = RouteComputation::plan(GeoPoint::new(0.0, 0.0), &addresses);
        assert_eq!(route.order, vec![AddressId(1), AddressId(2)]);
    }

    #[rstest]
    fn apply_rewrites_order_index_densely() {
        let addresses = vec![
            address(1, 0, GeoPoint::new(0.0, 5.0)),
            address(2, 1, GeoPoint::new(0.0, 1.0)),
            address(3, 2, GeoPoint::UNRESOLVED),
        ];
        let route = RouteComputation::plan(GeoPoint::new(0.0, 0.0), &addresses);
        let reordered = route.apply(&addresses);
        let ranks: Vec<(u64, u32)> = reordered
            .iter()
            .map(|address| (address.id.0, address.order_index))
            .collect();
        assert_eq!(ranks, vec![(2, 0), (1, 1), (3, 2)]);
    }
}
