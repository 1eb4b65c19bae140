//! Property-based tests for distances, sequencing and re-ranking.
//!
//! # Invariants tested
//!
//! - **Permutation:** the sequencer emits every input id exactly once.
//! - **Unresolved last:** no unresolved stop precedes a resolved one.
//! - **Distance sanity:** haversine distance is symmetric, zero on the
//!   diagonal, and bounded by half the Earth's circumference.
//! - **Dense ranks:** applying a computed route always yields a dense ordering.
//! - **Idempotence:** re-planning from the same start yields the same order.

use std::collections::HashSet;
use std::f64::consts::PI;

use proptest::prelude::*;
use stopwise_core::{
    Address, AddressId, EARTH_RADIUS_KM, GeoPoint, RouteComputation, Stop, distance_km, sequence,
};

fn point_strategy() -> impl Strategy<Value = GeoPoint> {
    (-90.0_f64..=90.0, -180.0_f64..=180.0)
        .prop_map(|(latitude, longitude)| GeoPoint::new(latitude, longitude))
}

fn maybe_point_strategy() -> impl Strategy<Value = GeoPoint> {
    prop_oneof![
        4 => point_strategy(),
        1 => Just(GeoPoint::UNRESOLVED),
        1 => (-90.0_f64..=90.0).prop_map(|latitude| GeoPoint {
            latitude: Some(latitude),
            longitude: None,
        }),
    ]
}

fn addresses_strategy() -> impl Strategy<Value = Vec<Address>> {
    proptest::collection::vec(maybe_point_strategy(), 0..24).prop_map(|locations| {
        (1_u64..)
            .zip(0_u32..)
            .zip(locations)
            .map(|((id, order_index), location)| Address {
                id: AddressId(id),
                raw_text: format!("stop {id}"),
                formatted_address: format!("stop {id}"),
                location,
                comment: None,
                order_index,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn sequence_is_a_permutation(
        start in point_strategy(),
        locations in proptest::collection::vec(maybe_point_strategy(), 0..32),
    ) {
        let stops: Vec<Stop<usize>> = locations
            .iter()
            .enumerate()
            .map(|(id, location)| Stop { id, location: *location })
            .collect();
        let order = sequence(start, &stops);
        prop_assert_eq!(order.len(), stops.len());
        let unique: HashSet<usize> = order.iter().copied().collect();
        prop_assert_eq!(unique.len(), stops.len());
    }

    #[test]
    fn unresolved_stops_follow_resolved_ones(
        start in point_strategy(),
        locations in proptest::collection::vec(maybe_point_strategy(), 0..32),
    ) {
        let stops: Vec<Stop<usize>> = locations
            .iter()
            .enumerate()
            .map(|(id, location)| Stop { id, location: *location })
            .collect();
        let resolved: Vec<bool> = sequence(start, &stops)
            .into_iter()
            .map(|id| locations[id].is_resolved())
            .collect();
        let first_unresolved = resolved.iter().position(|flag| !flag);
        if let Some(position) = first_unresolved {
            prop_assert!(resolved[position..].iter().all(|flag| !flag));
        }
    }

    #[test]
    fn distance_is_symmetric_and_bounded(a in point_strategy(), b in point_strategy()) {
        let forward = distance_km(a, b);
        let backward = distance_km(b, a);
        prop_assert!((forward - backward).abs() < 1e-6);
        prop_assert!(forward >= 0.0);
        prop_assert!(forward <= PI * EARTH_RADIUS_KM + 1e-6);
        prop_assert!(distance_km(a, a).abs() < 1e-9);
    }

    #[test]
    fn applied_route_is_densely_ranked(
        start in point_strategy(),
        addresses in addresses_strategy(),
    ) {
        let route = RouteComputation::plan(start, &addresses);
        let reordered = route.apply(&addresses);
        prop_assert_eq!(reordered.len(), addresses.len());
        let mut ranks: Vec<u32> = reordered.iter().map(|address| address.order_index).collect();
        ranks.sort_unstable();
        let expected: Vec<u32> = (0_u32..).take(addresses.len()).collect();
        prop_assert_eq!(ranks, expected);
    }

    #[test]
    fn replanning_is_idempotent(
        start in point_strategy(),
        addresses in addresses_strategy(),
    ) {
        let first = RouteComputation::plan(start, &addresses);
        let reordered = first.apply(&addresses);
        let second = RouteComputation::plan(start, &reordered);
        prop_assert_eq!(first.order, second.order);
    }
}
