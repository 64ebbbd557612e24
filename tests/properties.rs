//! Property tests for radius queries and classification.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use cp2b_geodata::{
    AttributeTable, ClassMethod, Entity, SchemaConfig, classify, classify_values, haversine_km, lat_lon,
    within_radius,
};

fn make_table(points: &[(f64, f64)]) -> AttributeTable {
    let entities = points.iter().enumerate()
        .map(|(i, &(lat, lon))| Entity::new(i as u32 + 1, "m").with_centroid(lat, lon))
        .collect();
    AttributeTable::from_entities(SchemaConfig::default(), entities, BTreeMap::new()).unwrap()
}

fn methods() -> impl Strategy<Value = ClassMethod> {
    prop_oneof![
        Just(ClassMethod::EqualInterval),
        Just(ClassMethod::Quantile),
        Just(ClassMethod::StdDev),
        Just(ClassMethod::NaturalBreaks),
    ]
}

proptest! {
    /// Property: every hit is within the radius, hits are sorted and unique,
    /// and nothing within the radius is missed.
    #[test]
    fn prop_radius_hits_are_exact(
        points in prop::collection::vec((-25.0f64..-20.0, -53.0f64..-44.0), 0..40),
        center in (-25.0f64..-20.0, -53.0f64..-44.0),
        radius in 0.0f64..300.0,
    ) {
        let table = make_table(&points);
        let center = lat_lon(center.0, center.1);
        let hits = within_radius(&table, center, radius);

        prop_assert!(hits.iter().all(|hit| hit.distance_km <= radius));
        let sorted = hits.windows(2).all(|w| {
            w[0].distance_km < w[1].distance_km || (w[0].distance_km == w[1].distance_km && w[0].id < w[1].id)
        });
        prop_assert!(sorted);

        let ids: BTreeSet<_> = hits.iter().map(|hit| hit.id).collect();
        prop_assert_eq!(ids.len(), hits.len());

        let expected = table.entities().iter()
            .filter(|e| e.centroid.is_some_and(|c| haversine_km(center, c) <= radius))
            .count();
        prop_assert_eq!(hits.len(), expected);
    }

    /// Property: breaks ascend strictly, span exactly [min, max] and put every
    /// value in one class.
    #[test]
    fn prop_breaks_cover_the_range(
        values in prop::collection::vec(0.0f64..1.0e6, 2..80),
        method in methods(),
        k in 2usize..8,
    ) {
        let breaks = classify_values(&values, method, k).unwrap();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let b = breaks.breaks();
        prop_assert_eq!(b[0], min);
        prop_assert_eq!(b[b.len() - 1], max);
        if min < max {
            let ascending = b.windows(2).all(|w| w[0] < w[1]);
            prop_assert!(ascending);
        }
        prop_assert!(breaks.num_classes() <= k);
        let covered = values.iter().all(|&v| breaks.class_of(v).is_some());
        prop_assert!(covered);
    }

    /// Property: class counts add up to the non-null values.
    #[test]
    fn prop_counts_partition_values(
        values in prop::collection::vec(prop::option::of(0.0f64..1000.0), 0..60),
        method in methods(),
    ) {
        let column: Vec<_> = values.iter().enumerate()
            .map(|(i, v)| (cp2b_geodata::EntityId(i as u32), *v))
            .collect();
        let result = classify(&column, method, 5).unwrap();

        let present = values.iter().flatten().count();
        prop_assert_eq!(result.counts.iter().sum::<usize>(), present);
        prop_assert_eq!(result.null_ids.len(), values.len() - present);
    }
}
