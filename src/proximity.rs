//! Catchment queries: which municipalities lie within a radius of a point.

use std::sync::Arc;

use geo::Point;
use serde::Serialize;

use crate::{
    classify::{SummaryStats, summarize},
    common::{haversine_km, is_valid_lon_lat},
    config::{ServiceConfig, StudyArea},
    error::{GeoDataError, Result},
    store::AttributeTable,
    types::EntityId,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProximityHit {
    pub id: EntityId,
    pub distance_km: f64,
}

/// Entities within `radius_km` of `center`, nearest first, ties by id.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityResult {
    pub center: Point<f64>,
    pub radius_km: f64,
    pub hits: Vec<ProximityHit>,
}

/// Totals of one attribute over a catchment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatchmentSummary {
    pub attribute: String,
    pub entities: usize,
    /// Sum of the non-null values.
    pub total: f64,
    pub stats: Option<SummaryStats>,
}

impl ProximityResult {
    #[inline] pub fn len(&self) -> usize { self.hits.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.hits.is_empty() }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.hits.iter().map(|hit| hit.id)
    }

    /// Aggregate `attribute` over the hits.
    pub fn summarize(&self, table: &AttributeTable, attribute: &str) -> Result<CatchmentSummary> {
        if !table.has_values(attribute) {
            return Err(GeoDataError::UnknownAttribute(attribute.to_string()));
        }
        let values: Vec<Option<f64>> = self.ids()
            .filter_map(|id| table.index_of(id))
            .map(|row| table.value(row, attribute))
            .collect();

        Ok(CatchmentSummary {
            attribute: attribute.to_string(),
            entities: values.len(),
            total: values.iter().flatten().sum(),
            stats: summarize(values),
        })
    }
}

/// Answers radius queries against one attribute table.
#[derive(Debug, Clone)]
pub struct ProximityAnalyzer {
    table: Arc<AttributeTable>,
    max_radius_km: f64,
    study_area: StudyArea,
}

impl ProximityAnalyzer {
    pub fn new(table: Arc<AttributeTable>) -> Self {
        let defaults = ServiceConfig::default();
        Self { table, max_radius_km: defaults.max_radius_km, study_area: defaults.study_area }
    }

    /// Use the radius limit and study area of `config`.
    pub fn with_config(mut self, config: &ServiceConfig) -> Self {
        self.max_radius_km = config.max_radius_km;
        self.study_area = config.study_area;
        self
    }

    #[inline] pub fn table(&self) -> &AttributeTable { &self.table }

    /// Entities whose centroid lies within `radius_km` of `center` (lon, lat).
    ///
    /// The radius must be finite, positive and at most the configured maximum.
    /// Centers outside the study area are accepted but logged.
    pub fn query(&self, center: Point<f64>, radius_km: f64) -> Result<ProximityResult> {
        if !radius_km.is_finite() || radius_km <= 0.0 || radius_km > self.max_radius_km {
            return Err(GeoDataError::InvalidRadius(radius_km));
        }
        if !is_valid_lon_lat(center) {
            return Err(GeoDataError::InvalidCoordinates { lat: center.y(), lon: center.x() });
        }
        if !self.study_area.contains(center) {
            tracing::warn!(lat = center.y(), lon = center.x(), "proximity center outside the study area");
        }

        let hits = within_radius(&self.table, center, radius_km);
        tracing::debug!(radius_km, hits = hits.len(), "proximity query");
        Ok(ProximityResult { center, radius_km, hits })
    }
}

/// Unvalidated radius scan; a zero radius matches only centroids equal to `center`.
/// Entities without a centroid never match.
pub fn within_radius(table: &AttributeTable, center: Point<f64>, radius_km: f64) -> Vec<ProximityHit> {
    let mut hits: Vec<ProximityHit> = table.entities().iter()
        .filter_map(|entity| {
            let distance_km = haversine_km(center, entity.centroid?);
            (distance_km <= radius_km).then_some(ProximityHit { id: entity.id, distance_km })
        })
        .collect();
    hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km).then(a.id.cmp(&b.id)));
    hits
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::{common::lat_lon, config::SchemaConfig, store::Entity};

    use super::*;

    fn make_test_table() -> Arc<AttributeTable> {
        let entities = vec![
            Entity::new(3550308, "São Paulo").with_centroid(-23.5505, -46.6333),
            Entity::new(3509502, "Campinas").with_centroid(-22.9056, -47.0608),
            Entity::new(3548500, "Santos").with_centroid(-23.9608, -46.3336),
            Entity::new(3552205, "Sorocaba").with_centroid(-23.5015, -47.4526),
            Entity::new(3500000, "Sem centroide"),
        ];
        let columns = BTreeMap::from([(
            "biogas_total".to_string(),
            vec![Some(100.0), Some(50.0), None, Some(25.0), Some(1.0)],
        )]);
        Arc::new(AttributeTable::from_entities(SchemaConfig::default(), entities, columns).unwrap())
    }

    #[test]
    fn finds_neighbours_sorted_by_distance() {
        let analyzer = ProximityAnalyzer::new(make_test_table());
        let result = analyzer.query(lat_lon(-23.5505, -46.6333), 90.0).unwrap();
        let ids: Vec<_> = result.ids().collect();
        // Santos ~55 km, Sorocaba ~84 km, Campinas ~84 km
        assert_eq!(ids[0], EntityId(3550308));
        assert_eq!(result.hits[0].distance_km, 0.0);
        assert_eq!(ids.len(), 4);
        assert!(result.hits.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
        assert!(result.hits.iter().all(|hit| hit.distance_km <= 90.0));
    }

    #[test]
    fn radius_is_inclusive() {
        let table = make_test_table();
        let center = lat_lon(-23.5505, -46.6333);
        let campinas = haversine_km(center, lat_lon(-22.9056, -47.0608));
        let hits = within_radius(&table, center, campinas);
        assert!(hits.iter().any(|hit| hit.id == EntityId(3509502)));
    }

    #[test]
    fn zero_radius_matches_exact_centroids() {
        let table = make_test_table();
        let hits = within_radius(&table, lat_lon(-22.9056, -47.0608), 0.0);
        assert_eq!(hits, vec![ProximityHit { id: EntityId(3509502), distance_km: 0.0 }]);
        assert!(within_radius(&table, lat_lon(-22.9, -47.0), 0.0).is_empty());
    }

    #[test]
    fn rejects_invalid_radius_and_coordinates() {
        let analyzer = ProximityAnalyzer::new(make_test_table());
        let center = lat_lon(-23.0, -47.0);
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY, 250.0] {
            assert!(matches!(analyzer.query(center, radius), Err(GeoDataError::InvalidRadius(_))));
        }
        assert!(matches!(
            analyzer.query(lat_lon(95.0, -47.0), 10.0),
            Err(GeoDataError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn centers_outside_study_area_are_accepted() {
        let analyzer = ProximityAnalyzer::new(make_test_table());
        let rio = lat_lon(-22.9068, -43.1729);
        assert!(analyzer.query(rio, 10.0).unwrap().is_empty());
    }

    #[test]
    fn summarizes_catchment_potential() {
        let table = make_test_table();
        let analyzer = ProximityAnalyzer::new(table.clone());
        let result = analyzer.query(lat_lon(-23.5505, -46.6333), 60.0).unwrap();
        let summary = result.summarize(&table, "biogas_total").unwrap();
        assert_eq!(summary.entities, 2); // São Paulo and Santos
        assert_eq!(summary.total, 100.0);
        assert_eq!(summary.stats.unwrap().count, 1);
        assert!(result.summarize(&table, "nope").is_err());
    }
}
