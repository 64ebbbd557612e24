use std::{collections::BTreeMap, sync::Arc};

use geo::{MultiPolygon, Point};
use serde_json::{Value, json};

use crate::{
    common::FieldValue,
    config::SchemaConfig,
    io::geojson,
    types::{DetailLevel, EntityId},
};

/// One entity of a layer, with its boundary when the served level has one.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRow {
    pub id: EntityId,
    pub name: Arc<str>,
    pub region: Option<Arc<str>>,
    pub population: Option<i64>,
    pub centroid: Option<Point<f64>>,
    /// Value of the layer's attribute column.
    pub value: Option<f64>,
    pub geometry: Option<Arc<MultiPolygon<f64>>>,
    /// Boundary-file fields that survived the merge.
    pub properties: BTreeMap<String, FieldValue>,
}

impl LayerRow {
    #[inline] pub fn has_geometry(&self) -> bool { self.geometry.is_some() }
}

/// Entities joined with the boundaries of one detail level.
///
/// Built fresh for every request and owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerView {
    pub requested: DetailLevel,
    pub served: DetailLevel,
    pub substituted: bool,
    pub attribute: String,
    /// Output field names, attribute fields first.
    pub fields: Vec<String>,
    pub rows: Vec<LayerRow>,
    /// At least one row carries a boundary.
    pub geometry_available: bool,
    /// Boundary-file fields dropped because the attribute table has them too.
    pub resolved_collisions: Vec<String>,
    /// Boundaries with no matching entity.
    pub orphan_boundaries: usize,
    pub(crate) schema: SchemaConfig,
}

impl LayerView {
    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn row(&self, id: EntityId) -> Option<&LayerRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Number of rows backed by a boundary.
    pub fn geometry_rows(&self) -> usize {
        self.rows.iter().filter(|row| row.has_geometry()).count()
    }

    /// The attribute column as classifier input.
    pub fn values(&self) -> Vec<(EntityId, Option<f64>)> {
        self.rows.iter().map(|row| (row.id, row.value)).collect()
    }

    /// Render as a GeoJSON FeatureCollection. Rows without a boundary become
    /// Point features at their centroid, or null-geometry features without one.
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self.rows.iter()
            .map(|row| {
                let geometry = match (&row.geometry, row.centroid) {
                    (Some(shape), _) => Some(geojson::multipolygon_to_json(shape)),
                    (None, Some(point)) => Some(json!({ "type": "Point", "coordinates": [point.x(), point.y()] })),
                    (None, None) => None,
                };

                let schema = &self.schema;
                let mut properties = BTreeMap::from([
                    (schema.id.clone(), json!(row.id.get())),
                    (schema.name.clone(), json!(&*row.name)),
                    (schema.region.clone(), json!(row.region.as_deref())),
                    (schema.population.clone(), json!(row.population)),
                    (schema.latitude.clone(), json!(row.centroid.map(|p| p.y()))),
                    (schema.longitude.clone(), json!(row.centroid.map(|p| p.x()))),
                ]);
                properties.insert(self.attribute.clone(), json!(row.value));
                for (name, value) in &row.properties {
                    properties.entry(name.clone()).or_insert_with(|| value.to_json());
                }

                let mut feature = geojson::feature(geometry, properties);
                feature["id"] = json!(row.id.get());
                feature
            })
            .collect();

        json!({ "type": "FeatureCollection", "features": features })
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Polygon};

    use super::*;

    fn make_test_view() -> LayerView {
        let square = MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        )]);
        let row = |id: u32, geometry: Option<MultiPolygon<f64>>| LayerRow {
            id: EntityId(id),
            name: Arc::from(format!("M{id}")),
            region: None,
            population: Some(100 * id as i64),
            centroid: Some(Point::new(-47.0, -23.0)),
            value: Some(id as f64),
            geometry: geometry.map(Arc::new),
            properties: BTreeMap::from([("area_km2".to_string(), FieldValue::Number(12.5))]),
        };
        LayerView {
            requested: DetailLevel::Low,
            served: DetailLevel::Low,
            substituted: false,
            attribute: "biogas_total".into(),
            fields: vec![],
            rows: vec![row(1, Some(square)), row(2, None)],
            geometry_available: true,
            resolved_collisions: vec![],
            orphan_boundaries: 0,
            schema: SchemaConfig::default(),
        }
    }

    #[test]
    fn geojson_features_carry_fields() {
        let json = make_test_view().to_geojson();
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);

        assert_eq!(features[0]["geometry"]["type"], "MultiPolygon");
        assert_eq!(features[0]["properties"]["cd_mun"], 1);
        assert_eq!(features[0]["properties"]["biogas_total"], 1.0);
        assert_eq!(features[0]["properties"]["area_km2"], 12.5);
        assert_eq!(features[0]["id"], 1);

        assert_eq!(features[1]["geometry"]["type"], "Point");
        assert_eq!(features[1]["geometry"]["coordinates"][1], -23.0);
    }

    #[test]
    fn row_accessors() {
        let view = make_test_view();
        assert_eq!(view.geometry_rows(), 1);
        assert_eq!(view.values(), vec![(EntityId(1), Some(1.0)), (EntityId(2), Some(2.0))]);
        assert!(view.row(EntityId(2)).is_some_and(|row| !row.has_geometry()));
    }
}
