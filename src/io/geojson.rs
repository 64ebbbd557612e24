//! GeoJSON reading and writing operations.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Value, json};

use crate::{common::{self, FieldValue}, io::GeometryRecord};

/// Reads Polygon/MultiPolygon features from a GeoJSON FeatureCollection file.
pub(crate) fn read_geojson(path: &Path) -> Result<Vec<GeometryRecord>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("[io::geojson] Failed to read GeoJSON file: {}", path.display()))?;
    read_geojson_bytes(&bytes)
        .with_context(|| format!("[io::geojson] Failed to parse GeoJSON from {:?}", path))
}

/// Read boundary records from GeoJSON bytes.
pub(crate) fn read_geojson_bytes(bytes: &[u8]) -> Result<Vec<GeometryRecord>> {
    let value: Value = serde_json::from_slice(bytes).context("[io::geojson] Invalid JSON")?;
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("[io::geojson] Expected a FeatureCollection with a `features` array"))?;

    let mut records = Vec::with_capacity(features.len());
    for feature in features {
        let geometry = match parse_geometry(&feature["geometry"])? {
            Some(geometry) => geometry,
            None => continue,
        };

        let properties = feature["properties"].as_object()
            .map(|props| props.iter()
                .map(|(key, value)| (key.clone(), FieldValue::from(value)))
                .collect())
            .unwrap_or_default();

        let feature_id = feature.get("id").map(FieldValue::from);
        records.push(GeometryRecord { properties, geometry, feature_id });
    }
    Ok(records)
}

/// Parse a GeoJSON geometry object. Non-areal geometries yield `None`.
fn parse_geometry(geometry: &Value) -> Result<Option<MultiPolygon<f64>>> {
    let coords = geometry["coordinates"].as_array();
    match (geometry["type"].as_str(), coords) {
        (Some("Polygon"), Some(rings)) => Ok(Some(MultiPolygon(vec![parse_polygon_coords(rings)?]))),
        (Some("MultiPolygon"), Some(polygons)) => Ok(Some(MultiPolygon(
            polygons.iter()
                .map(|polygon| polygon.as_array()
                    .ok_or_else(|| anyhow!("[io::geojson] Invalid MultiPolygon member"))
                    .and_then(|rings| parse_polygon_coords(rings)))
                .collect::<Result<Vec<_>>>()?,
        ))),
        (Some("Polygon" | "MultiPolygon"), None) => bail!("[io::geojson] Geometry is missing `coordinates`"),
        _ => Ok(None),
    }
}

/// Parse polygon rings: `[exterior, hole, hole, ...]`.
fn parse_polygon_coords(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array()
            .ok_or_else(|| anyhow!("[io::geojson] Invalid ring"))
            .and_then(|ring| parse_ring_coords(ring))
    });

    let exterior = rings.next()
        .ok_or_else(|| anyhow!("[io::geojson] Invalid Polygon: missing exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Parse a ring (exterior or interior) from GeoJSON coordinates.
/// Format: [[x, y], [x, y], ...]
fn parse_ring_coords(coords: &[Value]) -> Result<LineString<f64>> {
    let mut points = coords.iter()
        .map(|pair| {
            let x = pair[0].as_f64().ok_or_else(|| anyhow!("[io::geojson] Invalid coordinate: x must be a number"))?;
            let y = pair[1].as_f64().ok_or_else(|| anyhow!("[io::geojson] Invalid coordinate: y must be a number"))?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>>>()?;

    common::ensure_closed(&mut points);
    Ok(LineString(points))
}

/// Convert a MultiPolygon to a GeoJSON geometry object.
pub(crate) fn multipolygon_to_json(mp: &MultiPolygon<f64>) -> Value {
    let ring = |ls: &LineString<f64>| ls.coords().map(|c| json!([c.x, c.y])).collect::<Vec<_>>();
    let polygons: Vec<Value> = mp.0.iter()
        .map(|polygon| {
            let mut rings = vec![ring(polygon.exterior())];
            rings.extend(polygon.interiors().iter().map(ring));
            json!(rings)
        })
        .collect();

    json!({ "type": "MultiPolygon", "coordinates": polygons })
}

/// Build a GeoJSON feature from an optional geometry and a property map.
pub(crate) fn feature(geometry: Option<Value>, properties: BTreeMap<String, Value>) -> Value {
    json!({
        "type": "Feature",
        "geometry": geometry.unwrap_or(Value::Null),
        "properties": properties,
    })
}
