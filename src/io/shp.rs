//! Shapefile reading operations.

use std::path::Path;

use anyhow::{Context, Result};
use shapefile::{Reader, Shape};

use crate::{common, common::FieldValue, io::GeometryRecord};

/// Reads all areal shapes + attribute records from a given `.shp` file path.
/// Null and non-polygon shapes are skipped.
pub(crate) fn read_shapefile(path: &Path) -> Result<Vec<GeometryRecord>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    let mut skipped = 0usize;
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("[io::shp] Error reading shape+record")?;
        let Some(geometry) = common::shape_to_multipolygon(&shape) else {
            if !matches!(shape, Shape::NullShape) {
                tracing::debug!(shape = ?shape.shapetype(), "skipping non-areal shape");
            }
            skipped += 1;
            continue;
        };

        let properties = record.into_iter()
            .map(|(field, value)| (field, FieldValue::from(&value)))
            .collect();
        items.push(GeometryRecord { properties, geometry, feature_id: None });
    }

    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "shapefile contained shapes without area");
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use shapefile::dbase::{FieldName, TableWriterBuilder};

    use super::*;

    #[test]
    fn reads_polygons_with_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("municipios_low_detail.shp");

        let table = TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("CD_MUN").unwrap(), 7)
            .add_character_field(FieldName::try_from("NM_MUN").unwrap(), 40);
        let mut writer = shapefile::Writer::from_path(&path, table).unwrap();

        let ring = vec![
            shapefile::Point { x: -46.8, y: -23.7 },
            shapefile::Point { x: -46.8, y: -23.4 },
            shapefile::Point { x: -46.4, y: -23.4 },
            shapefile::Point { x: -46.4, y: -23.7 },
            shapefile::Point { x: -46.8, y: -23.7 },
        ];
        let polygon = shapefile::Polygon::new(shapefile::PolygonRing::Outer(ring));
        let mut record = shapefile::dbase::Record::default();
        record.insert("CD_MUN".to_string(), shapefile::dbase::FieldValue::Character(Some("3550308".into())));
        record.insert("NM_MUN".to_string(), shapefile::dbase::FieldValue::Character(Some("Sao Paulo".into())));
        writer.write_shape_and_record(&polygon, &record).unwrap();
        drop(writer);

        let records = read_shapefile(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].properties["CD_MUN"].as_entity_id(), Some(crate::EntityId(3550308)));
        assert_eq!(records[0].geometry.0.len(), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_shapefile(Path::new("/nonexistent/low.shp")).is_err());
    }
}
