//! IO module for format-specific snapshot readers.
//!
//! Each format module turns one on-disk representation into plain data:
//! attribute snapshots become Polars DataFrames, boundary files become
//! `GeometryRecord`s. Nothing here knows about caching or detail levels.
//!
//! # Format Modules
//!
//! - `csv` - CSV attribute snapshots
//! - `parquet` - Parquet attribute snapshots (requires `parquet` feature)
//! - `shp` - Shapefile boundaries with their dBase attribute records
//! - `geojson` - GeoJSON FeatureCollection boundaries

pub(crate) mod csv;
pub(crate) mod geojson;
pub(crate) mod shp;

#[cfg(feature = "parquet")]
pub(crate) mod parquet;

use std::collections::BTreeMap;

use geo::MultiPolygon;

use crate::common::FieldValue;

/// One boundary as read from disk, before its id is resolved.
#[derive(Debug, Clone)]
pub(crate) struct GeometryRecord {
    pub(crate) properties: BTreeMap<String, FieldValue>,
    pub(crate) geometry: MultiPolygon<f64>,
    /// Feature-level id, for formats that carry one outside the properties.
    pub(crate) feature_id: Option<FieldValue>,
}
