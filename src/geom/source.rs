use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::{
    common, io,
    geom::{Boundary, BoundarySet},
    types::DetailLevel,
};

/// Read-only access to one pre-simplified boundary file.
pub trait GeometrySource: Send + Sync {
    /// Stable identity of the backing snapshot, used as a cache key.
    fn identity(&self) -> String;

    /// Whether the snapshot can be read at all, checked before falling back.
    fn is_available(&self) -> bool;

    fn read(&self, level: DetailLevel) -> Result<BoundarySet>;
}

/// Boundary file on disk: `.shp` or `.geojson`/`.json`.
#[derive(Debug, Clone)]
pub struct FileGeometrySource {
    path: PathBuf,
    id_field: String,
}

impl FileGeometrySource {
    pub fn new(path: impl Into<PathBuf>, id_field: impl Into<String>) -> Self {
        Self { path: path.into(), id_field: id_field.into() }
    }
}

impl GeometrySource for FileGeometrySource {
    fn identity(&self) -> String { self.path.display().to_string() }

    fn is_available(&self) -> bool { self.path.is_file() }

    fn read(&self, level: DetailLevel) -> Result<BoundarySet> {
        common::require_file_exists(&self.path)?;
        let records = match common::extension(&self.path).as_deref() {
            Some("shp") => io::shp::read_shapefile(&self.path)?,
            Some("geojson" | "json") => io::geojson::read_geojson(&self.path)?,
            other => bail!("[geom::source] Unsupported boundary format {:?}: {}", other, self.path.display()),
        };
        Ok(BoundarySet::from_records(level, records, &self.id_field))
    }
}

/// Boundaries held in memory.
#[derive(Debug, Clone)]
pub struct MemoryGeometrySource {
    name: String,
    boundaries: Vec<Boundary>,
}

impl MemoryGeometrySource {
    pub fn new(name: impl Into<String>, boundaries: Vec<Boundary>) -> Self {
        Self { name: name.into(), boundaries }
    }
}

impl GeometrySource for MemoryGeometrySource {
    fn identity(&self) -> String { format!("mem:{}", self.name) }

    fn is_available(&self) -> bool { true }

    fn read(&self, level: DetailLevel) -> Result<BoundarySet> {
        Ok(BoundarySet::new(level, self.boundaries.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use crate::types::EntityId;

    use super::*;

    const FEATURES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"cd_mun": 1, "nome_municipio": "A"},
         "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}
    ]}"#;

    #[test]
    fn reads_geojson_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("municipios_high_detail.geojson");
        std::fs::write(&path, FEATURES).unwrap();

        let source = FileGeometrySource::new(&path, "cd_mun");
        assert!(source.is_available());
        let set = source.read(DetailLevel::High).unwrap();
        assert_eq!(set.level(), DetailLevel::High);
        assert!(set.get(EntityId(1)).is_some());
    }

    #[test]
    fn missing_or_unknown_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileGeometrySource::new(dir.path().join("low.shp"), "cd_mun");
        assert!(!missing.is_available());
        assert!(missing.read(DetailLevel::Low).is_err());

        let kml = dir.path().join("low.kml");
        std::fs::write(&kml, "<kml/>").unwrap();
        assert!(FileGeometrySource::new(&kml, "cd_mun").read(DetailLevel::Low).is_err());
    }
}
