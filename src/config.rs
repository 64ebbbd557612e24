//! Service configuration: snapshot locations, column schema and policy knobs.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, ensure};
use geo::Point;
use serde::{Deserialize, Serialize};

use crate::{capability::Capability, types::DetailLevel};

/// Configuration for a `DataService`, loadable from JSON.
///
/// Every field has a default, so a config file only needs to name what differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Attribute snapshot (`.csv`, or `.parquet` with the `parquet` feature).
    pub attributes: PathBuf,

    /// One pre-simplified boundary file per detail level (`.shp`, `.geojson`).
    pub geometry: BTreeMap<DetailLevel, PathBuf>,

    /// Column names in the attribute snapshot.
    pub schema: SchemaConfig,

    /// Per-capita columns converted to totals at load time.
    pub derived: Vec<DerivedColumn>,

    /// Plausible bounds for centroids and query centers.
    pub study_area: StudyArea,

    /// Cached sources older than this are reloaded on next access; `None` disables expiry.
    pub cache_ttl_secs: Option<u64>,

    /// Upper bound accepted by proximity queries.
    pub max_radius_km: f64,

    /// Optional capabilities requested by the deployment.
    pub capabilities: BTreeSet<Capability>,

    /// Directory holding land-use rasters, needed by `Capability::LanduseOverlay`.
    pub raster_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            attributes: PathBuf::from("data/municipalities.csv"),
            geometry: BTreeMap::new(),
            schema: SchemaConfig::default(),
            derived: DerivedColumn::per_capita_defaults(),
            study_area: StudyArea::default(),
            cache_ttl_secs: Some(3600),
            max_radius_km: 200.0,
            capabilities: BTreeSet::new(),
            raster_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Load a configuration from a JSON file. Relative snapshot paths are resolved
    /// against the file's directory.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&text)
            .with_context(|| format!("[config] Failed to parse config file: {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Prefix every relative path with `base`.
    pub fn rebase(&mut self, base: &Path) {
        fn join(base: &Path, path: &mut PathBuf) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }

        join(base, &mut self.attributes);
        self.geometry.values_mut().for_each(|path| join(base, path));
        if let Some(dir) = self.raster_dir.as_mut() {
            join(base, dir);
        }
    }

    /// Sanity-check the policy knobs.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.max_radius_km.is_finite() && self.max_radius_km > 0.0,
            "[config] max_radius_km must be positive, got {}", self.max_radius_km);
        ensure!(self.study_area.min_lon < self.study_area.max_lon && self.study_area.min_lat < self.study_area.max_lat,
            "[config] study_area is empty: {:?}", self.study_area);
        ensure!(!self.geometry.contains_key(&DetailLevel::CentroidOnly),
            "[config] centroid_only needs no geometry file");
        for rule in &self.derived {
            ensure!(!rule.output.is_empty() && !rule.per_capita.is_empty(),
                "[config] derived column rules need both `per_capita` and `output`");
        }
        Ok(())
    }

    #[inline]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

/// Column names of the attribute snapshot. Any other numeric column is an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub id: String,
    pub name: String,
    pub region: String,
    pub population: String,
    pub latitude: String,
    pub longitude: String,

    /// Name of the id property inside geometry files.
    pub geometry_id: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            id: "cd_mun".into(),
            name: "nome_municipio".into(),
            region: "region".into(),
            population: "populacao_2022".into(),
            latitude: "lat".into(),
            longitude: "lon".into(),
            geometry_id: "cd_mun".into(),
        }
    }
}

impl SchemaConfig {
    /// Columns that describe identity and location rather than attributes.
    pub fn reserved(&self) -> [&str; 6] {
        [
            self.id.as_str(),
            self.name.as_str(),
            self.region.as_str(),
            self.population.as_str(),
            self.latitude.as_str(),
            self.longitude.as_str(),
        ]
    }

    #[inline]
    pub fn is_reserved(&self, column: &str) -> bool {
        self.reserved().contains(&column)
    }
}

/// `output = per_capita * population`, computed when the snapshot is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedColumn {
    pub per_capita: String,
    pub output: String,
}

impl DerivedColumn {
    pub fn new(per_capita: impl Into<String>, output: impl Into<String>) -> Self {
        Self { per_capita: per_capita.into(), output: output.into() }
    }

    /// Urban solid waste and pruning residue are published per inhabitant.
    pub fn per_capita_defaults() -> Vec<Self> {
        vec![
            Self::new("rsu_potencial_nm_habitante_ano", "rsu_potencial_nm_ano"),
            Self::new("rpo_potencial_nm_habitante_ano", "rpo_potencial_nm_ano"),
        ]
    }
}

/// Longitude/latitude bounding box of the study area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudyArea {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Default for StudyArea {
    /// São Paulo state.
    fn default() -> Self {
        Self { min_lon: -53.2, min_lat: -25.4, max_lon: -44.1, max_lat: -19.7 }
    }
}

impl StudyArea {
    /// Check whether a (lon, lat) point lies inside the box, edges included.
    pub fn contains(&self, point: Point<f64>) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.x())
            && (self.min_lat..=self.max_lat).contains(&point.y())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_source_database() {
        let config = ServiceConfig::default();
        assert_eq!(config.schema.id, "cd_mun");
        assert_eq!(config.schema.population, "populacao_2022");
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(config.derived.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_file_is_rebased_and_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{
            "attributes": "snapshot/municipios.csv",
            "geometry": {{ "low": "shp/low.geojson", "high": "/abs/high.shp" }},
            "cache_ttl_secs": null,
            "capabilities": ["landuse_overlay"]
        }}"#).unwrap();

        let config = ServiceConfig::from_json_file(&path).unwrap();
        assert_eq!(config.attributes, dir.path().join("snapshot/municipios.csv"));
        assert_eq!(config.geometry[&DetailLevel::Low], dir.path().join("shp/low.geojson"));
        assert_eq!(config.geometry[&DetailLevel::High], PathBuf::from("/abs/high.shp"));
        assert_eq!(config.cache_ttl(), None);
        assert!(config.capabilities.contains(&Capability::LanduseOverlay));
        assert_eq!(config.schema, SchemaConfig::default());
    }

    #[test]
    fn rejects_non_positive_radius_cap() {
        let config = ServiceConfig { max_radius_km: 0.0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn study_area_contains_capital() {
        let area = StudyArea::default();
        assert!(area.contains(Point::new(-46.63, -23.55)));
        assert!(!area.contains(Point::new(-43.2, -22.9))); // Rio de Janeiro
    }
}
