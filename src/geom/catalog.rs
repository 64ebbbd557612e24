use std::{collections::BTreeMap, sync::Arc};

use crate::{
    config::ServiceConfig,
    error::{GeoDataError, Result},
    geom::{BoundarySet, FileGeometrySource, GeometrySource},
    types::DetailLevel,
};

/// A boundary set together with how it was chosen.
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub set: Arc<BoundarySet>,
    pub requested: DetailLevel,
    pub served: DetailLevel,
    /// `served` is coarser than `requested`.
    pub substituted: bool,
}

/// Pre-simplified boundary sets, one source per detail level.
#[derive(Default)]
pub struct GeometryCatalog {
    sources: BTreeMap<DetailLevel, Box<dyn GeometrySource>>,
}

impl std::fmt::Debug for GeometryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.sources.iter().map(|(level, source)| (level, source.identity())))
            .finish()
    }
}

impl GeometryCatalog {
    pub fn new() -> Self { Self::default() }

    /// Catalog of the boundary files named in `config.geometry`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        config.geometry.iter()
            .fold(Self::new(), |catalog, (&level, path)| {
                catalog.with_source(level, FileGeometrySource::new(path, &config.schema.geometry_id))
            })
    }

    /// Register the source for `level`. `CentroidOnly` never has one.
    pub fn with_source(mut self, level: DetailLevel, source: impl GeometrySource + 'static) -> Self {
        if level.has_shapes() {
            self.sources.insert(level, Box::new(source));
        } else {
            tracing::warn!("ignoring a geometry source registered for centroid_only");
        }
        self
    }

    /// Levels that can currently be served, finest first. `CentroidOnly` is always last.
    pub fn available_levels(&self) -> Vec<DetailLevel> {
        DetailLevel::order().into_iter()
            .filter(|level| !level.has_shapes() || self.sources.get(level).is_some_and(|s| s.is_available()))
            .collect()
    }

    /// Cache key of the source behind `level`.
    pub fn identity(&self, level: DetailLevel) -> String {
        self.sources.get(&level)
            .map_or_else(|| format!("builtin:{level}"), |source| source.identity())
    }

    /// Load exactly `level`, without fallback.
    pub fn load_level(&self, level: DetailLevel) -> Result<BoundarySet> {
        if !level.has_shapes() {
            return Ok(BoundarySet::empty(level));
        }
        let source = self.sources.get(&level)
            .ok_or_else(|| GeoDataError::DataUnavailable {
                source_id: level.to_string(),
                reason: "no geometry file configured".into(),
            })?;

        let set = source.read(level)
            .map_err(|err| GeoDataError::unavailable(source.identity(), &err))?;
        tracing::info!(level = %level, source = %source.identity(), boundaries = set.len(), "loaded boundary set");
        Ok(set)
    }

    /// Load `requested`, falling back to coarser levels when it is missing.
    pub fn load(&self, requested: DetailLevel) -> CatalogLoad {
        Self::resolve(requested, |level| self.load_level(level).map(Arc::new))
    }

    /// Walk the fallback chain of `requested`, asking `fetch` for each level
    /// until one succeeds.
    pub(crate) fn resolve(
        requested: DetailLevel,
        mut fetch: impl FnMut(DetailLevel) -> Result<Arc<BoundarySet>>,
    ) -> CatalogLoad {
        for level in requested.fallback_chain() {
            match fetch(level) {
                Ok(set) => {
                    let substituted = level != requested;
                    if substituted {
                        let missing = GeoDataError::GeometryLevelMissing { requested, served: level };
                        tracing::warn!(%missing, "serving coarser boundaries");
                    }
                    return CatalogLoad { set, requested, served: level, substituted };
                }
                Err(err) => tracing::debug!(level = %level, error = %err, "boundary level unavailable"),
            }
        }

        let served = DetailLevel::CentroidOnly;
        CatalogLoad {
            set: Arc::new(BoundarySet::empty(served)),
            requested,
            served,
            substituted: requested != served,
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, MultiPolygon, Polygon};

    use crate::{geom::{Boundary, MemoryGeometrySource}, types::EntityId};

    use super::*;

    fn make_test_source(ids: &[u32]) -> MemoryGeometrySource {
        let boundaries = ids.iter()
            .map(|&id| {
                let x = id as f64;
                let ring = LineString::from(vec![(x, 0.0), (x + 1.0, 0.0), (x + 1.0, 1.0), (x, 0.0)]);
                Boundary::new(EntityId(id), MultiPolygon(vec![Polygon::new(ring, vec![])]))
            })
            .collect();
        MemoryGeometrySource::new(format!("{ids:?}"), boundaries)
    }

    #[test]
    fn serves_requested_level_when_present() {
        let catalog = GeometryCatalog::new().with_source(DetailLevel::High, make_test_source(&[1, 2]));
        let load = catalog.load(DetailLevel::High);
        assert_eq!(load.served, DetailLevel::High);
        assert!(!load.substituted);
        assert_eq!(load.set.len(), 2);
    }

    #[test]
    fn falls_back_to_coarser_level() {
        let catalog = GeometryCatalog::new().with_source(DetailLevel::Low, make_test_source(&[1]));
        let load = catalog.load(DetailLevel::High);
        assert_eq!(load.requested, DetailLevel::High);
        assert_eq!(load.served, DetailLevel::Low);
        assert!(load.substituted);
        assert_eq!(load.set.level(), DetailLevel::Low);
    }

    #[test]
    fn never_falls_back_to_finer_level() {
        let catalog = GeometryCatalog::new().with_source(DetailLevel::High, make_test_source(&[1]));
        let load = catalog.load(DetailLevel::Medium);
        assert_eq!(load.served, DetailLevel::CentroidOnly);
        assert!(load.substituted);
        assert!(load.set.is_empty());
    }

    #[test]
    fn unreadable_files_count_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            geometry: BTreeMap::from([
                (DetailLevel::Medium, dir.path().join("missing.geojson")),
                (DetailLevel::Low, dir.path().join("also_missing.shp")),
            ]),
            ..Default::default()
        };
        let catalog = GeometryCatalog::from_config(&config);
        assert_eq!(catalog.available_levels(), vec![DetailLevel::CentroidOnly]);
        assert!(matches!(catalog.load_level(DetailLevel::Low), Err(GeoDataError::DataUnavailable { .. })));

        let load = catalog.load(DetailLevel::Medium);
        assert_eq!(load.served, DetailLevel::CentroidOnly);
    }

    #[test]
    fn centroid_only_is_always_available() {
        let catalog = GeometryCatalog::new().with_source(DetailLevel::CentroidOnly, make_test_source(&[1]));
        let load = catalog.load(DetailLevel::CentroidOnly);
        assert!(!load.substituted);
        assert!(load.set.is_empty());
        assert_eq!(catalog.identity(DetailLevel::CentroidOnly), "builtin:centroid_only");
    }
}
