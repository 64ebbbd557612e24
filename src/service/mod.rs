//! The data service: cached attribute and boundary sources, joined on demand.

mod layer;
mod merge;

use std::{
    collections::BTreeMap,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use ahash::AHashMap;

use crate::{
    capability::Capabilities,
    config::ServiceConfig,
    error::{GeoDataError, Result},
    geom::{BoundarySet, CatalogLoad, GeometryCatalog},
    proximity::ProximityAnalyzer,
    store::{AttributeStore, AttributeTable, EntityFilter},
    types::DetailLevel,
};

pub use layer::{LayerRow, LayerView};
pub use merge::FieldMerge;

/// A cached value and when it was loaded.
#[derive(Debug)]
struct Cached<T> {
    value: T,
    loaded_at: Instant,
}

impl<T> Cached<T> {
    fn new(value: T) -> Self { Self { value, loaded_at: Instant::now() } }

    fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        ttl.is_none_or(|ttl| self.loaded_at.elapsed() < ttl)
    }
}

/// Outcome of reading one boundary level.
#[derive(Debug)]
enum LevelState {
    Loaded(Arc<BoundarySet>),
    /// The source was missing or unreadable, with the reason.
    Missing(String),
}

impl LevelState {
    fn to_result(&self, source_id: &str) -> Result<Arc<BoundarySet>> {
        match self {
            LevelState::Loaded(set) => Ok(set.clone()),
            LevelState::Missing(reason) => Err(GeoDataError::DataUnavailable {
                source_id: source_id.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

/// How many times each kind of source has been read from its backing store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadCounts {
    pub attributes: u64,
    pub geometry: u64,
}

/// Cached sources and their ages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStatus {
    pub attributes: Option<Duration>,
    pub geometry: BTreeMap<DetailLevel, Duration>,
    pub ttl: Option<Duration>,
}

/// Entry point for map layers, proximity queries and capability checks.
///
/// The attribute table and every boundary level are loaded lazily, once, and
/// shared by all callers until `invalidate` or the cache TTL drops them. Joined
/// layers are never cached. A boundary level that could not be read is
/// remembered as missing for as long as a loaded one would be kept. An empty
/// attribute table is not cached, so a snapshot that appears later is picked
/// up on the next request.
#[derive(Debug)]
pub struct DataService {
    config: ServiceConfig,
    attributes: AttributeStore,
    catalog: GeometryCatalog,
    capabilities: Capabilities,
    attribute_cache: RwLock<Option<Cached<Arc<AttributeTable>>>>,
    geometry_cache: RwLock<AHashMap<(String, DetailLevel), Cached<LevelState>>>,
    attribute_loads: AtomicU64,
    geometry_loads: AtomicU64,
}

impl DataService {
    /// Service over the snapshot files named in `config`.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let attributes = AttributeStore::from_config(&config);
        let catalog = GeometryCatalog::from_config(&config);
        Self::with_sources(config, attributes, catalog)
    }

    /// Service over explicit sources.
    pub fn with_sources(config: ServiceConfig, attributes: AttributeStore, catalog: GeometryCatalog) -> Result<Self> {
        config.validate().map_err(|err| GeoDataError::Config(format!("{err:#}")))?;
        let capabilities = Capabilities::detect(&config);
        Ok(Self {
            config,
            attributes,
            catalog,
            capabilities,
            attribute_cache: RwLock::new(None),
            geometry_cache: RwLock::new(AHashMap::new()),
            attribute_loads: AtomicU64::new(0),
            geometry_loads: AtomicU64::new(0),
        })
    }

    #[inline] pub fn config(&self) -> &ServiceConfig { &self.config }

    #[inline] pub fn catalog(&self) -> &GeometryCatalog { &self.catalog }

    #[inline] pub fn capabilities(&self) -> &Capabilities { &self.capabilities }

    /// Whether an optional capability (e.g. `"landuse_overlay"`) is enabled.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.has_named(name)
    }

    /// The attribute table, loading it on first use.
    /// An unavailable snapshot yields an empty table.
    pub fn attribute_table(&self) -> Arc<AttributeTable> {
        let ttl = self.config.cache_ttl();
        if let Some(cached) = self.attribute_cache.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            if cached.is_fresh(ttl) {
                tracing::debug!("attribute cache hit");
                return cached.value.clone();
            }
        }

        let mut cache = self.attribute_cache.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref().filter(|cached| cached.is_fresh(ttl)) {
            return cached.value.clone();
        }

        self.attribute_loads.fetch_add(1, Ordering::Relaxed);
        let table = Arc::new(self.attributes.load());
        *cache = (!table.is_empty()).then(|| Cached::new(table.clone()));
        table
    }

    /// The boundaries for `level`, falling back to coarser levels.
    pub fn geometry(&self, level: DetailLevel) -> CatalogLoad {
        GeometryCatalog::resolve(level, |level| self.boundary_set(level))
    }

    /// Exactly one cached boundary level.
    fn boundary_set(&self, level: DetailLevel) -> Result<Arc<BoundarySet>> {
        let ttl = self.config.cache_ttl();
        let key = (self.catalog.identity(level), level);
        if let Some(cached) = self.geometry_cache.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            if cached.is_fresh(ttl) {
                tracing::debug!(level = %level, "geometry cache hit");
                return cached.value.to_result(&key.0);
            }
        }

        let mut cache = self.geometry_cache.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(&key).filter(|cached| cached.is_fresh(ttl)) {
            return cached.value.to_result(&key.0);
        }

        if level.has_shapes() {
            self.geometry_loads.fetch_add(1, Ordering::Relaxed);
        }
        let (state, result) = match self.catalog.load_level(level) {
            Ok(set) => {
                let set = Arc::new(set);
                (LevelState::Loaded(set.clone()), Ok(set))
            }
            Err(err) => (LevelState::Missing(err.to_string()), Err(err)),
        };
        cache.insert(key, Cached::new(state));
        result
    }

    /// Every entity joined with the boundaries of `level`, carrying `attribute`.
    pub fn get_layer(&self, level: DetailLevel, attribute: &str) -> Result<LayerView> {
        self.get_layer_filtered(level, attribute, &EntityFilter::default())
    }

    /// Like `get_layer`, restricted to the entities passing `filter`.
    pub fn get_layer_filtered(&self, level: DetailLevel, attribute: &str, filter: &EntityFilter) -> Result<LayerView> {
        let table = self.attribute_table();
        let rows = filter.apply(&table);
        self.build_layer(&table, &rows, level, attribute)
    }

    /// Filtered layer at the detail level suited to the number of entities selected.
    pub fn get_layer_auto(&self, attribute: &str, filter: &EntityFilter) -> Result<LayerView> {
        let table = self.attribute_table();
        let rows = filter.apply(&table);
        let level = DetailLevel::for_entity_count(rows.len());
        tracing::debug!(entities = rows.len(), level = %level, "selected detail level");
        self.build_layer(&table, &rows, level, attribute)
    }

    fn build_layer(&self, table: &AttributeTable, rows: &[usize], level: DetailLevel, attribute: &str) -> Result<LayerView> {
        if !table.is_empty() && !table.has_values(attribute) {
            return Err(GeoDataError::UnknownAttribute(attribute.to_string()));
        }

        let CatalogLoad { set, requested, served, substituted } = self.geometry(level);

        let schema = table.schema();
        let attribute_fields = schema.reserved().into_iter()
            .chain((!schema.is_reserved(attribute)).then_some(attribute));
        let geometry_fields = set.property_names();
        let merge = FieldMerge::resolve(attribute_fields, geometry_fields.iter().map(String::as_str));
        if let Err(err) = merge.verify() {
            tracing::warn!(error = %err, "merged layer repeats a field");
        }
        if !merge.collisions().is_empty() {
            tracing::debug!(collisions = ?merge.collisions(), "boundary fields shadowed by attribute fields");
        }

        let rows: Vec<LayerRow> = rows.iter()
            .map(|&row| {
                let entity = &table.entities()[row];
                let boundary = set.get(entity.id);
                LayerRow {
                    id: entity.id,
                    name: entity.name.clone(),
                    region: entity.region.clone(),
                    population: entity.population,
                    centroid: entity.centroid,
                    value: table.value(row, attribute),
                    geometry: boundary.map(|b| b.geometry.clone()),
                    properties: boundary
                        .map(|b| b.properties.iter()
                            .filter(|(name, _)| merge.keeps_geometry_field(name))
                            .map(|(name, value)| (name.clone(), value.clone()))
                            .collect())
                        .unwrap_or_default(),
                }
            })
            .collect();

        let orphan_boundaries = set.boundaries().iter()
            .filter(|boundary| table.index_of(boundary.id).is_none())
            .count();
        if orphan_boundaries > 0 {
            tracing::debug!(level = %served, orphan_boundaries, "boundaries without a matching entity");
        }

        Ok(LayerView {
            requested,
            served,
            substituted,
            attribute: attribute.to_string(),
            fields: merge.fields().to_vec(),
            geometry_available: rows.iter().any(LayerRow::has_geometry),
            rows,
            resolved_collisions: merge.collisions().to_vec(),
            orphan_boundaries,
            schema: schema.clone(),
        })
    }

    /// Proximity queries over the current attribute table.
    pub fn proximity(&self) -> ProximityAnalyzer {
        ProximityAnalyzer::new(self.attribute_table()).with_config(&self.config)
    }

    /// Drop every cached source; the next request reloads from disk.
    pub fn invalidate(&self) {
        *self.attribute_cache.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.geometry_cache.write().unwrap_or_else(PoisonError::into_inner).clear();
        tracing::info!("invalidated all cached sources");
    }

    /// Drop the cached boundaries of one level.
    pub fn invalidate_level(&self, level: DetailLevel) {
        self.geometry_cache.write().unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, cached_level), _| *cached_level != level);
        tracing::info!(level = %level, "invalidated cached boundaries");
    }

    pub fn load_counts(&self) -> LoadCounts {
        LoadCounts {
            attributes: self.attribute_loads.load(Ordering::Relaxed),
            geometry: self.geometry_loads.load(Ordering::Relaxed),
        }
    }

    pub fn cache_status(&self) -> CacheStatus {
        let attributes = self.attribute_cache.read().unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|cached| cached.loaded_at.elapsed());
        let geometry = self.geometry_cache.read().unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, cached)| matches!(cached.value, LevelState::Loaded(_)))
            .map(|((_, level), cached)| (*level, cached.loaded_at.elapsed()))
            .collect();
        CacheStatus { attributes, geometry, ttl: self.config.cache_ttl() }
    }
}
