#![doc = "Municipal biogas geodata: cached attribute and boundary sources, proximity queries and choropleth classification."]
mod capability;
mod common;
mod config;
mod error;
mod geom;
mod io;
mod proximity;
mod service;
mod store;
mod types;

pub mod classify;

#[doc(inline)]
pub use capability::{Capabilities, Capability};

#[doc(inline)]
pub use common::{EARTH_RADIUS_KM, FieldValue, haversine_km, is_valid_lon_lat, lat_lon};

#[doc(inline)]
pub use config::{DerivedColumn, SchemaConfig, ServiceConfig, StudyArea};

#[doc(inline)]
pub use error::{GeoDataError, Result};

#[doc(inline)]
pub use geom::{Boundary, BoundarySet, CatalogLoad, FileGeometrySource, GeometryCatalog, GeometrySource, MemoryGeometrySource};

#[doc(inline)]
pub use proximity::{CatchmentSummary, ProximityAnalyzer, ProximityHit, ProximityResult, within_radius};

#[doc(inline)]
pub use service::{CacheStatus, DataService, FieldMerge, LayerRow, LayerView, LoadCounts};

#[doc(inline)]
pub use store::{AttributeSource, AttributeStore, AttributeTable, CsvTextSource, Entity, EntityFilter, FileAttributeSource};

#[doc(inline)]
pub use types::{DetailLevel, EntityId};

#[doc(inline)]
pub use classify::{ClassBreaks, ClassMethod, Classification, classify, classify_values};
