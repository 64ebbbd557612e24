//! Boundary sets per detail level, their sources and the fallback catalog.

mod bbox;
mod boundary;
mod catalog;
mod source;

use bbox::BoundingBox;
pub use boundary::{Boundary, BoundarySet};
pub use catalog::{CatalogLoad, GeometryCatalog};
pub use source::{FileGeometrySource, GeometrySource, MemoryGeometrySource};
