//! Attribute snapshot access: sources, the parsed entity table and row filters.

mod attributes;
mod filter;
mod source;
mod table;

pub use attributes::AttributeStore;
pub use filter::EntityFilter;
pub use source::{AttributeSource, CsvTextSource, FileAttributeSource};
pub use table::{AttributeTable, Entity};
