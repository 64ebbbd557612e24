mod fs;
mod geodesy;
mod polygon;
mod value;

pub(crate) use fs::*;
pub use geodesy::*;
pub(crate) use polygon::*;
pub use value::FieldValue;
