use std::path::PathBuf;

use anyhow::{Result, bail};
use polars::frame::DataFrame;

use crate::{common, io};

/// Read-only access to an attribute snapshot as a DataFrame.
pub trait AttributeSource: Send + Sync {
    /// Stable identity of the backing snapshot, used as a cache key.
    fn identity(&self) -> String;

    fn read(&self) -> Result<DataFrame>;
}

/// Attribute snapshot on disk; the format follows the file extension.
#[derive(Debug, Clone)]
pub struct FileAttributeSource {
    path: PathBuf,
}

impl FileAttributeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl AttributeSource for FileAttributeSource {
    fn identity(&self) -> String { self.path.display().to_string() }

    fn read(&self) -> Result<DataFrame> {
        common::require_file_exists(&self.path)?;
        match common::extension(&self.path).as_deref() {
            Some("csv") => io::csv::read_csv(&self.path),
            #[cfg(feature = "parquet")]
            Some("parquet") => io::parquet::read_parquet(&self.path),
            other => bail!("[store::source] Unsupported attribute snapshot format {:?}: {}", other, self.path.display()),
        }
    }
}

/// In-memory CSV snapshot.
#[derive(Debug, Clone)]
pub struct CsvTextSource {
    name: String,
    csv: String,
}

impl CsvTextSource {
    pub fn new(name: impl Into<String>, csv: impl Into<String>) -> Self {
        Self { name: name.into(), csv: csv.into() }
    }
}

impl AttributeSource for CsvTextSource {
    fn identity(&self) -> String { format!("mem:{}", self.name) }

    fn read(&self) -> Result<DataFrame> { io::csv::read_csv_string(&self.csv) }
}
