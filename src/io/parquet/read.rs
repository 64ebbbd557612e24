//! Parquet reading operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::ParquetReader};

/// Reads a Parquet file from `path` into a Polars DataFrame.
pub(crate) fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::parquet::read] Failed to open Parquet file: {}", path.display()))?;
    ParquetReader::new(file)
        .finish()
        .with_context(|| format!("[io::parquet::read] Failed to read Parquet from {:?}", path))
}
