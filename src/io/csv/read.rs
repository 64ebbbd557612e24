//! CSV reading operations.

use std::{fs::File, io::Cursor, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, CsvReader}};

/// Options shared by every attribute snapshot read.
/// The whole file is scanned for schema inference so that sparse numeric
/// columns (mostly nulls in the first rows) are still typed as numbers.
fn snapshot_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
}

/// Reads a CSV file from `path` into a Polars DataFrame.
pub(crate) fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReader::new(file)
        .with_options(snapshot_options())
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

/// Reads a CSV from a string (in-memory snapshots).
pub(crate) fn read_csv_string(csv: &str) -> Result<DataFrame> {
    CsvReader::new(Cursor::new(csv.as_bytes()))
        .with_options(snapshot_options())
        .finish()
        .context("[io::csv::read] Failed to read CSV from string")
}
