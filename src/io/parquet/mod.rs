//! Parquet format reading operations.
//!
//! This module is only available when the `parquet` feature is enabled.

mod read;

pub(crate) use read::*;
