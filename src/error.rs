//! Error taxonomy for the geodata service.

use thiserror::Error;

use crate::types::DetailLevel;

/// Result type alias using GeoDataError.
pub type Result<T> = std::result::Result<T, GeoDataError>;

/// Errors reported by the data, proximity and classification layers.
///
/// Only the caller-input variants (`InvalidRadius`, `InvalidCoordinates`,
/// `InvalidClassCount`, `UnknownAttribute`) ever reach a caller of the public
/// query API. Data-availability problems degrade to empty or partial results
/// and are logged instead.
#[derive(Debug, Error)]
pub enum GeoDataError {
    // === Data Errors ===
    #[error("Data unavailable from {source_id}: {reason}")]
    DataUnavailable { source_id: String, reason: String },

    #[error("Geometry level {requested} missing, served {served} instead")]
    GeometryLevelMissing { requested: DetailLevel, served: DetailLevel },

    #[error("Merge collision on field '{field}'")]
    MergeCollision { field: String },

    // === Caller Input Errors ===
    #[error("Invalid radius: {0} km")]
    InvalidRadius(f64),

    #[error("Invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Invalid class count: {0} (must be at least 2)")]
    InvalidClassCount(usize),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GeoDataError {
    /// Wrap a low-level loader failure as `DataUnavailable`.
    pub(crate) fn unavailable(source_id: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::DataUnavailable { source_id: source_id.into(), reason: format!("{err:#}") }
    }

    /// Whether the error stems from bad caller input rather than missing data.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRadius(_)
                | Self::InvalidCoordinates { .. }
                | Self::InvalidClassCount(_)
                | Self::UnknownAttribute(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_flagged() {
        assert!(GeoDataError::InvalidRadius(-1.0).is_validation());
        assert!(GeoDataError::InvalidClassCount(1).is_validation());
        assert!(GeoDataError::UnknownAttribute("x".into()).is_validation());
        assert!(!GeoDataError::Config("bad".into()).is_validation());
    }

    #[test]
    fn unavailable_keeps_context_chain() {
        let err = anyhow::anyhow!("file not found").context("[store] Failed to read snapshot");
        let wrapped = GeoDataError::unavailable("data/municipalities.csv", &err);
        let text = wrapped.to_string();
        assert!(text.contains("data/municipalities.csv"));
        assert!(text.contains("file not found"));
    }
}
