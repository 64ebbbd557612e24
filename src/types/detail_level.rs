use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::GeoDataError;

/// Precision tier of a pre-simplified boundary set, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    High,           // Close zoom, smallest simplification tolerance
    Medium,         // Statewide view
    Low,            // Overview
    CentroidOnly,   // No shapes; rows render as points at their centroid
}

impl DetailLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            DetailLevel::High => "high",
            DetailLevel::Medium => "medium",
            DetailLevel::Low => "low",
            DetailLevel::CentroidOnly => "centroid_only",
        }
    }

    pub fn order() -> [DetailLevel; 4] {
        [
            DetailLevel::High,
            DetailLevel::Medium,
            DetailLevel::Low,
            DetailLevel::CentroidOnly,
        ]
    }

    /// The next coarser level, if any.
    pub fn coarser(&self) -> Option<DetailLevel> {
        match self {
            DetailLevel::High => Some(DetailLevel::Medium),
            DetailLevel::Medium => Some(DetailLevel::Low),
            DetailLevel::Low => Some(DetailLevel::CentroidOnly),
            DetailLevel::CentroidOnly => None,
        }
    }

    /// This level followed by every coarser level.
    pub fn fallback_chain(self) -> impl Iterator<Item = DetailLevel> {
        std::iter::successors(Some(self), |level| level.coarser())
    }

    /// Pick a level that bounds render cost for a selection of `count` entities.
    pub fn for_entity_count(count: usize) -> DetailLevel {
        match count {
            n if n > 300 => DetailLevel::Low,
            n if n > 50 => DetailLevel::Medium,
            _ => DetailLevel::High,
        }
    }

    /// Whether this level is backed by shapes at all.
    #[inline] pub fn has_shapes(&self) -> bool { *self != DetailLevel::CentroidOnly }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for DetailLevel {
    type Err = GeoDataError;

    /// Accepts the short names plus the `*_detail` file-name spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "high_detail" => Ok(DetailLevel::High),
            "medium" | "medium_detail" => Ok(DetailLevel::Medium),
            "low" | "low_detail" => Ok(DetailLevel::Low),
            "centroid" | "centroids" | "centroid_only" | "centroid-only" => Ok(DetailLevel::CentroidOnly),
            other => Err(GeoDataError::Config(format!("unknown detail level: {other}"))),
        }
    }
}
