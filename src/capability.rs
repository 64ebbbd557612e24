//! Optional capabilities, checked as flags instead of probing for missing dependencies.

use std::{collections::BTreeSet, fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::{config::ServiceConfig, error::GeoDataError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Land-use raster overlay for catchment areas.
    LanduseOverlay,
}

impl Capability {
    pub fn to_str(&self) -> &'static str {
        match self {
            Capability::LanduseOverlay => "landuse_overlay",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Capability {
    type Err = GeoDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "landuse_overlay" => Ok(Capability::LanduseOverlay),
            other => Err(GeoDataError::Config(format!("unknown capability: {other}"))),
        }
    }
}

/// Capabilities that are both requested and backed by data on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    enabled: BTreeSet<Capability>,
}

impl Capabilities {
    /// Resolve the requested capabilities against what is actually installed.
    pub fn detect(config: &ServiceConfig) -> Self {
        let enabled = config.capabilities.iter()
            .copied()
            .filter(|&cap| match cap {
                Capability::LanduseOverlay => {
                    let found = config.raster_dir.as_deref().is_some_and(has_rasters);
                    if !found {
                        tracing::warn!(capability = %cap, "no land-use rasters found, capability disabled");
                    }
                    found
                }
            })
            .collect();
        Self { enabled }
    }

    #[inline] pub fn has(&self, cap: Capability) -> bool { self.enabled.contains(&cap) }

    /// Look a capability up by name; unknown names are simply unavailable.
    pub fn has_named(&self, name: &str) -> bool {
        name.parse().is_ok_and(|cap| self.has(cap))
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.enabled.iter().copied()
    }
}

/// Whether `dir` contains at least one GeoTIFF.
fn has_rasters(dir: &Path) -> bool {
    WalkDir::new(dir)
        .max_depth(2)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .any(|entry| {
            entry.path().extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "tif" | "tiff" | "geotiff"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_rasters(dir: Option<&Path>) -> ServiceConfig {
        ServiceConfig {
            capabilities: BTreeSet::from([Capability::LanduseOverlay]),
            raster_dir: dir.map(Path::to_path_buf),
            ..Default::default()
        }
    }

    #[test]
    fn overlay_requires_raster_files() {
        let dir = tempfile::tempdir().unwrap();
        let caps = Capabilities::detect(&config_with_rasters(Some(dir.path())));
        assert!(!caps.has(Capability::LanduseOverlay));

        std::fs::write(dir.path().join("mapbiomas_sp_2023.TIF"), b"II*\0").unwrap();
        let caps = Capabilities::detect(&config_with_rasters(Some(dir.path())));
        assert!(caps.has(Capability::LanduseOverlay));
        assert!(caps.has_named("landuse_overlay"));
    }

    #[test]
    fn unrequested_or_unknown_capabilities_are_off() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("landuse.tif"), b"II*\0").unwrap();
        let config = ServiceConfig { raster_dir: Some(dir.path().to_path_buf()), ..Default::default() };

        let caps = Capabilities::detect(&config);
        assert!(!caps.has(Capability::LanduseOverlay));
        assert!(!caps.has_named("teleport"));
        assert!(Capabilities::detect(&config_with_rasters(None)).iter().next().is_none());
    }
}
