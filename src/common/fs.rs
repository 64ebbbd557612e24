use std::path::Path;

use anyhow::{Result, bail};

/// Error unless `path` exists and is a regular file.
pub(crate) fn require_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("File does not exist: {}", path.display());
    }
    if !path.is_file() {
        bail!("Path exists but is not a file: {}", path.display());
    }
    Ok(())
}

/// Lowercased file extension, if any.
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_file_rejects_missing_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(require_file_exists(&dir.path().join("missing.csv")).is_err());
        assert!(require_file_exists(dir.path()).is_err());

        let file = dir.path().join("present.csv");
        std::fs::write(&file, "cd_mun\n1\n").unwrap();
        assert!(require_file_exists(&file).is_ok());
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension(Path::new("a/Municipios_SP.SHP")).as_deref(), Some("shp"));
        assert_eq!(extension(Path::new("no_extension")), None);
    }
}
