use std::collections::BTreeSet;

use crate::error::{GeoDataError, Result};

/// Output fields of an attribute/geometry join.
///
/// Field names are compared ASCII case-insensitively, since shapefile
/// attribute names are usually upper-case. When both sides carry a field the
/// attribute copy is kept and the geometry copy is dropped, so no output name
/// is ever suffixed or duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMerge {
    fields: Vec<String>,
    geometry_fields: Vec<String>,
    collisions: Vec<String>,
}

impl FieldMerge {
    pub fn resolve<'a>(
        attribute_fields: impl IntoIterator<Item = &'a str>,
        geometry_fields: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let mut fields = Vec::new();
        for field in attribute_fields {
            if seen.insert(field.to_ascii_lowercase()) {
                fields.push(field.to_string());
            }
        }

        let mut geometry = Vec::new();
        let mut collisions = Vec::new();
        for field in geometry_fields {
            if seen.insert(field.to_ascii_lowercase()) {
                geometry.push(field.to_string());
            } else {
                collisions.push(field.to_string());
            }
        }
        fields.extend(geometry.iter().cloned());

        Self { fields, geometry_fields: geometry, collisions }
    }

    /// Every output field, attribute fields first.
    #[inline] pub fn fields(&self) -> &[String] { &self.fields }

    /// Geometry-side fields that survive the merge.
    #[inline] pub fn geometry_fields(&self) -> &[String] { &self.geometry_fields }

    /// Geometry-side fields dropped in favour of the attribute copy.
    #[inline] pub fn collisions(&self) -> &[String] { &self.collisions }

    pub fn keeps_geometry_field(&self, field: &str) -> bool {
        self.geometry_fields.iter().any(|f| f == field)
    }

    /// Check that no output field appears twice.
    pub fn verify(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        match self.fields.iter().find(|field| !seen.insert(field.to_ascii_lowercase())) {
            Some(field) => Err(GeoDataError::MergeCollision { field: field.clone() }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_copy_wins() {
        let merge = FieldMerge::resolve(
            ["cd_mun", "nome_municipio", "biogas_total"],
            ["CD_MUN", "nome_municipio", "area_km2"],
        );
        assert_eq!(merge.fields(), &["cd_mun", "nome_municipio", "biogas_total", "area_km2"]);
        assert_eq!(merge.collisions(), &["CD_MUN", "nome_municipio"]);
        assert!(merge.keeps_geometry_field("area_km2"));
        assert!(!merge.keeps_geometry_field("nome_municipio"));
        assert!(merge.verify().is_ok());
    }

    #[test]
    fn no_suffixed_names() {
        let merge = FieldMerge::resolve(["nome_municipio"], ["nome_municipio", "nome_municipio"]);
        assert!(merge.fields().iter().all(|f| !f.ends_with("_x") && !f.ends_with("_y")));
        assert_eq!(merge.fields().len(), 1);
    }

    #[test]
    fn verify_flags_duplicates() {
        let merge = FieldMerge { fields: vec!["a".into(), "A".into()], ..Default::default() };
        assert!(matches!(merge.verify(), Err(GeoDataError::MergeCollision { field }) if field == "A"));
    }
}
