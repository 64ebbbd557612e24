use crate::{
    config::{DerivedColumn, SchemaConfig, ServiceConfig, StudyArea},
    error::{GeoDataError, Result},
    store::{AttributeSource, AttributeTable, FileAttributeSource},
};

/// Loads the municipality attribute snapshot into an `AttributeTable`.
pub struct AttributeStore {
    source: Box<dyn AttributeSource>,
    schema: SchemaConfig,
    derived: Vec<DerivedColumn>,
    study_area: StudyArea,
}

impl std::fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStore")
            .field("source", &self.source.identity())
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl AttributeStore {
    pub fn new(source: impl AttributeSource + 'static, config: &ServiceConfig) -> Self {
        Self {
            source: Box::new(source),
            schema: config.schema.clone(),
            derived: config.derived.clone(),
            study_area: config.study_area,
        }
    }

    /// Store reading the snapshot file named by `config.attributes`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(FileAttributeSource::new(&config.attributes), config)
    }

    #[inline] pub fn identity(&self) -> String { self.source.identity() }

    #[inline] pub fn schema(&self) -> &SchemaConfig { &self.schema }

    /// Read and parse the snapshot, reporting why it could not be loaded.
    pub fn try_load(&self) -> Result<AttributeTable> {
        let identity = self.source.identity();
        self.source.read()
            .and_then(|df| AttributeTable::from_dataframe(&df, &self.schema, &self.derived, &self.study_area))
            .map_err(|err| GeoDataError::unavailable(identity, &err))
    }

    /// Read the snapshot, degrading to an empty table when it is unavailable.
    pub fn load(&self) -> AttributeTable {
        match self.try_load() {
            Ok(table) => {
                tracing::info!(source = %self.source.identity(), entities = table.len(), "loaded attribute snapshot");
                table
            }
            Err(err) => {
                tracing::warn!(error = %err, "attribute snapshot unavailable, serving an empty table");
                AttributeTable::empty(self.schema.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::store::CsvTextSource;

    use super::*;

    #[test]
    fn loads_from_text_source() {
        let config = ServiceConfig::default();
        let store = AttributeStore::new(
            CsvTextSource::new("two", "cd_mun,nome_municipio,lat,lon\n1,A,-23.0,-47.0\n2,B,-22.0,-48.0\n"),
            &config,
        );
        assert_eq!(store.identity(), "mem:two");
        assert_eq!(store.load().len(), 2);
    }

    #[test]
    fn missing_snapshot_degrades_to_empty() {
        let config = ServiceConfig { attributes: "/nonexistent/municipios.csv".into(), ..Default::default() };
        let store = AttributeStore::from_config(&config);

        match store.try_load() {
            Err(GeoDataError::DataUnavailable { source_id, .. }) => assert!(source_id.ends_with("municipios.csv")),
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
        let table = store.load();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn malformed_snapshot_is_unavailable() {
        let store = AttributeStore::new(CsvTextSource::new("bad", "foo,bar\n1,2\n"), &ServiceConfig::default());
        assert!(matches!(store.try_load(), Err(GeoDataError::DataUnavailable { .. })));
    }
}
