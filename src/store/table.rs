use std::{collections::{BTreeMap, BTreeSet}, sync::Arc};

use ahash::AHashMap;
use anyhow::{Context, Result, ensure};
use geo::Point;
use polars::{frame::DataFrame, prelude::{Column, DataType}};

use crate::{
    config::{DerivedColumn, SchemaConfig, StudyArea},
    types::EntityId,
};

/// A single municipality record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: Arc<str>,
    pub region: Option<Arc<str>>,
    pub population: Option<i64>,
    pub centroid: Option<Point<f64>>,  // (lon, lat)
}

impl Entity {
    pub fn new(id: u32, name: &str) -> Self {
        Self { id: EntityId(id), name: Arc::from(name), region: None, population: None, centroid: None }
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(Arc::from(region));
        self
    }

    pub fn with_population(mut self, population: i64) -> Self {
        self.population = Some(population);
        self
    }

    pub fn with_centroid(mut self, lat: f64, lon: f64) -> Self {
        self.centroid = Some(Point::new(lon, lat));
        self
    }
}

/// Immutable entity table with column-oriented numeric attributes.
#[derive(Debug, Clone)]
pub struct AttributeTable {
    schema: SchemaConfig,
    entities: Vec<Entity>,
    index: AHashMap<EntityId, usize>, // Map between entity ids and row indices.
    columns: BTreeMap<String, Vec<Option<f64>>>,
    outside_study_area: usize,
}

impl AttributeTable {
    /// An empty table that still answers schema questions.
    pub fn empty(schema: SchemaConfig) -> Self {
        Self {
            schema,
            entities: Vec::new(),
            index: AHashMap::new(),
            columns: BTreeMap::new(),
            outside_study_area: 0,
        }
    }

    /// Build a table from already-parsed entities and attribute columns.
    /// Each column must have one value per entity; duplicate ids are rejected.
    pub fn from_entities(
        schema: SchemaConfig,
        entities: Vec<Entity>,
        columns: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Result<Self> {
        for (name, values) in &columns {
            ensure!(values.len() == entities.len(),
                "[store::table] column {:?} has {} values, expected {}", name, values.len(), entities.len());
            ensure!(!schema.is_reserved(name), "[store::table] column {:?} shadows a schema field", name);
        }

        let mut index = AHashMap::with_capacity(entities.len());
        for (i, entity) in entities.iter().enumerate() {
            ensure!(index.insert(entity.id, i).is_none(), "[store::table] duplicate entity id {}", entity.id);
        }

        let columns = columns.into_iter()
            .map(|(name, values)| (name, values.into_iter().map(|v| v.filter(|x| x.is_finite())).collect()))
            .collect();

        Ok(Self { schema, entities, index, columns, outside_study_area: 0 })
    }

    /// Parse an attribute snapshot.
    ///
    /// Rows without a parseable id are skipped and repeated ids keep their first
    /// row. Every numeric column outside the schema becomes an attribute, and
    /// `derived` rules add `per_capita * population` totals.
    pub fn from_dataframe(
        df: &DataFrame,
        schema: &SchemaConfig,
        derived: &[DerivedColumn],
        study_area: &StudyArea,
    ) -> Result<Self> {
        let ids = id_values(required(df, &schema.id)?)?;
        let lats = float_values(required(df, &schema.latitude)?)?;
        let lons = float_values(required(df, &schema.longitude)?)?;
        let names = df.column(&schema.name).ok().map(string_values).transpose()?;
        let regions = df.column(&schema.region).ok().map(string_values).transpose()?;
        let populations = df.column(&schema.population).ok().map(float_values).transpose()?;

        let mut raw_columns = BTreeMap::new();
        for column in df.get_columns() {
            let name = column.name().as_str();
            if schema.is_reserved(name) || !is_numeric(column.dtype()) {
                continue;
            }
            raw_columns.insert(name.to_string(), float_values(column)?);
        }

        // Keep the first row of every parseable id.
        let mut index = AHashMap::with_capacity(ids.len());
        let mut kept = Vec::with_capacity(ids.len());
        let (mut missing_ids, mut duplicates) = (0usize, 0usize);
        for (row, id) in ids.iter().enumerate() {
            match id {
                None => missing_ids += 1,
                Some(id) if index.contains_key(id) => duplicates += 1,
                Some(id) => {
                    index.insert(*id, kept.len());
                    kept.push((row, *id));
                }
            }
        }
        if missing_ids > 0 || duplicates > 0 {
            tracing::warn!(missing_ids, duplicates, "skipped attribute rows without a unique id");
        }

        let entities: Vec<Entity> = kept.iter()
            .map(|&(row, id)| {
                Entity {
                    id,
                    name: names.as_ref()
                        .and_then(|names| names[row].as_deref())
                        .map_or_else(|| Arc::from(id.to_string()), Arc::from),
                    region: regions.as_ref()
                        .and_then(|regions| regions[row].as_deref())
                        .map(Arc::from),
                    population: populations.as_ref()
                        .and_then(|pops| pops[row])
                        .map(|pop| pop.round() as i64),
                    centroid: lats[row].zip(lons[row]).map(|(lat, lon)| Point::new(lon, lat)),
                }
            })
            .collect();

        let mut columns: BTreeMap<String, Vec<Option<f64>>> = raw_columns.into_iter()
            .map(|(name, values)| (name, kept.iter().map(|&(row, _)| values[row]).collect()))
            .collect();

        for rule in derived {
            let Some(per_capita) = columns.get(&rule.per_capita) else { continue };
            if populations.is_none() {
                continue;
            }
            let totals = per_capita.iter().zip(&entities)
                .map(|(value, entity)| Some(value.zip(entity.population)
                    .map_or(0.0, |(v, pop)| v * pop as f64)))
                .collect();
            tracing::debug!(per_capita = %rule.per_capita, output = %rule.output, "derived per-capita total");
            columns.insert(rule.output.clone(), totals);
        }

        let outside_study_area = entities.iter()
            .filter_map(|entity| entity.centroid)
            .filter(|&centroid| !study_area.contains(centroid))
            .count();
        if outside_study_area > 0 {
            tracing::warn!(outside_study_area, "entity centroids fall outside the study area");
        }

        Ok(Self { schema: schema.clone(), entities, index, columns, outside_study_area })
    }

    #[inline] pub fn len(&self) -> usize { self.entities.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.entities.is_empty() }

    #[inline] pub fn schema(&self) -> &SchemaConfig { &self.schema }

    #[inline] pub fn entities(&self) -> &[Entity] { &self.entities }

    /// Number of centroids found outside the configured study area at load time.
    #[inline] pub fn outside_study_area(&self) -> usize { self.outside_study_area }

    #[inline] pub fn index_of(&self, id: EntityId) -> Option<usize> { self.index.get(&id).copied() }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    /// Names of the numeric attribute columns available for visualization.
    pub fn columns(&self) -> BTreeSet<String> {
        self.columns.keys().cloned().collect()
    }

    /// Whether `name` can be used as a value column: an attribute or the population field.
    pub fn has_values(&self, name: &str) -> bool {
        self.columns.contains_key(name) || name == self.schema.population
    }

    /// The value of column `name` at row `row`.
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        match self.columns.get(name) {
            Some(values) => values.get(row).copied().flatten(),
            None if name == self.schema.population => {
                self.entities.get(row).and_then(|e| e.population).map(|p| p as f64)
            }
            None => None,
        }
    }

    /// Retrieve a whole column as (id, value) pairs in table order.
    pub fn column(&self, name: &str) -> Option<Vec<(EntityId, Option<f64>)>> {
        self.has_values(name).then(|| {
            self.entities.iter().enumerate()
                .map(|(row, entity)| (entity.id, self.value(row, name)))
                .collect()
        })
    }

    /// Every field name a row of this table exposes, schema fields first.
    pub fn field_names(&self) -> Vec<String> {
        self.schema.reserved().iter()
            .map(|name| name.to_string())
            .chain(self.columns.keys().cloned())
            .collect()
    }
}

fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name).with_context(|| format!("[store::table] snapshot is missing required column {:?}", name))
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(dtype,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32 | DataType::UInt64 | DataType::UInt32)
}

fn id_values(column: &Column) -> Result<Vec<Option<EntityId>>> {
    let text = column.cast(&DataType::String)?;
    Ok(text.str()?.into_iter().map(|v| v.and_then(EntityId::parse)).collect())
}

fn float_values(column: &Column) -> Result<Vec<Option<f64>>> {
    let floats = column.cast(&DataType::Float64)
        .with_context(|| format!("[store::table] column {:?} is not numeric", column.name()))?;
    Ok(floats.f64()?.into_iter().map(|v| v.filter(|x| x.is_finite())).collect())
}

fn string_values(column: &Column) -> Result<Vec<Option<String>>> {
    let text = column.cast(&DataType::String)?;
    Ok(text.str()?.into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}
