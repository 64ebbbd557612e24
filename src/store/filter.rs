use std::collections::BTreeSet;

use crate::{store::AttributeTable, types::EntityId};

/// Region label that means "no region filter".
const ALL_REGIONS: &str = "All";

/// Row predicate applied before a layer is merged with geometry.
///
/// All conditions are combined with AND. Conditions on columns the table does
/// not have are logged and ignored rather than matching nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityFilter {
    /// Column tested by `min_value`/`max_value`.
    pub measure: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub region: Option<String>,
    /// Columns that must hold a strictly positive value.
    pub require_positive: Vec<String>,
    /// Restrict to an explicit id set, e.g. the hits of a proximity query.
    pub ids: Option<BTreeSet<EntityId>>,
}

impl EntityFilter {
    pub fn new() -> Self { Self::default() }

    /// Keep rows whose `measure` lies in `[min, max]`; either bound may be open.
    pub fn with_range(mut self, measure: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        self.measure = Some(measure.into());
        self.min_value = min;
        self.max_value = max;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_positive(mut self, column: impl Into<String>) -> Self {
        self.require_positive.push(column.into());
        self
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    /// Whether the filter keeps every row.
    pub fn is_empty(&self) -> bool {
        self.measure.is_none()
            && self.region.as_deref().is_none_or(|r| r == ALL_REGIONS)
            && self.require_positive.is_empty()
            && self.ids.is_none()
    }

    /// Row indices of `table` that pass the filter, in table order.
    pub fn apply(&self, table: &AttributeTable) -> Vec<usize> {
        let measure = self.measure.as_deref()
            .filter(|&column| known(table, column));
        let positive: Vec<&str> = self.require_positive.iter()
            .map(String::as_str)
            .filter(|&column| known(table, column))
            .collect();
        let region = self.region.as_deref().filter(|&r| r != ALL_REGIONS);

        table.entities().iter().enumerate()
            .filter(|(_, entity)| self.ids.as_ref().is_none_or(|ids| ids.contains(&entity.id)))
            .filter(|(_, entity)| region.is_none_or(|r| entity.region.as_deref() == Some(r)))
            .filter(|&(row, _)| measure.is_none_or(|column| {
                table.value(row, column).is_some_and(|v| {
                    self.min_value.is_none_or(|min| v >= min) && self.max_value.is_none_or(|max| v <= max)
                })
            }))
            .filter(|&(row, _)| positive.iter().all(|column| table.value(row, column).is_some_and(|v| v > 0.0)))
            .map(|(row, _)| row)
            .collect()
    }
}

fn known(table: &AttributeTable, column: &str) -> bool {
    let found = table.has_values(column);
    if !found {
        tracing::warn!(column, "filter references an unknown column, condition ignored");
    }
    found
}
