use std::{collections::{BTreeMap, BTreeSet}, sync::Arc};

use ahash::AHashMap;
use geo::{BoundingRect, Coord, Intersects, MultiPolygon, Point, Rect};
use rstar::RTree;

use crate::{
    common::FieldValue,
    geom::BoundingBox,
    io::GeometryRecord,
    types::{DetailLevel, EntityId},
};

/// One municipality polygon at a given detail level.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub id: EntityId,
    pub geometry: Arc<MultiPolygon<f64>>,
    /// Non-geometry fields carried by the boundary file.
    pub properties: BTreeMap<String, FieldValue>,
}

impl Boundary {
    pub fn new(id: EntityId, geometry: MultiPolygon<f64>) -> Self {
        Self { id, geometry: Arc::new(geometry), properties: BTreeMap::new() }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

/// The boundaries of one detail level, indexed by id and by bounding box.
#[derive(Debug, Clone)]
pub struct BoundarySet {
    level: DetailLevel,
    boundaries: Vec<Boundary>,
    index: AHashMap<EntityId, usize>,
    rtree: RTree<BoundingBox>,
}

impl BoundarySet {
    pub fn empty(level: DetailLevel) -> Self {
        Self { level, boundaries: Vec::new(), index: AHashMap::new(), rtree: RTree::new() }
    }

    /// Construct a set from boundaries; a repeated id keeps its first boundary.
    pub fn new(level: DetailLevel, boundaries: impl IntoIterator<Item = Boundary>) -> Self {
        let mut kept = Vec::new();
        let mut index = AHashMap::new();
        let mut duplicates = 0usize;
        for boundary in boundaries {
            if index.contains_key(&boundary.id) {
                duplicates += 1;
                continue;
            }
            index.insert(boundary.id, kept.len());
            kept.push(boundary);
        }
        if duplicates > 0 {
            tracing::warn!(level = %level, duplicates, "boundary file repeats ids, keeping the first of each");
        }

        let rtree = RTree::bulk_load(
            kept.iter().enumerate()
                .filter_map(|(i, boundary)| boundary.geometry.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                .collect()
        );

        Self { level, boundaries: kept, index, rtree }
    }

    /// Resolve record ids from the `id_field` property (matched case-insensitively)
    /// or the feature id. Records without a usable id are dropped.
    pub(crate) fn from_records(level: DetailLevel, records: Vec<GeometryRecord>, id_field: &str) -> Self {
        let mut unidentified = 0usize;
        let boundaries: Vec<Boundary> = records.into_iter()
            .filter_map(|record| {
                let id = record.properties.iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(id_field))
                    .and_then(|(_, value)| value.as_entity_id())
                    .or_else(|| record.feature_id.as_ref().and_then(FieldValue::as_entity_id));
                if id.is_none() {
                    unidentified += 1;
                }
                id.map(|id| Boundary { id, geometry: Arc::new(record.geometry), properties: record.properties })
            })
            .collect();

        if unidentified > 0 {
            tracing::warn!(level = %level, unidentified, id_field, "dropped boundaries without an entity id");
        }
        Self::new(level, boundaries)
    }

    #[inline] pub fn level(&self) -> DetailLevel { self.level }

    #[inline] pub fn len(&self) -> usize { self.boundaries.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.boundaries.is_empty() }

    #[inline] pub fn boundaries(&self) -> &[Boundary] { &self.boundaries }

    pub fn get(&self, id: EntityId) -> Option<&Boundary> {
        self.index.get(&id).map(|&i| &self.boundaries[i])
    }

    /// Names of every property carried by at least one boundary.
    pub fn property_names(&self) -> BTreeSet<String> {
        self.boundaries.iter()
            .flat_map(|boundary| boundary.properties.keys().cloned())
            .collect()
    }

    /// Compute the bounding rectangle of all boundaries.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.rtree.iter()
            .map(|bbox| *bbox.bbox())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }

    /// Find the boundary containing a (lon, lat) point, e.g. a map click.
    /// Points on a shared edge resolve to the smallest id.
    pub fn locate(&self, point: Point<f64>) -> Option<EntityId> {
        self.rtree.locate_in_envelope_intersecting(&BoundingBox::point_envelope(point))
            .map(|bbox| &self.boundaries[bbox.idx()])
            .filter(|boundary| boundary.geometry.intersects(&point))
            .map(|boundary| boundary.id)
            .min()
    }
}
