use geo::{Point, Rect};
use rstar::{AABB, RTreeObject};

/// A boundary's bounding box in an R-tree, associated with the boundary by index.
#[derive(Debug, Clone)]
pub(super) struct BoundingBox {
    idx: usize, // Index of the corresponding boundary in the set
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(super) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    #[inline] pub(super) fn idx(&self) -> usize { self.idx }

    #[inline] pub(super) fn bbox(&self) -> &Rect<f64> { &self.bbox }

    /// Degenerate envelope used to look up the boxes covering a point.
    pub(super) fn point_envelope(point: Point<f64>) -> AABB<[f64; 2]> {
        AABB::from_point([point.x(), point.y()])
    }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}
