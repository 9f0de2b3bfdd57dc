//! Envelope helpers shared by the spatial indices.

use geo::{Coord, Rect};
use rstar::{RTreeObject, AABB};

/// Axis-aligned envelope of a two-point segment.
#[inline]
pub fn segment_envelope(start: Coord<f64>, end: Coord<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [start.x.min(end.x), start.y.min(end.y)],
        [start.x.max(end.x), start.y.max(end.y)],
    )
}

/// A bounding box in an R-tree, associated with a feature by index.
#[derive(Clone, Debug)]
pub(crate) struct FeatureEnvelope {
    idx: usize,
    bbox: Rect<f64>,
}

impl FeatureEnvelope {
    pub(crate) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Index of the corresponding feature.
    pub(crate) fn idx(&self) -> usize {
        self.idx
    }
}

impl RTreeObject for FeatureEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_envelope_normalizes_corners() {
        let env = segment_envelope(Coord { x: 3.0, y: -1.0 }, Coord { x: 1.0, y: 2.0 });
        assert_eq!(env.lower(), [1.0, -1.0]);
        assert_eq!(env.upper(), [3.0, 2.0]);
    }

    #[test]
    fn feature_envelope_matches_rect() {
        let rect = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 2.0, y: 3.0 });
        let entry = FeatureEnvelope::new(5, rect);
        assert_eq!(entry.idx(), 5);
        assert_eq!(entry.envelope().lower(), [0.0, 0.0]);
        assert_eq!(entry.envelope().upper(), [2.0, 3.0]);
    }
}
