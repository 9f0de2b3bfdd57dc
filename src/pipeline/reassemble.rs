//! Polygon reassembly from the surviving segment soup.
//!
//! Each feature gathers the live segments it owns from either side,
//! materializes them as two-point line strings (memoized, since shared
//! segments are visited once per owner) and polygonizes them.  When no
//! polygon comes back the feature is classified by how much area the
//! tolerance can explain: tiny features are dropped, anything larger is
//! surfaced with its linework so a human can inspect it.

use ahash::AHashMap;
use geo::{Area, Coord, LineString, MultiLineString, Polygon};
use log::warn;

use crate::geom::polygonize;
use crate::io::Feature;
use crate::store::{FeatureId, SegmentStore};

/// Outcome of rebuilding one feature at a given tolerance.
#[derive(Clone, Debug)]
pub enum Reassembled {
    /// The feature survived; the largest assembled polygon.
    Polygon(Polygon<f64>),
    /// No polygon, and the feature is small against the tolerance.
    Dropped { lost_portion: f64 },
    /// No polygon, but the feature is too large to lose silently.  Carries
    /// the surviving linework for the error layer.
    Corrupt {
        lines: MultiLineString<f64>,
        lost_portion: f64,
    },
}

/// Features whose `lost_portion` stays under this bound may be dropped
/// without ceremony; anything larger points at corrupt linework.
const LOST_PORTION_LIMIT: f64 = 4.0;

pub(super) fn reassemble(
    store: &SegmentStore,
    features: &[Feature],
    tolerance: f64,
) -> Vec<Reassembled> {
    let mut memo = LineMemo::default();
    features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            reassemble_feature(store, feature, FeatureId(i as u32), tolerance, &mut memo)
        })
        .collect()
}

fn reassemble_feature(
    store: &SegmentStore,
    feature: &Feature,
    id: FeatureId,
    tolerance: f64,
    memo: &mut LineMemo,
) -> Reassembled {
    let lines: Vec<LineString<f64>> = store
        .segments_of_feature(id)
        .map(|segment| memo.line(segment.start, segment.end))
        .collect();

    if let Some(polygon) = polygonize(&lines).into_iter().next() {
        return Reassembled::Polygon(polygon);
    }

    let lost_portion = feature.shape.unsigned_area() / (tolerance * tolerance);
    if lost_portion < LOST_PORTION_LIMIT {
        warn!("skipped small feature {id} (lost portion {lost_portion:.2})");
        Reassembled::Dropped { lost_portion }
    } else {
        warn!(
            "feature {id} failed to polygonize at {lost_portion:.0} times the \
             tolerance area; routing to the error layer"
        );
        Reassembled::Corrupt {
            lines: MultiLineString::new(lines),
            lost_portion,
        }
    }
}

/// Memo of two-point line strings keyed by exact endpoint bit patterns.
/// Bounded by the number of distinct live segments.
#[derive(Default)]
struct LineMemo {
    lines: AHashMap<(u64, u64, u64, u64), LineString<f64>>,
}

impl LineMemo {
    fn line(&mut self, start: Coord<f64>, end: Coord<f64>) -> LineString<f64> {
        self.lines
            .entry((
                start.x.to_bits(),
                start.y.to_bits(),
                end.x.to_bits(),
                end.y.to_bits(),
            ))
            .or_insert_with(|| LineString::new(vec![start, end]))
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lines.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
