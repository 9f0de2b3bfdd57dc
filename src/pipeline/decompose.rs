//! Border decomposition.
//!
//! Splits every feature boundary into linework keyed by ownership: borders
//! shared between two features are computed once per intersecting pair, and
//! whatever remains of each boundary afterwards is that feature's unshared
//! border.  Every connected chain becomes one line of segments in the store.
//!
//! A per-feature length audit closes the stage: the shared and unshared
//! pieces must add back up to the boundary they came from, or the input was
//! not a planar subdivision and continuing would corrupt it further.

use anyhow::{ensure, Result};
use geo::{BoundingRect, EuclideanLength, Intersects, MultiLineString};
use log::{debug, info};
use rstar::{RTree, AABB};

use crate::geom::{boundary, segment_envelope, shared_border, subtract_lines, FeatureEnvelope};
use crate::io::Layer;
use crate::pipeline::Pipeline;
use crate::store::{FeatureId, SegmentIndex, SegmentStore};

/// Maximum tolerated mismatch between a feature's boundary length and the
/// summed lengths of its decomposed borders, in coordinate units.
const LENGTH_EPSILON: f64 = 1e-6;

pub(super) fn decompose(layer: Layer) -> Result<Pipeline> {
    let count = layer.len();
    let mut store = SegmentStore::new(count);
    let mut index = SegmentIndex::new();

    // Provisional R-tree over feature envelopes prunes the pair scan from
    // O(N^2) toward O(N * neighbors).
    let rtree: RTree<FeatureEnvelope> = RTree::bulk_load(
        layer
            .features
            .iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                feature.shape.bounding_rect().map(|bbox| FeatureEnvelope::new(i, bbox))
            })
            .collect(),
    );

    info!("making shared borders across {count} features");
    let mut shared: Vec<Vec<MultiLineString<f64>>> = vec![Vec::new(); count];

    for i in 0..count {
        let Some(bbox) = layer.features[i].shape.bounding_rect() else {
            continue;
        };
        let envelope = AABB::from_corners(bbox.min().into(), bbox.max().into());
        let mut neighbors: Vec<usize> = rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(FeatureEnvelope::idx)
            .filter(|&j| j > i)
            .collect();
        neighbors.sort_unstable();

        for j in neighbors {
            if !layer.features[i].shape.intersects(&layer.features[j].shape) {
                continue;
            }
            let border = shared_border(&layer.features[i].shape, &layer.features[j].shape);
            if border.0.is_empty() {
                // Point touch only.
                continue;
            }
            debug!("features {i} and {j}: {} shared chains", border.0.len());
            append_lines(
                &mut store,
                &mut index,
                &border,
                FeatureId(i as u32),
                Some(FeatureId(j as u32)),
            );
            shared[i].push(border.clone());
            shared[j].push(border);
        }
    }

    info!("making unshared borders");
    for i in 0..count {
        let rings = boundary(&layer.features[i].shape);
        let mut remainder = rings.clone();
        for border in &shared[i] {
            remainder = subtract_lines(&remainder, border);
        }
        append_lines(&mut store, &mut index, &remainder, FeatureId(i as u32), None);

        let shared_length: f64 = shared[i].iter().map(|border| border.euclidean_length()).sum();
        let error =
            (rings.euclidean_length() - shared_length - remainder.euclidean_length()).abs();
        ensure!(
            error < LENGTH_EPSILON,
            "feature {i}: decomposed borders miss the boundary by {error}; \
             the input is not a planar subdivision"
        );
    }

    info!(
        "{} features, {} lines, {} segments",
        count,
        store.count_lines(),
        store.count_active()
    );

    Ok(Pipeline::from_parts(layer, store, index))
}

/// Append every chain of `lines` to the store as a fresh line of segments,
/// indexing each segment as it lands.
fn append_lines(
    store: &mut SegmentStore,
    index: &mut SegmentIndex,
    lines: &MultiLineString<f64>,
    owner1: FeatureId,
    owner2: Option<FeatureId>,
) {
    for chain in &lines.0 {
        if chain.0.len() < 2 {
            continue;
        }
        let line_id = store.allocate_line_id();
        for segment in chain.lines() {
            if segment.start == segment.end {
                continue;
            }
            let guid = store.insert(owner1, owner2, line_id, segment.start, segment.end);
            index.insert(guid, segment_envelope(segment.start, segment.end));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Coord, LineString, MultiPolygon, Polygon};

    use crate::store::Guid;

    fn coord(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::new(vec![
                coord(x, y),
                coord(x + size, y),
                coord(x + size, y + size),
                coord(x, y + size),
                coord(x, y),
            ]),
            Vec::new(),
        )])
    }

    /// Two unit squares sharing the edge x = 1, both carrying a midpoint
    /// vertex on it.
    fn adjacent_squares_with_midpoint() -> Layer {
        let left = MultiPolygon::new(vec![Polygon::new(
            LineString::new(vec![
                coord(0.0, 0.0),
                coord(1.0, 0.0),
                coord(1.0, 0.5),
                coord(1.0, 1.0),
                coord(0.0, 1.0),
                coord(0.0, 0.0),
            ]),
            Vec::new(),
        )]);
        let right = MultiPolygon::new(vec![Polygon::new(
            LineString::new(vec![
                coord(1.0, 0.0),
                coord(2.0, 0.0),
                coord(2.0, 1.0),
                coord(1.0, 1.0),
                coord(1.0, 0.5),
                coord(1.0, 0.0),
            ]),
            Vec::new(),
        )]);
        Layer::from_shapes(vec![left, right])
    }

    #[test]
    fn shared_edge_is_recorded_once_with_both_owners() {
        let pipeline = Pipeline::decompose(adjacent_squares_with_midpoint()).unwrap();
        let store = pipeline.store();

        let shared: Vec<&crate::store::Segment> = store
            .segments_of_feature(FeatureId(0))
            .filter(|segment| segment.is_shared())
            .collect();
        assert_eq!(shared.len(), 2);
        for segment in &shared {
            assert_eq!(segment.owner1, FeatureId(0));
            assert_eq!(segment.owner2, Some(FeatureId(1)));
        }

        // The other feature sees the very same segments.
        let from_right: Vec<Guid> = store
            .segments_of_feature(FeatureId(1))
            .filter(|segment| segment.is_shared())
            .map(|segment| segment.guid)
            .collect();
        assert_eq!(from_right, shared.iter().map(|s| s.guid).collect::<Vec<_>>());
    }

    #[test]
    fn unshared_segments_have_a_single_owner() {
        let pipeline = Pipeline::decompose(adjacent_squares_with_midpoint()).unwrap();
        for feature in [FeatureId(0), FeatureId(1)] {
            let unshared = pipeline
                .store()
                .segments_of_feature(feature)
                .filter(|segment| !segment.is_shared())
                .count();
            // Three square edges remain per feature.
            assert_eq!(unshared, 3);
        }
    }

    #[test]
    fn shared_chain_keeps_the_midpoint() {
        let pipeline = Pipeline::decompose(adjacent_squares_with_midpoint()).unwrap();
        let mut endpoints: Vec<Coord<f64>> = pipeline
            .store()
            .segments_of_feature(FeatureId(0))
            .filter(|segment| segment.is_shared())
            .flat_map(|segment| [segment.start, segment.end])
            .collect();
        endpoints.sort_by(|a, b| a.y.total_cmp(&b.y));
        assert_eq!(endpoints[1], coord(1.0, 0.5));
        assert_eq!(endpoints[2], coord(1.0, 0.5));
    }

    #[test]
    fn line_and_segment_counts_add_up() {
        let pipeline = Pipeline::decompose(adjacent_squares_with_midpoint()).unwrap();
        let store = pipeline.store();
        // One shared line plus one unshared chain per feature.
        assert_eq!(store.count_lines(), 3);
        // 2 shared segments + 3 + 3 unshared.
        assert_eq!(store.count_active(), 8);
    }

    #[test]
    fn every_segment_is_queryable_from_the_index() {
        let pipeline = Pipeline::decompose(adjacent_squares_with_midpoint()).unwrap();
        let whole = AABB::from_corners([-1.0, -1.0], [3.0, 2.0]);
        let mut hits: Vec<Guid> = pipeline.index().query(&whole).collect();
        hits.sort_unstable();
        hits.dedup();
        assert_eq!(hits.len(), pipeline.store().count_active());
    }

    #[test]
    fn disjoint_features_produce_no_shared_lines() {
        let layer = Layer::from_shapes(vec![square(0.0, 0.0, 1.0), square(5.0, 0.0, 1.0)]);
        let pipeline = Pipeline::decompose(layer).unwrap();
        let shared = pipeline
            .store()
            .segments_of_feature(FeatureId(0))
            .filter(|segment| segment.is_shared())
            .count();
        assert_eq!(shared, 0);
        // Each square keeps its full closed boundary.
        assert_eq!(pipeline.store().count_active(), 8);
    }

    #[test]
    fn corner_touch_produces_no_shared_lines() {
        let layer = Layer::from_shapes(vec![square(0.0, 0.0, 1.0), square(1.0, 1.0, 1.0)]);
        let pipeline = Pipeline::decompose(layer).unwrap();
        let shared = pipeline
            .store()
            .segments_of_feature(FeatureId(0))
            .filter(|segment| segment.is_shared())
            .count();
        assert_eq!(shared, 0);
    }

    #[test]
    fn middle_of_three_in_a_row_borders_both_sides() {
        let layer = Layer::from_shapes(vec![
            square(0.0, 0.0, 1.0),
            square(1.0, 0.0, 1.0),
            square(2.0, 0.0, 1.0),
        ]);
        let pipeline = Pipeline::decompose(layer).unwrap();
        let store = pipeline.store();

        let owners: Vec<Option<FeatureId>> = store
            .segments_of_feature(FeatureId(1))
            .filter(|segment| segment.is_shared())
            .map(|segment| segment.owner2)
            .collect();
        assert!(owners.contains(&Some(FeatureId(1))));
        assert!(owners.contains(&Some(FeatureId(2))));

        // Both shared edges exist and total length 2.
        let shared_length: f64 = store
            .segments_of_feature(FeatureId(1))
            .filter(|segment| segment.is_shared())
            .map(|segment| segment.as_line().euclidean_length())
            .sum();
        assert_relative_eq!(shared_length, 2.0);
    }

    #[test]
    fn length_audit_holds_for_a_grid() {
        let layer = Layer::from_shapes(vec![
            square(0.0, 0.0, 1.0),
            square(1.0, 0.0, 1.0),
            square(0.0, 1.0, 1.0),
            square(1.0, 1.0, 1.0),
        ]);
        // Decompose runs the audit internally; reaching here means it held.
        let pipeline = Pipeline::decompose(layer).unwrap();
        assert_eq!(pipeline.store().count_lines(), 4 + 4);
    }

    #[test]
    fn empty_layer_decomposes_to_nothing() {
        let pipeline = Pipeline::decompose(Layer::from_shapes(Vec::new())).unwrap();
        assert_eq!(pipeline.store().count_active(), 0);
        assert_eq!(pipeline.store().count_lines(), 0);
    }
}
