//! The constrained simplifier.
//!
//! Visvalingam-style apex removal over the segment store: within each line,
//! two consecutive segments form a triangle at their shared vertex, and
//! collapsing the vertex flattens both into one segment.  A removal is
//! applied only when the triangle's area falls below the tolerance-squared
//! threshold, neither segment was already touched this pass, and the
//! flattened segment crosses no other live segment.
//!
//! Passes repeat until one completes without a removal.  Lines that offer no
//! candidate are marked stable and never revisited; stability is monotonic,
//! so the loop terminates.

use ahash::AHashSet;
use geo::{Area, Coord, Line, Triangle};
use log::{debug, info};

use crate::geom::{crosses, segment_envelope};
use crate::store::{Guid, LineId, SegmentIndex, SegmentStore};

/// A candidate apex removal: collapsing `g1` and `g2` into
/// `g1 = (start, end)` erases a triangle of `area`.
struct Candidate {
    area: f64,
    g1: Guid,
    g2: Guid,
    start: Coord<f64>,
    end: Coord<f64>,
}

pub(super) fn simplify(store: &mut SegmentStore, index: &mut SegmentIndex, tolerance: f64) {
    let min_area = tolerance * tolerance;

    // Lines with many segments first; they take the longest to stabilize.
    let mut order: Vec<(usize, LineId)> = store
        .line_ids()
        .map(|line_id| (store.segments_of_line(line_id).count(), line_id))
        .collect();
    order.sort_by_key(|&(count, line_id)| (std::cmp::Reverse(count), line_id));

    let mut stable: AHashSet<LineId> = AHashSet::new();

    loop {
        let before = store.count_active();
        let mut preserved: AHashSet<Guid> = AHashSet::new();
        let mut popped = false;

        for &(_, line_id) in &order {
            if stable.contains(&line_id) {
                continue;
            }

            let candidates = collect_candidates(store, line_id, min_area);
            if candidates.is_empty() {
                stable.insert(line_id);
                continue;
            }

            for candidate in candidates {
                if preserved.contains(&candidate.g1) || preserved.contains(&candidate.g2) {
                    // A neighboring vertex went this pass; collapsing here
                    // too would chain segments past the cross check.
                    continue;
                }
                if candidate.start == candidate.end {
                    // Flattening would leave a zero-length segment.
                    continue;
                }

                let flattened = Line::new(candidate.start, candidate.end);
                let envelope = segment_envelope(candidate.start, candidate.end);
                let blocked = index.query(&envelope).any(|guid| {
                    if guid == candidate.g1 || guid == candidate.g2 {
                        return false;
                    }
                    let other = store.get(guid);
                    !other.removed && crosses(&flattened, &other.as_line())
                });
                if blocked {
                    debug!("line {line_id}: removal blocked by a crossing");
                    continue;
                }

                store.update_endpoints(candidate.g1, candidate.start, candidate.end);
                store.mark_removed(candidate.g2);
                index.insert(candidate.g1, envelope);
                preserved.insert(candidate.g1);
                preserved.insert(candidate.g2);
                popped = true;
            }
        }

        index.rebuild_from(store.active_envelopes());
        info!("pass reduced {before} to {} segments", store.count_active());

        if !popped {
            break;
        }
    }
}

/// Triangles below the area threshold across consecutive live segment pairs
/// of one line, smallest first.  Area ties resolve by the leading guid, so
/// candidate order is reproducible.
fn collect_candidates(store: &SegmentStore, line_id: LineId, min_area: f64) -> Vec<Candidate> {
    let segments: Vec<(Guid, Coord<f64>, Coord<f64>)> = store
        .segments_of_line(line_id)
        .map(|segment| (segment.guid, segment.start, segment.end))
        .collect();

    let mut candidates: Vec<Candidate> = segments
        .windows(2)
        .map(|pair| {
            let (g1, start, apex) = pair[0];
            let (g2, _, end) = pair[1];
            Candidate {
                area: Triangle::new(start, apex, end).unsigned_area(),
                g1,
                g2,
                start,
                end,
            }
        })
        .filter(|candidate| candidate.area < min_area)
        .collect();

    candidates.sort_by(|a, b| a.area.total_cmp(&b.area).then(a.g1.cmp(&b.g1)));
    candidates
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
