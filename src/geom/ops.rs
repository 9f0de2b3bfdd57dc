//! Line-level geometry operations over `geo` primitives.
//!
//! `geo`'s boolean ops work on areas; the pipeline needs the *linework* of
//! polygon relationships instead.  This module supplies those operations:
//! collinear-overlap extraction (shared borders), line difference, endpoint
//! stitching (`linemerge`), ring assembly (`polygonize`) and a strict
//! segment crossing test.  Everything is exact: overlap endpoints are always
//! copies of input vertices, never interpolated, so linework derived from
//! coincident boundaries stays bit-identical on both sides.

use ahash::AHashMap;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::winding_order::Winding;
use geo::{
    Area, Contains, Coord, InteriorPoint, Line, LineString, MultiLineString, MultiPolygon, Polygon,
};
use smallvec::SmallVec;

/// Tolerance for merging parametric intervals along one segment.  Positions
/// are normalized to `[0, 1]`, so this is scale free.
const PARAM_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

/// Every ring of the multipolygon, exteriors and holes, as closed lines.
pub fn boundary(shape: &MultiPolygon<f64>) -> MultiLineString<f64> {
    let mut rings = Vec::new();
    for polygon in &shape.0 {
        rings.push(polygon.exterior().clone());
        rings.extend(polygon.interiors().iter().cloned());
    }
    MultiLineString::new(rings)
}

/// All non-degenerate two-point segments of a line collection.
pub fn explode(lines: &MultiLineString<f64>) -> Vec<Line<f64>> {
    lines
        .0
        .iter()
        .flat_map(|chain| chain.lines())
        .filter(|line| line.start != line.end)
        .collect()
}

// ---------------------------------------------------------------------------
// Collinear overlap bookkeeping
// ---------------------------------------------------------------------------

/// A maximal run of collinear overlap along a subject segment, bounded by
/// parametric positions and the exact coordinates found there.
struct Overlap {
    t0: f64,
    t1: f64,
    c0: Coord<f64>,
    c1: Coord<f64>,
}

/// Parametric position of `pt` along `seg`: 0 at start, 1 at end.
fn param_along(seg: &Line<f64>, pt: Coord<f64>) -> f64 {
    let d = seg.delta();
    let len2 = d.x * d.x + d.y * d.y;
    if len2 == 0.0 {
        return 0.0;
    }
    ((pt.x - seg.start.x) * d.x + (pt.y - seg.start.y) * d.y) / len2
}

/// Quick envelope rejection for segment pairs.
fn envelopes_touch(a: &Line<f64>, b: &Line<f64>) -> bool {
    a.start.x.min(a.end.x) <= b.start.x.max(b.end.x)
        && b.start.x.min(b.end.x) <= a.start.x.max(a.end.x)
        && a.start.y.min(a.end.y) <= b.start.y.max(b.end.y)
        && b.start.y.min(b.end.y) <= a.start.y.max(a.end.y)
}

/// Collinear overlaps of `seg` against `others`, merged into disjoint runs
/// ordered along `seg`.
fn overlap_runs(seg: &Line<f64>, others: &[Line<f64>]) -> Vec<Overlap> {
    let mut runs: Vec<Overlap> = Vec::new();
    for other in others {
        if !envelopes_touch(seg, other) {
            continue;
        }
        let Some(LineIntersection::Collinear { intersection }) = line_intersection(*seg, *other)
        else {
            continue;
        };
        let (mut t0, mut t1) = (
            param_along(seg, intersection.start),
            param_along(seg, intersection.end),
        );
        let (mut c0, mut c1) = (intersection.start, intersection.end);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            std::mem::swap(&mut c0, &mut c1);
        }
        if t1 - t0 > PARAM_EPSILON {
            runs.push(Overlap { t0, t1, c0, c1 });
        }
    }

    runs.sort_by(|a, b| a.t0.total_cmp(&b.t0));

    let mut merged: Vec<Overlap> = Vec::new();
    for run in runs {
        match merged.last_mut() {
            Some(last) if run.t0 <= last.t1 + PARAM_EPSILON => {
                if run.t1 > last.t1 {
                    last.t1 = run.t1;
                    last.c1 = run.c1;
                }
            }
            _ => merged.push(run),
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Shared borders and line difference
// ---------------------------------------------------------------------------

/// Linework shared between the boundaries of `a` and `b`: the collinear
/// overlap of their rings, merged into maximal chains.  Point touches
/// contribute nothing.
pub fn shared_border(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiLineString<f64> {
    let b_lines = explode(&boundary(b));
    let mut pieces = Vec::new();
    for seg in explode(&boundary(a)) {
        for run in overlap_runs(&seg, &b_lines) {
            pieces.push(Line::new(run.c0, run.c1));
        }
    }
    linemerge(pieces)
}

/// Line difference: the parts of `lines` not covered by `minus`, re-merged
/// into maximal chains.
pub fn subtract_lines(
    lines: &MultiLineString<f64>,
    minus: &MultiLineString<f64>,
) -> MultiLineString<f64> {
    let minus_lines = explode(minus);
    let mut kept = Vec::new();
    for seg in explode(lines) {
        let mut cursor_t = 0.0;
        let mut cursor_c = seg.start;
        for run in overlap_runs(&seg, &minus_lines) {
            if run.t0 > cursor_t + PARAM_EPSILON {
                kept.push(Line::new(cursor_c, run.c0));
            }
            if run.t1 > cursor_t {
                cursor_t = run.t1;
                cursor_c = run.c1;
            }
        }
        if cursor_t < 1.0 - PARAM_EPSILON {
            kept.push(Line::new(cursor_c, seg.end));
        }
    }
    linemerge(kept)
}

// ---------------------------------------------------------------------------
// Linemerge
// ---------------------------------------------------------------------------

/// Key a coordinate by its exact bit pattern.  No snapping: linework is
/// only considered connected where coordinates agree to the last bit.
#[inline]
fn coord_key(c: Coord<f64>) -> (u64, u64) {
    (c.x.to_bits(), c.y.to_bits())
}

type Adjacency = AHashMap<(u64, u64), SmallVec<[(usize, bool); 2]>>;

fn next_unused(adjacency: &Adjacency, used: &[bool], at: Coord<f64>) -> Option<(usize, bool)> {
    adjacency
        .get(&coord_key(at))?
        .iter()
        .copied()
        .find(|&(index, _)| !used[index])
}

/// Stitch two-point segments that share endpoints into maximal chains.
/// Closed loops come back as closed line strings.
pub fn linemerge(segments: Vec<Line<f64>>) -> MultiLineString<f64> {
    let mut adjacency = Adjacency::default();
    for (index, seg) in segments.iter().enumerate() {
        adjacency.entry(coord_key(seg.start)).or_default().push((index, true));
        adjacency.entry(coord_key(seg.end)).or_default().push((index, false));
    }

    let mut used = vec![false; segments.len()];
    let mut chains = Vec::new();

    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let mut chain = vec![segments[seed].start, segments[seed].end];

        // Walk forward from the chain's end.
        loop {
            let Some((index, from_start)) = next_unused(&adjacency, &used, chain[chain.len() - 1])
            else {
                break;
            };
            used[index] = true;
            chain.push(if from_start { segments[index].end } else { segments[index].start });
        }

        // Walk backward from the chain's start.
        let mut head: Vec<Coord<f64>> = Vec::new();
        loop {
            let at = *head.last().unwrap_or(&chain[0]);
            let Some((index, from_start)) = next_unused(&adjacency, &used, at) else {
                break;
            };
            used[index] = true;
            head.push(if from_start { segments[index].end } else { segments[index].start });
        }
        if !head.is_empty() {
            head.reverse();
            head.extend(chain);
            chain = head;
        }

        chains.push(LineString::new(chain));
    }

    MultiLineString::new(chains)
}

// ---------------------------------------------------------------------------
// Polygonize
// ---------------------------------------------------------------------------

/// Assemble polygons from the closed rings in `lines`.  Rings enclosed by a
/// larger ring become its holes; shells come back largest first.  Linework
/// that does not close contributes nothing.
pub fn polygonize(lines: &[LineString<f64>]) -> Vec<Polygon<f64>> {
    let segments: Vec<Line<f64>> = lines
        .iter()
        .flat_map(|chain| chain.lines())
        .filter(|line| line.start != line.end)
        .collect();

    let mut rings: Vec<(f64, LineString<f64>)> = linemerge(segments)
        .0
        .into_iter()
        .filter(|chain| chain.is_closed() && chain.0.len() >= 4)
        .map(|mut ring| {
            ring.make_ccw_winding();
            let area = Polygon::new(ring.clone(), Vec::new()).unsigned_area();
            (area, ring)
        })
        .collect();

    // Largest first, so shells exist before their holes are classified.
    rings.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut shells: Vec<Polygon<f64>> = Vec::new();
    for (_, ring) in rings {
        let probe = Polygon::new(ring.clone(), Vec::new()).interior_point();
        let enclosing = probe.and_then(|pt| shells.iter_mut().find(|shell| shell.contains(&pt)));
        match enclosing {
            Some(shell) => {
                let mut hole = ring;
                hole.make_cw_winding();
                shell.interiors_push(hole);
            }
            None => shells.push(Polygon::new(ring, Vec::new())),
        }
    }
    shells
}

// ---------------------------------------------------------------------------
// Crossing test
// ---------------------------------------------------------------------------

/// Strict crossing test for two segments: true iff they meet at a single
/// point interior to both.  Endpoint touches and collinear overlaps do not
/// count.
pub fn crosses(a: &Line<f64>, b: &Line<f64>) -> bool {
    matches!(
        line_intersection(*a, *b),
        Some(LineIntersection::SinglePoint { is_proper: true, .. })
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
