//! The ordered, durable segment collection.
//!
//! The store is the single source of truth for all boundary linework from
//! decomposition through reassembly.  Segments are appended once, then
//! either collapsed in place (endpoint update) or tombstoned; guids are
//! never reused, so every index kept elsewhere stays valid for the whole
//! run.

use geo::Coord;
use rstar::AABB;

use crate::geom::segment_envelope;
use crate::store::{FeatureId, Guid, LineId, Segment};

/// Append-only collection of boundary segments with per-line and per-owner
/// indices.
#[derive(Debug)]
pub struct SegmentStore {
    /// All segments ever inserted, addressed by `guid - 1`.
    segments: Vec<Segment>,
    /// Guids per line, ascending by construction.
    by_line: Vec<Vec<Guid>>,
    /// Guids per owning feature (either side of a shared border).
    by_owner: Vec<Vec<Guid>>,
}

impl SegmentStore {
    /// Create an empty store for a layer of `num_features` features.
    pub fn new(num_features: usize) -> Self {
        Self {
            segments: Vec::new(),
            by_line: Vec::new(),
            by_owner: vec![Vec::new(); num_features],
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Reserve the next line identifier.
    pub fn allocate_line_id(&mut self) -> LineId {
        let id = LineId(self.by_line.len() as u32);
        self.by_line.push(Vec::new());
        id
    }

    /// Append a segment and return its guid.
    pub fn insert(
        &mut self,
        owner1: FeatureId,
        owner2: Option<FeatureId>,
        line_id: LineId,
        start: Coord<f64>,
        end: Coord<f64>,
    ) -> Guid {
        let guid = Guid(self.segments.len() as u64 + 1);
        self.segments.push(Segment {
            guid,
            owner1,
            owner2,
            line_id,
            start,
            end,
            removed: false,
        });
        self.by_line[line_id.0 as usize].push(guid);
        self.by_owner[owner1.0 as usize].push(guid);
        if let Some(owner2) = owner2 {
            self.by_owner[owner2.0 as usize].push(guid);
        }
        guid
    }

    /// Tombstone a segment.  Its guid and record remain addressable.
    pub fn mark_removed(&mut self, guid: Guid) {
        self.segments[guid.0 as usize - 1].removed = true;
    }

    /// Move a live segment's endpoints.
    pub fn update_endpoints(&mut self, guid: Guid, start: Coord<f64>, end: Coord<f64>) {
        let segment = &mut self.segments[guid.0 as usize - 1];
        debug_assert!(!segment.removed, "updating a removed segment");
        segment.start = start;
        segment.end = end;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The segment record for `guid`.
    #[inline]
    pub fn get(&self, guid: Guid) -> &Segment {
        &self.segments[guid.0 as usize - 1]
    }

    /// Live segments of one line, ascending by guid.
    pub fn segments_of_line(&self, line_id: LineId) -> impl Iterator<Item = &Segment> {
        self.by_line[line_id.0 as usize]
            .iter()
            .map(|&guid| self.get(guid))
            .filter(|segment| !segment.removed)
    }

    /// Live segments owned by `feature` from either side.
    pub fn segments_of_feature(&self, feature: FeatureId) -> impl Iterator<Item = &Segment> {
        self.by_owner[feature.0 as usize]
            .iter()
            .map(|&guid| self.get(guid))
            .filter(|segment| !segment.removed)
    }

    /// All line identifiers allocated so far.
    pub fn line_ids(&self) -> impl Iterator<Item = LineId> {
        (0..self.by_line.len() as u32).map(LineId)
    }

    /// Live `(guid, envelope)` pairs, for spatial-index rebuilds.
    pub fn active_envelopes(&self) -> impl Iterator<Item = (Guid, AABB<[f64; 2]>)> + '_ {
        self.segments
            .iter()
            .filter(|segment| !segment.removed)
            .map(|segment| (segment.guid, segment_envelope(segment.start, segment.end)))
    }

    /// Number of live segments.
    pub fn count_active(&self) -> usize {
        self.segments.iter().filter(|segment| !segment.removed).count()
    }

    /// Number of lines allocated.
    #[inline]
    pub fn count_lines(&self) -> usize {
        self.by_line.len()
    }

    /// Number of features the store was sized for.
    #[inline]
    pub fn num_features(&self) -> usize {
        self.by_owner.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
