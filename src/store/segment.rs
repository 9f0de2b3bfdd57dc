//! Identifier and record types for the segment store.
//!
//! All linework is held as directed two-point segments.  Each segment knows
//! the feature (or pair of features, for a shared border) whose boundary it
//! belongs to, and the line it is a part of.  Segments are addressed by a
//! stable `Guid` that survives for the whole run; removal is a tombstone
//! flag, never a deletion.

use std::fmt;

use geo::{Coord, Line};

// ---------------------------------------------------------------------------
// Index types
// ---------------------------------------------------------------------------

/// Index of a source feature in the input layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub u32);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FeatureId({})", self.0)
    }
}

/// Unique identifier of a segment, assigned monotonically starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid(pub u64);

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Guid({})", self.0)
    }
}

/// Identifier of one contiguous polyline; groups segments into lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Segment record
// ---------------------------------------------------------------------------

/// A directed two-point line segment, the atomic unit of mutation.
///
/// `owner2` is set iff the segment lies on a border shared between two
/// features.  Direction is recorded but carries no meaning to neighbors;
/// adjacency within a line is purely by shared endpoints.
#[derive(Clone, Debug)]
pub struct Segment {
    pub guid: Guid,
    pub owner1: FeatureId,
    pub owner2: Option<FeatureId>,
    pub line_id: LineId,
    pub start: Coord<f64>,
    pub end: Coord<f64>,
    pub removed: bool,
}

impl Segment {
    /// The segment as a geo line.
    #[inline]
    pub fn as_line(&self) -> Line<f64> {
        Line::new(self.start, self.end)
    }

    /// True if `feature` owns this segment from either side.
    #[inline]
    pub fn owned_by(&self, feature: FeatureId) -> bool {
        self.owner1 == feature || self.owner2 == Some(feature)
    }

    /// True if the segment lies on a border shared between two features.
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.owner2.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
