//! R-tree over segment envelopes.
//!
//! The index maps guids to axis-aligned bounding boxes.  Between rebuilds it
//! may hold stale entries for segments that were collapsed or tombstoned;
//! readers must filter query results through the store's `removed` flag and
//! current endpoints.  A full rebuild from the live store restores a clean
//! one-entry-per-segment state.

use rstar::{RTree, RTreeObject, AABB};

use crate::store::Guid;

/// An envelope entry keyed by segment guid.
#[derive(Clone, Debug)]
struct EnvelopeEntry {
    guid: Guid,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for EnvelopeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

/// Spatial index over segment envelopes.
#[derive(Debug, Default)]
pub struct SegmentIndex {
    tree: RTree<EnvelopeEntry>,
}

impl SegmentIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Add an entry.  Duplicate guids are allowed; the newest envelope and
    /// any stale ones coexist until the next rebuild.
    pub fn insert(&mut self, guid: Guid, env: AABB<[f64; 2]>) {
        self.tree.insert(EnvelopeEntry { guid, env });
    }

    /// Guids of all entries whose envelope intersects `env`.
    pub fn query<'a>(&'a self, env: &AABB<[f64; 2]>) -> impl Iterator<Item = Guid> + 'a {
        self.tree
            .locate_in_envelope_intersecting(env)
            .map(|entry| entry.guid)
    }

    /// Replace the whole tree with a bulk load of `entries`.
    pub fn rebuild_from(&mut self, entries: impl IntoIterator<Item = (Guid, AABB<[f64; 2]>)>) {
        self.tree = RTree::bulk_load(
            entries
                .into_iter()
                .map(|(guid, env)| EnvelopeEntry { guid, env })
                .collect(),
        );
    }

    /// Number of entries, stale ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
