//! The decompose -> simplify -> reassemble pipeline.

mod decompose;
mod reassemble;
mod simplify;

pub use reassemble::Reassembled;

use anyhow::Result;

use crate::io::Layer;
use crate::store::{SegmentIndex, SegmentStore};

/// Pipeline context: the source layer plus the segment store and spatial
/// index derived from it.  All mutable state lives here and is threaded
/// explicitly; there are no globals.
pub struct Pipeline {
    layer: Layer,
    store: SegmentStore,
    index: SegmentIndex,
}

impl Pipeline {
    /// Decompose the layer's polygon boundaries into shared and unshared
    /// lines, populating the store and the spatial index.
    ///
    /// Fails if the input is not a planar subdivision (the per-feature
    /// length audit catches boundaries that do not decompose cleanly).
    pub fn decompose(layer: Layer) -> Result<Self> {
        decompose::decompose(layer)
    }

    /// Collapse every apex vertex whose triangle falls below `tolerance`
    /// squared, as far as the crossing constraints allow.  Tolerances may
    /// be applied in ascending sequence on the same pipeline; each call
    /// continues from the already-simplified state.
    pub fn simplify(&mut self, tolerance: f64) {
        simplify::simplify(&mut self.store, &mut self.index, tolerance);
    }

    /// Rebuild each feature's polygon from its surviving segments.
    /// `tolerance` only scales the lost-portion classification of features
    /// that fail to polygonize.
    pub fn reassemble(&self, tolerance: f64) -> Vec<Reassembled> {
        reassemble::reassemble(&self.store, &self.layer.features, tolerance)
    }

    /// The source layer, unchanged since load.
    #[inline]
    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    /// The segment store backing the pipeline.
    #[inline]
    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    /// The spatial index over live segment envelopes.
    #[inline]
    pub(crate) fn index(&self) -> &SegmentIndex {
        &self.index
    }

    pub(crate) fn from_parts(layer: Layer, store: SegmentStore, index: SegmentIndex) -> Self {
        Self { layer, store, index }
    }
}
