mod bbox;
mod ops;

pub use bbox::segment_envelope;
pub(crate) use bbox::FeatureEnvelope;
pub use ops::{boundary, crosses, explode, linemerge, polygonize, shared_border, subtract_lines};
