#![doc = "Linework public API"]

mod geom;
mod io;
mod pipeline;
mod store;

pub mod cli;
pub mod commands;

#[doc(inline)]
pub use geom::{boundary, crosses, linemerge, polygonize, shared_border, subtract_lines};

#[doc(inline)]
pub use io::{error_sink_path, read_layer, AttrValue, Feature, FieldDef, FieldKind, Layer, LayerSink};

#[doc(inline)]
pub use pipeline::{Pipeline, Reassembled};

#[doc(inline)]
pub use store::{FeatureId, Guid, LineId, Segment, SegmentIndex, SegmentStore};
