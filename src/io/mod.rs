//! Vector layer I/O: format-agnostic layer model, readers and writers.
//!
//! Formats are selected by file extension (`.shp` for ESRI Shapefile,
//! `.json`/`.geojson` for GeoJSON) on both the read and write side.

mod convert;
mod layer;
mod sink;
mod source;

pub use layer::{AttrValue, Feature, FieldDef, FieldKind, Layer};
pub use sink::{error_sink_path, LayerSink};
pub use source::read_layer;
