//! The in-memory layer model: field schema, attribute values, features.

use geo::MultiPolygon;

/// Logical attribute type shared by both drivers.  Integers and floats
/// normalize to `Numeric`; booleans and text to `Character`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Character,
    Numeric,
}

/// One column of the attribute table.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

/// One attribute value; `None` payloads are nulls.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Character(Option<String>),
    Numeric(Option<f64>),
}

/// One source polygon with its attribute values, immutable after load.
#[derive(Clone, Debug)]
pub struct Feature {
    pub values: Vec<AttrValue>,
    pub shape: MultiPolygon<f64>,
}

/// A polygon layer: schema, features, and an opaque spatial reference
/// carried through from input to output untouched.
#[derive(Clone, Debug)]
pub struct Layer {
    pub fields: Vec<FieldDef>,
    pub features: Vec<Feature>,
    pub srs: Option<String>,
}

impl Layer {
    /// A schema-less layer over bare geometries.
    pub fn from_shapes(shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            fields: Vec::new(),
            features: shapes
                .into_iter()
                .map(|shape| Feature { values: Vec::new(), shape })
                .collect(),
            srs: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
