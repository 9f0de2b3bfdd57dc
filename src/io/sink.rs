//! Layer writers: simplified polygons, and the multi-line error layer for
//! features whose reassembly failed.
//!
//! Both sinks speak the same two drivers as the readers, selected by the
//! output extension.  A sink is created with the input's field schema and
//! spatial reference, takes features one at a time, and is flushed by
//! `finish`.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use geo::{MultiLineString, MultiPolygon};
use serde_json::{json, Value};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};

use crate::io::convert::{lines_to_shp, multi_polygon_to_shp};
use crate::io::source::extension;
use crate::io::{AttrValue, FieldDef, FieldKind};

/// Column widths for shapefile attribute tables, matching the usual OGR
/// defaults.
const CHARACTER_WIDTH: u8 = 80;
const NUMERIC_WIDTH: u8 = 24;
const NUMERIC_PRECISION: u8 = 15;

enum Driver {
    Shapefile {
        writer: shapefile::Writer<BufWriter<fs::File>>,
    },
    GeoJson {
        features: Vec<Value>,
    },
}

/// A vector layer being written.  Geometry kind is per append call: the
/// output layer takes polygons, the error layer takes line soups.
pub struct LayerSink {
    path: PathBuf,
    fields: Vec<FieldDef>,
    srs: Option<String>,
    driver: Driver,
}

impl LayerSink {
    /// Create the layer at `path` with the given schema.  The driver is
    /// chosen by extension, like the readers.
    pub fn create(path: &Path, fields: &[FieldDef], srs: Option<&str>) -> Result<Self> {
        let driver = match extension(path).as_str() {
            "shp" => {
                let mut table = TableWriterBuilder::new();
                for field in fields {
                    let name = dbase_name(&field.name)?;
                    table = match field.kind {
                        FieldKind::Character => {
                            table.add_character_field(name, CHARACTER_WIDTH)
                        }
                        FieldKind::Numeric => {
                            table.add_numeric_field(name, NUMERIC_WIDTH, NUMERIC_PRECISION)
                        }
                    };
                }
                let writer = shapefile::Writer::from_path(path, table)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                Driver::Shapefile { writer }
            }
            "json" | "geojson" => Driver::GeoJson { features: Vec::new() },
            other => bail!("unsupported output extension: {other:?}"),
        };
        Ok(Self {
            path: path.to_path_buf(),
            fields: fields.to_vec(),
            srs: srs.map(str::to_string),
            driver,
        })
    }

    /// Append one polygon feature.
    pub fn append_polygon(&mut self, values: &[AttrValue], shape: &MultiPolygon<f64>) -> Result<()> {
        match &mut self.driver {
            Driver::Shapefile { writer } => {
                let record = dbase_record(&self.fields, values);
                writer
                    .write_shape_and_record(&multi_polygon_to_shp(shape), &record)
                    .context("failed to write polygon feature")?;
            }
            Driver::GeoJson { features } => {
                features.push(json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": multi_polygon_coordinates(shape),
                    },
                    "properties": json_properties(&self.fields, values),
                }));
            }
        }
        Ok(())
    }

    /// Append one multi-line feature (error layer).
    pub fn append_lines(&mut self, values: &[AttrValue], lines: &MultiLineString<f64>) -> Result<()> {
        match &mut self.driver {
            Driver::Shapefile { writer } => {
                let record = dbase_record(&self.fields, values);
                writer
                    .write_shape_and_record(&lines_to_shp(lines), &record)
                    .context("failed to write line feature")?;
            }
            Driver::GeoJson { features } => {
                let coordinates: Vec<Vec<[f64; 2]>> = lines
                    .0
                    .iter()
                    .map(|chain| chain.coords().map(|c| [c.x, c.y]).collect())
                    .collect();
                features.push(json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiLineString",
                        "coordinates": coordinates,
                    },
                    "properties": json_properties(&self.fields, values),
                }));
            }
        }
        Ok(())
    }

    /// Flush and close the layer.
    pub fn finish(self) -> Result<()> {
        match self.driver {
            Driver::Shapefile { writer } => {
                drop(writer);
                if let Some(srs) = &self.srs {
                    fs::write(self.path.with_extension("prj"), srs)
                        .context("failed to write .prj sidecar")?;
                }
            }
            Driver::GeoJson { features } => {
                let collection = json!({
                    "type": "FeatureCollection",
                    "features": features,
                });
                let bytes = serde_json::to_vec(&collection)
                    .context("failed to serialize GeoJSON")?;
                fs::write(&self.path, bytes)
                    .with_context(|| format!("failed to write {}", self.path.display()))?;
            }
        }
        Ok(())
    }
}

/// Where the error layer for `output` lives: `out.shp` -> `out.errors.shp`.
pub fn error_sink_path(output: &Path) -> PathBuf {
    output.with_extension(format!("errors.{}", extension(output)))
}

// ---------------------------------------------------------------------------
// Attribute plumbing
// ---------------------------------------------------------------------------

/// Field names in dbase tables are capped at ten bytes.
fn dbase_name(name: &str) -> Result<FieldName> {
    let truncated: String = name.chars().take(10).collect();
    FieldName::try_from(truncated.as_str())
        .map_err(|err| anyhow::anyhow!("invalid field name {name:?}: {err:?}"))
}

fn dbase_record(fields: &[FieldDef], values: &[AttrValue]) -> Record {
    let mut record = Record::default();
    for (field, value) in fields.iter().zip(values) {
        let name: String = field.name.chars().take(10).collect();
        let value = match value {
            AttrValue::Character(text) => FieldValue::Character(text.clone()),
            AttrValue::Numeric(number) => FieldValue::Numeric(*number),
        };
        record.insert(name, value);
    }
    record
}

fn json_properties(fields: &[FieldDef], values: &[AttrValue]) -> Value {
    let mut properties = serde_json::Map::new();
    for (field, value) in fields.iter().zip(values) {
        let value = match value {
            AttrValue::Character(Some(text)) => Value::String(text.clone()),
            AttrValue::Numeric(Some(number)) => json!(number),
            AttrValue::Character(None) | AttrValue::Numeric(None) => Value::Null,
        };
        properties.insert(field.name.clone(), value);
    }
    Value::Object(properties)
}

/// Standard GeoJSON nesting for a multipolygon: polygons, then rings, then
/// coordinate pairs.
fn multi_polygon_coordinates(shape: &MultiPolygon<f64>) -> Value {
    let polygons: Vec<Value> = shape
        .0
        .iter()
        .map(|polygon| {
            let mut rings: Vec<Vec<[f64; 2]>> = Vec::with_capacity(1 + polygon.interiors().len());
            rings.push(polygon.exterior().coords().map(|c| [c.x, c.y]).collect());
            for hole in polygon.interiors() {
                rings.push(hole.coords().map(|c| [c.x, c.y]).collect());
            }
            json!(rings)
        })
        .collect();
    json!(polygons)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
