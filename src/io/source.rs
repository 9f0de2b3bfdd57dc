//! Layer readers: ESRI Shapefile and GeoJSON, selected by file extension.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use log::info;
use serde_json::Value;
use shapefile::dbase::FieldValue;
use shapefile::Shape;

use crate::io::convert::multi_polygon_from_shp;
use crate::io::{AttrValue, Feature, FieldDef, FieldKind, Layer};

/// Read a polygon layer from `path`.  `.shp` opens the shapefile driver,
/// `.json`/`.geojson` the GeoJSON driver.
pub fn read_layer(path: &Path) -> Result<Layer> {
    let layer = match extension(path).as_str() {
        "shp" => read_shapefile(path)?,
        "json" | "geojson" => read_geojson(path)?,
        other => bail!("unsupported input extension: {other:?}"),
    };
    info!("loaded {} features from {}", layer.len(), path.display());
    Ok(layer)
}

pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Shapefile driver
// ---------------------------------------------------------------------------

fn read_shapefile(path: &Path) -> Result<Layer> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("failed to open shapefile {}", path.display()))?;

    let mut pairs = Vec::new();
    for entry in reader.iter_shapes_and_records() {
        pairs.push(entry.context("error reading shape and record")?);
    }

    // Schema from the first record; names sorted for a deterministic
    // column order (dbase records do not preserve one).
    let mut fields: Vec<FieldDef> = Vec::new();
    if let Some((_, record)) = pairs.first() {
        let mut columns: Vec<(String, FieldValue)> = record.clone().into_iter().collect();
        columns.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, value) in columns {
            let kind = match attr_from_dbase(&name, value)? {
                AttrValue::Character(_) => FieldKind::Character,
                AttrValue::Numeric(_) => FieldKind::Numeric,
            };
            fields.push(FieldDef { name, kind });
        }
    }

    let mut features = Vec::with_capacity(pairs.len());
    for (shape, record) in pairs {
        let shape = match shape {
            Shape::Polygon(polygon) => multi_polygon_from_shp(&polygon),
            other => bail!("unsupported shape type: {}", other.shapetype()),
        };
        let values = fields
            .iter()
            .map(|field| {
                let value = record
                    .get(&field.name)
                    .with_context(|| format!("record is missing field {:?}", field.name))?;
                attr_from_dbase(&field.name, value.clone())
            })
            .collect::<Result<Vec<_>>>()?;
        features.push(Feature { values, shape });
    }

    // The .prj sidecar rides along untouched.
    let srs = fs::read_to_string(path.with_extension("prj"))
        .ok()
        .map(|s| s.trim().to_string());

    Ok(Layer { fields, features, srs })
}

fn attr_from_dbase(name: &str, value: FieldValue) -> Result<AttrValue> {
    Ok(match value {
        FieldValue::Character(text) => AttrValue::Character(text.map(|s| s.trim().to_string())),
        FieldValue::Memo(text) => AttrValue::Character(Some(text)),
        FieldValue::Logical(flag) => {
            AttrValue::Character(flag.map(|b| if b { "T" } else { "F" }.to_string()))
        }
        FieldValue::Numeric(number) => AttrValue::Numeric(number),
        FieldValue::Float(number) => AttrValue::Numeric(number.map(f64::from)),
        FieldValue::Integer(number) => AttrValue::Numeric(Some(f64::from(number))),
        FieldValue::Double(number) => AttrValue::Numeric(Some(number)),
        other => bail!("field {name:?}: unsupported attribute type {other:?}"),
    })
}

// ---------------------------------------------------------------------------
// GeoJSON driver
// ---------------------------------------------------------------------------

fn read_geojson(path: &Path) -> Result<Layer> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to open {}", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse GeoJSON {}", path.display()))?;

    let features_json = value["features"]
        .as_array()
        .context("GeoJSON input has no feature array")?;

    // Schema from the first feature's properties (serde_json maps iterate
    // in sorted key order).
    let mut fields: Vec<FieldDef> = Vec::new();
    if let Some(first) = features_json.first() {
        if let Some(properties) = first["properties"].as_object() {
            for (name, value) in properties {
                let kind = if value.is_number() {
                    FieldKind::Numeric
                } else {
                    FieldKind::Character
                };
                fields.push(FieldDef { name: name.clone(), kind });
            }
        }
    }

    let mut features = Vec::with_capacity(features_json.len());
    for (index, feature) in features_json.iter().enumerate() {
        let geometry = &feature["geometry"];
        let shape = match geometry["type"].as_str() {
            Some("Polygon") => MultiPolygon::new(vec![parse_polygon(&geometry["coordinates"])
                .with_context(|| format!("feature {index}: bad Polygon"))?]),
            Some("MultiPolygon") => parse_multi_polygon(&geometry["coordinates"])
                .with_context(|| format!("feature {index}: bad MultiPolygon"))?,
            other => bail!("feature {index}: unsupported geometry type {other:?}"),
        };
        let empty = serde_json::Map::new();
        let properties = feature["properties"].as_object().unwrap_or(&empty);
        let values = fields
            .iter()
            .map(|field| attr_from_json(field, properties.get(&field.name)))
            .collect::<Result<Vec<_>>>()?;
        features.push(Feature { values, shape });
    }

    Ok(Layer { fields, features, srs: None })
}

fn attr_from_json(field: &FieldDef, value: Option<&Value>) -> Result<AttrValue> {
    Ok(match (field.kind, value) {
        (FieldKind::Numeric, Some(v)) => AttrValue::Numeric(v.as_f64()),
        (FieldKind::Numeric, None) => AttrValue::Numeric(None),
        (FieldKind::Character, Some(Value::String(s))) => AttrValue::Character(Some(s.clone())),
        (FieldKind::Character, Some(Value::Null)) | (FieldKind::Character, None) => {
            AttrValue::Character(None)
        }
        (FieldKind::Character, Some(v)) => AttrValue::Character(Some(v.to_string())),
    })
}

fn parse_multi_polygon(coordinates: &Value) -> Result<MultiPolygon<f64>> {
    let polygons = coordinates
        .as_array()
        .context("MultiPolygon coordinates are not an array")?
        .iter()
        .map(parse_polygon)
        .collect::<Result<Vec<_>>>()?;
    Ok(MultiPolygon::new(polygons))
}

/// A GeoJSON polygon: a ring list whose first entry is the exterior.
fn parse_polygon(coordinates: &Value) -> Result<Polygon<f64>> {
    let rings = coordinates
        .as_array()
        .context("Polygon coordinates are not an array")?
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>>>()?;
    let mut rings = rings.into_iter();
    let exterior = rings.next().context("Polygon has no exterior ring")?;
    Ok(Polygon::new(exterior, rings.collect()))
}

fn parse_ring(coordinates: &Value) -> Result<LineString<f64>> {
    let mut coords = Vec::new();
    for pair in coordinates.as_array().context("ring is not an array")? {
        let pair = pair.as_array().context("coordinate is not an array")?;
        let x = pair.first().and_then(Value::as_f64).context("coordinate x is not a number")?;
        let y = pair.get(1).and_then(Value::as_f64).context("coordinate y is not a number")?;
        coords.push(Coord { x, y });
    }
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last {
            coords.push(first);
        }
    }
    Ok(LineString::new(coords))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Area;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension(Path::new("a/b/OUT.SHP")), "shp");
        assert_eq!(extension(Path::new("out.geojson")), "geojson");
        assert_eq!(extension(Path::new("noext")), "");
    }

    #[test]
    fn geojson_polygon_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.json");
        fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature",
                 "geometry":{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]},
                 "properties":{"name":"alpha","pop":12}}
            ]}"#,
        )
        .unwrap();

        let layer = read_layer(&path).unwrap();
        assert_eq!(layer.len(), 1);
        assert_relative_eq!(layer.features[0].shape.unsigned_area(), 4.0);
        assert_eq!(
            layer.fields,
            vec![
                FieldDef { name: "name".into(), kind: FieldKind::Character },
                FieldDef { name: "pop".into(), kind: FieldKind::Numeric },
            ]
        );
        assert_eq!(
            layer.features[0].values,
            vec![
                AttrValue::Character(Some("alpha".into())),
                AttrValue::Numeric(Some(12.0)),
            ]
        );
    }

    #[test]
    fn geojson_multi_polygon_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.json");
        fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature",
                 "geometry":{"type":"MultiPolygon","coordinates":[
                    [[[0,0],[1,0],[1,1],[0,1],[0,0]]],
                    [[[5,5],[6,5],[6,6],[5,6],[5,5]]]]},
                 "properties":{}}
            ]}"#,
        )
        .unwrap();

        let layer = read_layer(&path).unwrap();
        assert_eq!(layer.features[0].shape.0.len(), 2);
        assert_relative_eq!(layer.features[0].shape.unsigned_area(), 2.0);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(read_layer(Path::new("layer.gpkg")).is_err());
    }

    #[test]
    fn missing_geometry_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.json");
        fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature",
                 "geometry":{"type":"Point","coordinates":[0,0]},
                 "properties":{}}
            ]}"#,
        )
        .unwrap();
        assert!(read_layer(&path).is_err());
    }

    #[test]
    fn open_geojson_ring_is_closed() {
        let ring = parse_ring(&serde_json::json!([[0, 0], [1, 0], [1, 1]])).unwrap();
        assert!(ring.is_closed());
    }
}
