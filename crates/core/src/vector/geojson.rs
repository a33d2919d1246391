//! GeoJSON (RFC 7946) data types.
//!
//! Lightweight serde models covering the subset used here: Point,
//! MultiPoint, LineString, Polygon and MultiPolygon geometries, feature
//! properties, and the legacy named `crs` member still emitted by most
//! desktop GIS tools for projected data.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo::{Coord, Geometry, LineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GeoJSON position: `[x, y]` or `[x, y, z]`.
pub type Position = Vec<f64>;

// ---------------------------------------------------------------------------
// Wire models
// ---------------------------------------------------------------------------

/// GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeometryObject {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

/// GeoJSON feature object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureObject {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    pub geometry: Option<GeometryObject>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// Legacy named CRS member (`{"type": "name", "properties": {"name": ...}}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedCrs {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: NamedCrsProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedCrsProperties {
    pub name: String,
}

/// GeoJSON feature collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollectionObject {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<NamedCrs>,

    pub features: Vec<FeatureObject>,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        _ => Err(Error::geojson(format!("invalid position {:?}", position))),
    }
}

fn line_string(positions: &[Position]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| line_string(r));
    let exterior = rings
        .next()
        .ok_or_else(|| Error::geojson("polygon without exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    // Polygon::new closes open rings
    Ok(Polygon::new(exterior, interiors))
}

impl GeometryObject {
    /// Convert to a `geo` geometry.
    pub fn to_geometry(&self) -> Result<Geometry<f64>> {
        Ok(match self {
            GeometryObject::Point { coordinates } => Geometry::Point(Point::from(coord(coordinates)?)),
            GeometryObject::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint::new(
                coordinates
                    .iter()
                    .map(|p| coord(p).map(Point::from))
                    .collect::<Result<Vec<_>>>()?,
            )),
            GeometryObject::LineString { coordinates } => {
                Geometry::LineString(line_string(coordinates)?)
            }
            GeometryObject::Polygon { coordinates } => Geometry::Polygon(polygon(coordinates)?),
            GeometryObject::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon::new(
                coordinates
                    .iter()
                    .map(|p| polygon(p))
                    .collect::<Result<Vec<_>>>()?,
            )),
        })
    }
}

impl FeatureObject {
    /// Convert to a [`Feature`].
    pub fn to_feature(&self) -> Result<Feature> {
        let geometry = self.geometry.as_ref().map(|g| g.to_geometry()).transpose()?;
        let properties = self
            .properties
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
            .collect();
        let id = self
            .id
            .as_ref()
            .and_then(|v| AttributeValue::from_json(v).as_key());
        Ok(Feature {
            geometry,
            properties,
            id,
        })
    }
}

impl FeatureCollectionObject {
    /// Convert to a [`FeatureCollection`].
    pub fn to_collection(&self) -> Result<FeatureCollection> {
        if self.kind != "FeatureCollection" {
            return Err(Error::geojson(format!(
                "expected a FeatureCollection, found {}",
                self.kind
            )));
        }
        let features = self
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| {
                f.to_feature()
                    .map_err(|e| Error::geojson(format!("feature {}: {}", i, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureCollection {
            features,
            crs: self.crs.as_ref().map(|c| CRS::from_name(&c.properties.name)),
        })
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn position(c: &Coord<f64>) -> Position {
    vec![c.x, c.y]
}

fn ring(ls: &LineString<f64>) -> Vec<Position> {
    ls.0.iter().map(position).collect()
}

fn rings(p: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(p.exterior())
        .chain(p.interiors())
        .map(ring)
        .collect()
}

impl GeometryObject {
    /// Encode a `geo` geometry. Returns `None` for geometry types that
    /// are never produced here (lines, rectangles, collections).
    pub fn from_geometry(geometry: &Geometry<f64>) -> Option<Self> {
        Some(match geometry {
            Geometry::Point(p) => GeometryObject::Point {
                coordinates: position(&p.0),
            },
            Geometry::MultiPoint(mp) => GeometryObject::MultiPoint {
                coordinates: mp.0.iter().map(|p| position(&p.0)).collect(),
            },
            Geometry::LineString(ls) => GeometryObject::LineString {
                coordinates: ring(ls),
            },
            Geometry::Polygon(p) => GeometryObject::Polygon {
                coordinates: rings(p),
            },
            Geometry::MultiPolygon(mp) => GeometryObject::MultiPolygon {
                coordinates: mp.0.iter().map(rings).collect(),
            },
            _ => return None,
        })
    }
}

fn attribute_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Int(i) => Value::from(*i),
        // Non-finite floats have no JSON representation
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AttributeValue::String(s) => Value::String(s.clone()),
    }
}

impl FeatureObject {
    pub fn from_feature(feature: &Feature) -> Self {
        // Sorted keys keep the output byte-stable across runs
        let mut keys: Vec<&String> = feature.properties.keys().collect();
        keys.sort();
        let properties = keys
            .into_iter()
            .map(|k| (k.clone(), attribute_json(&feature.properties[k])))
            .collect();
        Self {
            kind: "Feature".to_string(),
            id: feature.id.clone().map(Value::String),
            geometry: feature
                .geometry
                .as_ref()
                .and_then(GeometryObject::from_geometry),
            properties: Some(properties),
        }
    }
}

impl FeatureCollectionObject {
    pub fn from_collection(collection: &FeatureCollection) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            crs: collection.crs.as_ref().map(|crs| NamedCrs {
                kind: "name".to_string(),
                properties: NamedCrsProperties { name: crs.urn() },
            }),
            features: collection.iter().map(FeatureObject::from_feature).collect(),
        }
    }
}

/// Parse a GeoJSON FeatureCollection from a string.
pub fn parse_collection(text: &str) -> Result<FeatureCollection> {
    let object: FeatureCollectionObject = serde_json::from_str(text)?;
    object.to_collection()
}

/// Serialize a FeatureCollection as GeoJSON.
pub fn to_string(collection: &FeatureCollection) -> Result<String> {
    Ok(serde_json::to_string(&FeatureCollectionObject::from_collection(collection))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    const TOWNS: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::5070" } },
        "features": [
            {
                "type": "Feature",
                "properties": { "town_id": "1714000", "name": "Somewhere" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
                }
            },
            {
                "type": "Feature",
                "id": 42,
                "properties": null,
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                        [[[5, 5], [6, 5], [6, 6, 3.5], [5, 5]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_collection() {
        let fc = parse_collection(TOWNS).unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.crs.as_ref().and_then(|c| c.epsg()), Some(5070));

        let first = &fc.features[0];
        assert_eq!(
            first.get_property("town_id"),
            Some(&AttributeValue::String("1714000".into()))
        );
        assert!(matches!(first.geometry, Some(Geometry::Polygon(_))));

        let second = &fc.features[1];
        assert_eq!(second.id.as_deref(), Some("42"));
        match &second.geometry {
            Some(Geometry::MultiPolygon(mp)) => assert_eq!(mp.0.len(), 2),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_collection() {
        let text = r#"{ "type": "Feature", "features": [] }"#;
        assert!(parse_collection(text).is_err());
    }

    #[test]
    fn test_rejects_short_position() {
        let text = r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [1] } }
        ] }"#;
        let err = parse_collection(text).unwrap_err();
        assert!(err.to_string().contains("feature 0"));
    }

    #[test]
    fn test_polygon_roundtrip() {
        let poly = polygon![
            (x: 0.5, y: 0.25),
            (x: 100.125, y: 0.0),
            (x: 100.0, y: 50.75),
            (x: 0.0, y: 50.0),
        ];
        let mut fc = FeatureCollection::with_crs(Some(CRS::from_epsg(5070)));
        fc.push(Feature::new(poly.clone()).with_property("town_id", "a"));

        let text = to_string(&fc).unwrap();
        let back = parse_collection(&text).unwrap();

        assert_eq!(back.crs, fc.crs);
        assert_eq!(back.features[0].geometry, Some(Geometry::Polygon(poly)));
        assert_eq!(
            back.features[0].get_property("town_id"),
            Some(&AttributeValue::from("a"))
        );
    }

    #[test]
    fn test_nan_property_encodes_as_null() {
        let mut fc = FeatureCollection::new();
        fc.push(Feature::new(Point::new(0.0, 0.0)).with_property("v", f64::NAN));
        let text = to_string(&fc).unwrap();
        assert!(text.contains("\"v\":null"));
    }
}
