//! Town boundaries and points of interest
//!
//! These are the inputs delivered by the geometry provider: cleaned town
//! polygons and POI points, both in the same projected coordinate system.

use crate::crs::CRS;
use crate::vector::AttributeValue;
use geo::{Coord, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a town, unique within one batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TownId(String);

impl TownId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TownId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TownId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TownId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A town boundary made of one or more polygon parts.
#[derive(Debug, Clone)]
pub struct Town {
    pub id: TownId,
    /// Polygon parts in input order
    pub parts: MultiPolygon<f64>,
    pub crs: Option<CRS>,
    pub properties: HashMap<String, AttributeValue>,
}

impl Town {
    pub fn new(id: impl Into<TownId>, parts: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            parts,
            crs: None,
            properties: HashMap::new(),
        }
    }

    /// Number of polygon parts
    pub fn part_count(&self) -> usize {
        self.parts.0.len()
    }
}

/// A point of interest. Read-only input.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: Option<String>,
    pub coord: Coord<f64>,
    pub properties: HashMap<String, AttributeValue>,
}

impl Poi {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            id: None,
            coord: Coord { x, y },
            properties: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_town_id_serializes_as_string() {
        let id = TownId::new("1714000");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1714000\"");
        assert_eq!(id.to_string(), "1714000");
    }

    #[test]
    fn test_town_parts() {
        let part = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let town = Town::new("a", MultiPolygon::new(vec![part.clone(), part]));
        assert_eq!(town.part_count(), 2);
        assert_eq!(town.id.as_str(), "a");
    }

    #[test]
    fn test_poi_builder() {
        let poi = Poi::new(3.0, 4.0).with_id("p1");
        assert_eq!(poi.id.as_deref(), Some("p1"));
        assert_eq!(poi.coord, Coord { x: 3.0, y: 4.0 });
    }
}
