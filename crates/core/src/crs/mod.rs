//! Coordinate Reference System tagging
//!
//! The delineation works in projected units (buffer distances, cell sizes),
//! so the CRS is carried as a tag from input to output and checked for
//! consistency; no reprojection happens here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG codes of common geographic (degree-based) systems.
const GEOGRAPHIC_EPSG: [u32; 3] = [4326, 4269, 4267];

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CRS {
    /// EPSG code if known
    epsg: Option<u32>,
    /// Name as it appeared in the input when it could not be parsed
    name: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            name: None,
        }
    }

    /// Parse a CRS name as found in GeoJSON `crs` members.
    ///
    /// Accepts `EPSG:5070`, `urn:ogc:def:crs:EPSG::5070` and
    /// `urn:ogc:def:crs:OGC:1.3:CRS84`. Anything else is kept verbatim.
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.ends_with("CRS84") {
            return Self::from_epsg(4326);
        }
        let code = trimmed
            .rsplit(':')
            .next()
            .filter(|_| trimmed.to_ascii_uppercase().contains("EPSG"))
            .and_then(|c| c.parse::<u32>().ok());
        match code {
            Some(code) => Self::from_epsg(code),
            None => Self {
                epsg: None,
                name: Some(trimmed.to_string()),
            },
        }
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Whether this is a known geographic (lon/lat) system.
    ///
    /// Distances in such systems are degrees, which makes every
    /// distance parameter of the delineation meaningless.
    pub fn is_geographic(&self) -> bool {
        self.epsg.is_some_and(|c| GEOGRAPHIC_EPSG.contains(&c))
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.name, &other.name) {
            return a == b;
        }
        false
    }

    /// OGC URN used when writing GeoJSON `crs` members
    pub fn urn(&self) -> String {
        match (self.epsg, &self.name) {
            (Some(code), _) => format!("urn:ogc:def:crs:EPSG::{}", code),
            (None, Some(name)) => name.clone(),
            (None, None) => "Unknown".to_string(),
        }
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        self.name.clone().unwrap_or_else(|| "Unknown".to_string())
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
