//! Reading inputs and publishing outputs
//!
//! Inputs are GeoJSON feature collections produced by the upstream
//! geometry provider. Outputs are written all-or-nothing: a temporary file
//! is created next to the destination, flushed, synced and then renamed
//! over it, so readers never observe a partially written artifact.

mod atomic;

pub use atomic::{write_atomic, write_json_atomic};

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::town::{Poi, Town};
use crate::vector::geojson;
use crate::vector::FeatureCollection;
use geo::{Geometry, MultiPolygon};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Read a GeoJSON FeatureCollection from disk.
pub fn read_feature_collection(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    geojson::parse_collection(&text)
        .map_err(|e| Error::InvalidGeoJson(format!("{}: {}", path.display(), e)))
}

/// Write a FeatureCollection as GeoJSON, atomically.
pub fn write_feature_collection(collection: &FeatureCollection, path: impl AsRef<Path>) -> Result<()> {
    let text = geojson::to_string(collection)?;
    write_atomic(path, text.as_bytes())
}

/// Extract towns from a feature collection.
///
/// The town id is read from `id_property`, falling back to the feature id.
/// Features without an id or without polygonal geometry are rejected, as
/// are duplicate ids: these are upstream precondition violations.
pub fn towns_from_collection(collection: &FeatureCollection, id_property: &str) -> Result<Vec<Town>> {
    let mut seen = HashSet::new();
    let mut towns = Vec::with_capacity(collection.len());

    for (i, feature) in collection.iter().enumerate() {
        let id = feature
            .get_property(id_property)
            .and_then(|v| v.as_key())
            .or_else(|| feature.id.clone())
            .ok_or_else(|| {
                Error::InvalidGeoJson(format!("town feature {} has no '{}'", i, id_property))
            })?;

        let parts = match &feature.geometry {
            Some(Geometry::Polygon(p)) => MultiPolygon::new(vec![p.clone()]),
            Some(Geometry::MultiPolygon(mp)) => mp.clone(),
            _ => {
                return Err(Error::InvalidGeoJson(format!(
                    "town {} is not a Polygon or MultiPolygon",
                    id
                )))
            }
        };

        if !seen.insert(id.clone()) {
            return Err(Error::InvalidGeoJson(format!("duplicate town id {}", id)));
        }

        let mut town = Town::new(id, parts);
        town.crs = collection.crs.clone();
        town.properties = feature.properties.clone();
        towns.push(town);
    }

    Ok(towns)
}

/// Extract POIs from a feature collection.
///
/// MultiPoint features contribute one POI per member. Features with other
/// geometry types (or none) are skipped with a warning.
pub fn pois_from_collection(collection: &FeatureCollection) -> Vec<Poi> {
    let mut pois = Vec::with_capacity(collection.len());
    let mut skipped = 0usize;

    for feature in collection.iter() {
        let coords: Vec<_> = match &feature.geometry {
            Some(Geometry::Point(p)) => vec![p.0],
            Some(Geometry::MultiPoint(mp)) => mp.0.iter().map(|p| p.0).collect(),
            _ => {
                skipped += 1;
                continue;
            }
        };
        for coord in coords {
            pois.push(Poi {
                id: feature.id.clone(),
                coord,
                properties: feature.properties.clone(),
            });
        }
    }

    if skipped > 0 {
        warn!("Skipped {} POI features without point geometry", skipped);
    }
    pois
}

/// Read towns from a GeoJSON file.
pub fn read_towns(path: impl AsRef<Path>, id_property: &str) -> Result<Vec<Town>> {
    let collection = read_feature_collection(path)?;
    let towns = towns_from_collection(&collection, id_property)?;
    debug!("Read {} towns", towns.len());
    Ok(towns)
}

/// Read POIs from a GeoJSON file, together with its declared CRS.
pub fn read_pois(path: impl AsRef<Path>) -> Result<(Vec<Poi>, Option<CRS>)> {
    let collection = read_feature_collection(path)?;
    let pois = pois_from_collection(&collection);
    debug!("Read {} POIs", pois.len());
    Ok((pois, collection.crs))
}
