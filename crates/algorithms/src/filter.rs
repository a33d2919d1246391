//! Point filtering: largest boundary part and point-in-polygon selection

use downtown_core::town::{Poi, Town};
use downtown_core::{Error, Result};
use geo::{Area, BoundingRect, Coord, Intersects, MultiPolygon, Polygon};
use tracing::debug;

/// Points retained for one town, with the boundary part they fall in.
#[derive(Debug, Clone)]
pub struct FilteredPoints {
    /// Largest polygon part of the town boundary
    pub part: Polygon<f64>,
    /// Index of `part` within the town's parts
    pub part_index: usize,
    /// Coordinates of the retained POIs
    pub points: Vec<Coord<f64>>,
}

/// Select the polygon part with the largest area.
///
/// Exact ties go to the part encountered first. Returns `None` when there
/// are no parts.
pub fn largest_part(parts: &MultiPolygon<f64>) -> Option<(usize, &Polygon<f64>)> {
    let mut best: Option<(usize, &Polygon<f64>, f64)> = None;
    for (i, part) in parts.0.iter().enumerate() {
        let area = part.unsigned_area();
        match best {
            // Strictly greater keeps the first of equal parts
            Some((_, _, best_area)) if area <= best_area => {}
            _ => best = Some((i, part, area)),
        }
    }
    best.map(|(i, p, _)| (i, p))
}

/// Select points inside `part`, boundary included.
pub fn points_within(part: &Polygon<f64>, pois: &[Poi]) -> Vec<Coord<f64>> {
    let Some(rect) = part.bounding_rect() else {
        return Vec::new();
    };
    let (min, max) = (rect.min(), rect.max());

    pois.iter()
        .map(|p| p.coord)
        .filter(|c| c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y)
        .filter(|c| part.intersects(c))
        .collect()
}

/// Restrict the POI collection to the largest part of a town's boundary.
///
/// # Errors
/// [`Error::NoPoints`] when the town has no parts or no POI falls inside
/// its largest part.
pub fn filter_town_points(town: &Town, pois: &[Poi]) -> Result<FilteredPoints> {
    let no_points = || Error::NoPoints {
        town: town.id.to_string(),
    };

    let (part_index, part) = largest_part(&town.parts).ok_or_else(no_points)?;
    let points = points_within(part, pois);
    debug!(
        "Town {}: part {} of {} keeps {} of {} POIs",
        town.id,
        part_index,
        town.part_count(),
        points.len(),
        pois.len()
    );

    if points.is_empty() {
        return Err(no_points());
    }

    Ok(FilteredPoints {
        part: part.clone(),
        part_index,
        points,
    })
}
