//! Per-town delineation
//!
//! Runs every stage for one town as a single unit:
//!
//! ```text
//! filter -> density -> threshold -> blobs -> best blob -> finish
//! ```
//!
//! Stages are pure: the town and POIs are only read, and nothing is
//! written outside the returned value.

mod params;

pub use params::{DowntownParams, ParamsProfile};

use crate::blob::{best_blob, build_blobs, Blob};
use crate::density::{kernel_density, DensitySurface};
use crate::filter::{filter_town_points, FilteredPoints};
use crate::finish::finish_boundary;
use crate::threshold::{select_cells, ScoredCell};
use downtown_core::town::{Poi, Town, TownId};
use downtown_core::vector::{Feature, FeatureCollection};
use downtown_core::{Algorithm, Error, Result};
use geo::MultiPolygon;
use tracing::debug;

/// Delineated downtown of one town.
#[derive(Debug, Clone, PartialEq)]
pub struct Downtown {
    pub town_id: TownId,
    /// Finished boundary
    pub geometry: MultiPolygon<f64>,
    /// Id of the blob the boundary was built from
    pub blob_id: usize,
    pub n_hexes: usize,
    pub mean_z: f64,
    pub score: f64,
}

impl Downtown {
    /// GeoJSON feature with the blob metrics as properties
    pub fn to_feature(&self) -> Feature {
        let mut feature = Feature::new(self.geometry.clone())
            .with_property("town_id", self.town_id.as_str())
            .with_property("n_hexes", self.n_hexes)
            .with_property("mean_z", self.mean_z)
            .with_property("score", self.score)
            .with_property("blob_id", self.blob_id);
        feature.id = Some(self.town_id.to_string());
        feature
    }
}

/// Every intermediate result of one delineation, for inspection.
#[derive(Debug, Clone)]
pub struct Trace {
    pub filtered: FilteredPoints,
    pub density: DensitySurface,
    pub cells: Vec<ScoredCell>,
    pub blobs: Vec<Blob>,
    /// Index of the best blob in `blobs`
    pub best: usize,
    pub downtown: Downtown,
}

impl Trace {
    /// The winning blob
    pub fn best_blob(&self) -> &Blob {
        &self.blobs[self.best]
    }

    /// One feature per grid cell with its density metrics and blob id
    pub fn cell_features(&self) -> FeatureCollection {
        let grid = &self.density.grid;
        let mut collection = FeatureCollection::with_crs(grid.crs().cloned());
        for scored in &self.cells {
            let cell = &grid.cells()[scored.position];
            let mut feature = Feature::new(cell.polygon.clone())
                .with_property("row", cell.index.row as f64)
                .with_property("col", cell.index.col as f64)
                .with_property("density", scored.density)
                .with_property("z_score", scored.z_score)
                .with_property("minmax", scored.minmax)
                .with_property("retained", scored.retained)
                .with_property("blob_id", scored.blob_id);
            feature.id = Some(scored.position.to_string());
            collection.push(feature);
        }
        collection
    }
}

/// Delineate one town, keeping every intermediate stage.
///
/// # Errors
/// Any per-town error of the stages (see [`Error::is_per_town`]).
pub fn delineate_town_traced(town: &Town, pois: &[Poi], params: &DowntownParams) -> Result<Trace> {
    let filtered = filter_town_points(town, pois)?;

    let mut density = kernel_density(&filtered.points, &params.density)?;
    density.grid.set_crs(town.crs.clone());

    let mut cells = select_cells(&density.values, &params.threshold)?;
    let blobs = build_blobs(&density.grid, &mut cells)?;
    let best = best_blob(&blobs)?;

    let geometry = finish_boundary(&best.geometry, &params.finish);
    if geometry.0.is_empty() {
        return Err(Error::EmptyBoundary { blob: best.id });
    }

    debug!(
        "Town {}: blob {} of {} with {} cells",
        town.id,
        best.id,
        blobs.len(),
        best.n_hexes
    );

    let downtown = Downtown {
        town_id: town.id.clone(),
        geometry,
        blob_id: best.id,
        n_hexes: best.n_hexes,
        mean_z: best.mean_z,
        score: best.score,
    };
    // Ids are positions: blobs are numbered in the order they are built
    let best = best.id;

    Ok(Trace {
        filtered,
        density,
        cells,
        blobs,
        best,
        downtown,
    })
}

/// Delineate the downtown of one town.
///
/// # Errors
/// Any per-town error of the stages (see [`Error::is_per_town`]).
pub fn delineate_town(town: &Town, pois: &[Poi], params: &DowntownParams) -> Result<Downtown> {
    delineate_town_traced(town, pois, params).map(|trace| trace.downtown)
}

/// Downtown delineation algorithm
#[derive(Debug, Clone, Default)]
pub struct Delineation;

impl Algorithm for Delineation {
    type Input = (Town, Vec<Poi>);
    type Output = Downtown;
    type Params = DowntownParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Delineation"
    }

    fn description(&self) -> &'static str {
        "Downtown polygon from the densest connected cluster of points of interest"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        params.validate()?;
        let (town, pois) = input;
        delineate_town(&town, &pois, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area, Centroid, Contains, Point};

    fn town(id: &str, size: f64) -> Town {
        Town::new(
            id,
            MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: size, y: 0.0),
                (x: size, y: size),
                (x: 0.0, y: size),
            ]]),
        )
    }

    /// 50 POIs in the 100×100 lower-left corner, 5 scattered elsewhere
    fn corner_pois() -> Vec<Poi> {
        let mut pois: Vec<Poi> = (0..50)
            .map(|i| Poi::new(5.0 + (i % 10) as f64 * 10.0, 5.0 + (i / 10) as f64 * 20.0))
            .collect();
        pois.extend([
            Poi::new(900.0, 900.0),
            Poi::new(500.0, 700.0),
            Poi::new(800.0, 200.0),
            Poi::new(300.0, 950.0),
            Poi::new(650.0, 450.0),
        ]);
        pois
    }

    #[test]
    fn test_corner_cluster_centroid() {
        let downtown = delineate_town(&town("t", 1000.0), &corner_pois(), &DowntownParams::default()).unwrap();
        let c = downtown.geometry.centroid().unwrap();
        assert!(c.x() < 200.0 && c.y() < 200.0, "centroid {:?}", c);
        assert!(downtown.n_hexes >= 1);
        assert!(downtown.score > 0.0);
    }

    #[test]
    fn test_trace_is_consistent() {
        let trace = delineate_town_traced(&town("t", 1000.0), &corner_pois(), &DowntownParams::default()).unwrap();
        assert_eq!(trace.cells.len(), trace.density.grid.len());
        assert_eq!(trace.best_blob().id, trace.downtown.blob_id);
        assert_eq!(trace.filtered.points.len(), 55);

        // Retained cells carry a blob id, the others none
        for cell in &trace.cells {
            assert_eq!(cell.retained, cell.blob_id.is_some());
        }
        let features = trace.cell_features();
        assert_eq!(features.len(), trace.cells.len());
    }

    #[test]
    fn test_single_cell_blob_without_finishing() {
        // A tight cluster far from a sparse background keeps exactly one hot cell
        let mut pois: Vec<Poi> = (0..20)
            .map(|i| Poi::new(500.0 + (i % 5) as f64, 500.0 + (i / 5) as f64))
            .collect();
        pois.extend([Poi::new(0.0, 0.0), Poi::new(1000.0, 1000.0)]);

        let mut params = DowntownParams::default();
        params.density.bandwidth = crate::density::BandwidthRule::Fixed(40.0);
        params.finish.buffer_distance = 0.0;
        params.finish.smoothness = 0.0;

        let trace = delineate_town_traced(&town("t", 1000.0), &pois, &params).unwrap();
        let best = trace.best_blob();
        assert_eq!(best.n_hexes, 1);

        let cell = &trace.density.grid.cells()[best.cells[0]];
        assert_eq!(trace.downtown.geometry.0, vec![cell.polygon.clone()]);
        assert!(cell.polygon.contains(&Point::new(502.0, 501.5)));
    }

    #[test]
    fn test_empty_finished_boundary_names_the_blob() {
        let mut params = DowntownParams::default();
        params.finish.buffer_distance = -1000.0;
        params.finish.second_buffer = None;

        let err = delineate_town(&town("t", 1000.0), &corner_pois(), &params).unwrap_err();
        assert!(matches!(err, Error::EmptyBoundary { .. }));
        assert!(err.is_per_town());
        assert!(err.to_string().contains("empty boundary"));
    }

    #[test]
    fn test_town_without_pois_fails() {
        let err = delineate_town(&town("empty", 100.0), &[Poi::new(500.0, 500.0)], &DowntownParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoPoints { .. }));
    }

    #[test]
    fn test_stabilized_profile_is_larger() {
        let t = town("t", 1000.0);
        let pois = corner_pois();
        let v1 = delineate_town(&t, &pois, &ParamsProfile::Baseline.params()).unwrap();
        let v2 = delineate_town(&t, &pois, &ParamsProfile::Stabilized.params()).unwrap();
        assert_eq!(v1.blob_id, v2.blob_id);
        assert!(v2.geometry.unsigned_area() > v1.geometry.unsigned_area());
    }

    #[test]
    fn test_feature_properties() {
        let downtown = Delineation.execute_default((town("42", 1000.0), corner_pois())).unwrap();
        let feature = downtown.to_feature();
        assert_eq!(feature.id.as_deref(), Some("42"));
        for key in ["town_id", "n_hexes", "mean_z", "score", "blob_id"] {
            assert!(feature.get_property(key).is_some(), "missing {}", key);
        }
    }
}
