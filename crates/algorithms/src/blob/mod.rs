//! Blob extraction and scoring
//!
//! A blob is a maximal set of retained cells connected through shared
//! hexagon edges.

mod builder;
mod scorer;

pub use builder::build_blobs;
pub use scorer::{best_blob, BlobMetrics};

use geo::MultiPolygon;
use serde::Serialize;

/// A connected cluster of retained cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Blob {
    /// Sequential id in row-major encounter order
    pub id: usize,
    /// Grid positions of the member cells, ascending
    pub cells: Vec<usize>,
    /// Union of the member cell polygons
    #[serde(skip)]
    pub geometry: MultiPolygon<f64>,
    pub n_hexes: usize,
    pub mean_z: f64,
    pub score: f64,
}
