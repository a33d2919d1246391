//! # Downtown Algorithms
//!
//! The stages of downtown delineation, in pipeline order.
//!
//! ## Stages
//!
//! - **filter**: largest boundary part, POIs inside it
//! - **density**: kernel density on a hexagonal grid
//! - **threshold**: z-score and min-max standardization, retained cells
//! - **blob**: connected clusters of retained cells, scoring, best blob
//! - **finish**: buffer and smoothing of the best blob
//! - **pipeline**: all stages for one town, parameters and profiles

pub mod blob;
pub mod density;
pub mod filter;
pub mod finish;
pub(crate) mod maybe_rayon;
pub mod pipeline;
pub mod threshold;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::blob::{best_blob, build_blobs, Blob};
    pub use crate::density::{kernel_density, BandwidthRule, DensityParams, Kernel, KernelDensity};
    pub use crate::filter::{filter_town_points, largest_part, FilteredPoints};
    pub use crate::finish::{finish_boundary, FinishParams};
    pub use crate::pipeline::{
        delineate_town, delineate_town_traced, Delineation, Downtown, DowntownParams, ParamsProfile, Trace,
    };
    pub use crate::threshold::{select_cells, DegeneratePolicy, ScoredCell, ThresholdParams};
    pub use downtown_core::prelude::*;
}
