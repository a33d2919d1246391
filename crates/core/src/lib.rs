//! # Downtown Core
//!
//! Core types, traits and I/O for downtown delineation.
//!
//! This crate provides:
//! - `Town` / `Poi`: inputs delivered by the geometry provider
//! - `HexGrid`: hexagonal tessellation over a point extent
//! - `CRS`: coordinate reference system tagging
//! - `CorrectionTable`: declared fixes to provider geometry
//! - GeoJSON reading and atomic artifact publication
//! - Algorithm traits for consistent API

pub mod corrections;
pub mod crs;
pub mod error;
pub mod hexgrid;
pub mod io;
pub mod town;
pub mod vector;

pub use corrections::{Correction, CorrectionAction, CorrectionTable};
pub use crs::CRS;
pub use error::{Error, ErrorKind, Result};
pub use hexgrid::{HexCell, HexGrid, HexIndex, HexLattice};
pub use town::{Poi, Town, TownId};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::hexgrid::{HexCell, HexGrid, HexIndex};
    pub use crate::town::{Poi, Town, TownId};
    pub use crate::Algorithm;
}

/// Core trait for the stages of the delineation.
///
/// Stages are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
