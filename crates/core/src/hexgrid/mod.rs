//! Hexagonal grid data structures

mod grid;
mod lattice;

pub use grid::{HexCell, HexGrid};
pub use lattice::{HexIndex, HexLattice};
