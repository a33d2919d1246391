//! Hexagonal grid covering a rectangular extent

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::hexgrid::{HexIndex, HexLattice};
use geo::{Coord, Intersects, Line, Point, Polygon, Rect};
use ndarray::Array2;

/// A single hexagonal cell of a [`HexGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    /// Lattice index
    pub index: HexIndex,
    /// Cell center in projected coordinates
    pub center: Coord<f64>,
    /// Closed hexagon outline
    pub polygon: Polygon<f64>,
}

/// A finite set of hexagonal cells tiling a rectangular extent.
///
/// Cells are stored in row-major lattice order (row, then column), which
/// is the encounter order used by every downstream labelling step. The
/// cells are non-overlapping and jointly cover the extent passed to
/// [`HexGrid::covering`].
///
/// # Example
///
/// ```ignore
/// use downtown_core::hexgrid::HexGrid;
/// use geo::{coord, Rect};
///
/// let extent = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1000.0, y: 1000.0 });
/// let grid = HexGrid::covering(extent, 100.0)?;
/// assert!(grid.len() > 100);
/// ```
#[derive(Debug, Clone)]
pub struct HexGrid {
    lattice: HexLattice,
    cells: Vec<HexCell>,
    /// Lattice (row, col) shifted by `offset` -> position in `cells`
    lookup: Array2<Option<usize>>,
    offset: (i32, i32),
    crs: Option<CRS>,
}

impl HexGrid {
    /// Build the grid of all cells intersecting `extent`.
    ///
    /// The lattice origin is the lower-left corner of the extent. A
    /// degenerate extent (a single point or a segment) is valid and yields
    /// the few cells touching it.
    pub fn covering(extent: Rect<f64>, cell_size: f64) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(Error::InvalidParameter {
                name: "cell_size",
                value: cell_size.to_string(),
                reason: "must be a positive finite number".into(),
            });
        }
        let (min, max) = (extent.min(), extent.max());
        if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
            return Err(Error::Other("grid extent is not finite".into()));
        }

        let lattice = HexLattice::new(min.x, min.y, cell_size);

        // One cell of margin on every side is enough to reach any cell
        // whose outline crosses the extent.
        let max_row = ((max.y - min.y) / lattice.row_spacing()).ceil() as i32 + 1;
        let max_col = ((max.x - min.x) / cell_size).ceil() as i32 + 1;
        let offset = (-1, -1);

        let rows = (max_row - offset.0 + 1) as usize;
        let cols = (max_col - offset.1 + 1) as usize;
        let mut lookup = Array2::from_elem((rows, cols), None);
        let mut cells = Vec::new();

        for row in offset.0..=max_row {
            for col in offset.1..=max_col {
                let index = HexIndex::new(row, col);
                let polygon = lattice.polygon(index);
                if !touches_extent(&polygon, &extent) {
                    continue;
                }
                lookup[((row - offset.0) as usize, (col - offset.1) as usize)] = Some(cells.len());
                cells.push(HexCell {
                    index,
                    center: lattice.center(index),
                    polygon,
                });
            }
        }

        Ok(Self {
            lattice,
            cells,
            lookup,
            offset,
            crs: None,
        })
    }

    // Dimensions

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    // Access

    /// Lattice geometry shared by all cells
    pub fn lattice(&self) -> &HexLattice {
        &self.lattice
    }

    /// All cells in row-major lattice order
    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    /// Cell at a position
    pub fn cell(&self, position: usize) -> Option<&HexCell> {
        self.cells.get(position)
    }

    /// Position of the cell with the given lattice index, if it is part of the grid
    pub fn position(&self, index: HexIndex) -> Option<usize> {
        let r = index.row.checked_sub(self.offset.0)?;
        let c = index.col.checked_sub(self.offset.1)?;
        if r < 0 || c < 0 {
            return None;
        }
        self.lookup.get((r as usize, c as usize)).copied().flatten()
    }

    /// Positions of the grid cells adjacent to the cell at `position`
    pub fn neighbors(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        let index = self.cells[position].index;
        index
            .neighbors()
            .into_iter()
            .filter_map(move |n| self.position(n))
    }

    /// Position of the grid cell containing (x, y)
    pub fn locate(&self, x: f64, y: f64) -> Option<usize> {
        self.position(self.lattice.locate(x, y))
    }

    // Metadata

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }
}

/// Boundary-inclusive intersection that stays well-defined for extents
/// collapsed to a point or a segment.
fn touches_extent(polygon: &Polygon<f64>, extent: &Rect<f64>) -> bool {
    let (min, max) = (extent.min(), extent.max());
    if min == max {
        polygon.intersects(&Point::from(min))
    } else if min.x == max.x || min.y == max.y {
        polygon.intersects(&Line::new(min, max))
    } else {
        polygon.intersects(extent)
    }
}
