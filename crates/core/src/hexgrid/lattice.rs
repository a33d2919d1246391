//! Pointy-top hexagonal lattice geometry

use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

/// Lattice index of a hexagonal cell in "odd-r" offset coordinates.
///
/// Odd rows are shifted half a cell to the right. Indices may be negative:
/// the lattice extends infinitely around its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexIndex {
    pub row: i32,
    pub col: i32,
}

impl HexIndex {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// 1 for odd rows (shifted right), 0 for even rows
    #[inline]
    fn parity(&self) -> i32 {
        self.row.rem_euclid(2)
    }

    /// The six edge-sharing neighbours, in counter-clockwise order starting east.
    pub fn neighbors(&self) -> [HexIndex; 6] {
        let (r, c) = (self.row, self.col);
        // Column shift of the rows above and below
        let d = self.parity();
        [
            HexIndex::new(r, c + 1),
            HexIndex::new(r + 1, c + d),
            HexIndex::new(r + 1, c + d - 1),
            HexIndex::new(r, c - 1),
            HexIndex::new(r - 1, c + d - 1),
            HexIndex::new(r - 1, c + d),
        ]
    }
}

/// Vertex offsets in (half-width, half-radius) steps, counter-clockwise.
const VERTEX_STEPS: [(i64, i64); 6] = [(1, -1), (1, 1), (0, 2), (-1, 1), (-1, -1), (0, -2)];

/// Mapping between lattice indices and projected coordinates.
///
/// Cells are pointy-top hexagons. `cell_size` is the flat-to-flat width,
/// which is also the distance between neighbouring centers:
/// ```text
/// x = origin_x + (2 * col + row % 2) * cell_size / 2
/// y = origin_y + 3 * row * R / 2,   R = cell_size / sqrt(3)
/// ```
/// Vertices are computed from integer half-steps so that neighbouring cells
/// share bit-identical vertex coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HexLattice {
    pub origin_x: f64,
    pub origin_y: f64,
    cell_size: f64,
}

impl HexLattice {
    /// Create a lattice with the center of cell (0, 0) at the origin.
    pub fn new(origin_x: f64, origin_y: f64, cell_size: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            cell_size,
        }
    }

    /// Flat-to-flat width of a cell
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Center-to-vertex distance
    pub fn circumradius(&self) -> f64 {
        self.cell_size / 3f64.sqrt()
    }

    /// Area of a single cell
    pub fn cell_area(&self) -> f64 {
        // (sqrt(3) / 2) * w^2 for a hexagon of flat-to-flat width w
        3f64.sqrt() / 2.0 * self.cell_size * self.cell_size
    }

    /// Vertical distance between consecutive rows
    pub fn row_spacing(&self) -> f64 {
        1.5 * self.circumradius()
    }

    #[inline]
    fn half_width(&self) -> f64 {
        self.cell_size / 2.0
    }

    #[inline]
    fn half_radius(&self) -> f64 {
        self.circumradius() / 2.0
    }

    /// Half-step coordinates of a cell center
    #[inline]
    fn center_steps(&self, index: HexIndex) -> (i64, i64) {
        (
            2 * index.col as i64 + index.parity() as i64,
            3 * index.row as i64,
        )
    }

    #[inline]
    fn steps_to_coord(&self, sx: i64, sy: i64) -> Coord<f64> {
        Coord {
            x: self.origin_x + sx as f64 * self.half_width(),
            y: self.origin_y + sy as f64 * self.half_radius(),
        }
    }

    /// Center coordinate of a cell
    pub fn center(&self, index: HexIndex) -> Coord<f64> {
        let (sx, sy) = self.center_steps(index);
        self.steps_to_coord(sx, sy)
    }

    /// Closed, counter-clockwise hexagon outline of a cell
    pub fn polygon(&self, index: HexIndex) -> Polygon<f64> {
        let (cx, cy) = self.center_steps(index);
        let mut ring: Vec<Coord<f64>> = VERTEX_STEPS
            .iter()
            .map(|&(dx, dy)| self.steps_to_coord(cx + dx, cy + dy))
            .collect();
        ring.push(ring[0]);
        Polygon::new(LineString::new(ring), vec![])
    }

    /// Index of the cell containing (x, y).
    ///
    /// Points exactly on a shared edge resolve to one of the two cells.
    pub fn locate(&self, x: f64, y: f64) -> HexIndex {
        let r = self.circumradius();
        let px = x - self.origin_x;
        let py = y - self.origin_y;

        // Fractional axial coordinates
        let q = (3f64.sqrt() / 3.0 * px - py / 3.0) / r;
        let s = (2.0 / 3.0 * py) / r;
        let (q, s) = cube_round(q, s);

        let row = s;
        let col = q + (row - row.rem_euclid(2)) / 2;
        HexIndex::new(row as i32, col as i32)
    }
}

/// Round fractional axial coordinates to the nearest hexagon.
fn cube_round(q: f64, r: f64) -> (i64, i64) {
    let s = -q - r;
    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    (rq as i64, rr as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Area, Intersects, Point};

    #[test]
    fn test_cell_area_matches_polygon() {
        let lattice = HexLattice::new(10.0, -5.0, 100.0);
        let poly = lattice.polygon(HexIndex::new(3, -2));
        assert_relative_eq!(poly.unsigned_area(), lattice.cell_area(), epsilon = 1e-6);
    }

    #[test]
    fn test_ring_is_counter_clockwise_and_closed() {
        let lattice = HexLattice::new(0.0, 0.0, 10.0);
        let poly = lattice.polygon(HexIndex::new(0, 0));
        assert_eq!(poly.exterior().0.len(), 7);
        assert!(poly.signed_area() > 0.0);
    }

    #[test]
    fn test_neighbors_share_vertices_exactly() {
        let lattice = HexLattice::new(123.456, 789.012, 37.5);
        for index in [HexIndex::new(0, 0), HexIndex::new(1, 0), HexIndex::new(-3, 4)] {
            let own = lattice.polygon(index);
            for n in index.neighbors() {
                let other = lattice.polygon(n);
                let shared = own
                    .exterior()
                    .0
                    .iter()
                    .take(6)
                    .filter(|c| other.exterior().0.contains(c))
                    .count();
                assert_eq!(shared, 2, "{:?} and {:?} should share one edge", index, n);
            }
        }
    }

    #[test]
    fn test_neighbor_centers_are_one_cell_apart() {
        let lattice = HexLattice::new(0.0, 0.0, 50.0);
        for index in [HexIndex::new(0, 0), HexIndex::new(1, 1), HexIndex::new(-1, 0)] {
            let c = lattice.center(index);
            for n in index.neighbors() {
                let nc = lattice.center(n);
                let d = ((c.x - nc.x).powi(2) + (c.y - nc.y).powi(2)).sqrt();
                assert_relative_eq!(d, 50.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_locate_center_roundtrip() {
        let lattice = HexLattice::new(-20.0, 15.0, 30.0);
        for row in -3..4 {
            for col in -3..4 {
                let index = HexIndex::new(row, col);
                let c = lattice.center(index);
                assert_eq!(lattice.locate(c.x, c.y), index);
            }
        }
    }

    #[test]
    fn test_locate_agrees_with_polygon_containment() {
        let lattice = HexLattice::new(0.0, 0.0, 10.0);
        for i in 0..40 {
            for j in 0..40 {
                let x = -7.3 + i as f64 * 0.77;
                let y = -6.1 + j as f64 * 0.69;
                let index = lattice.locate(x, y);
                let poly = lattice.polygon(index);
                assert!(
                    poly.intersects(&Point::new(x, y)),
                    "({x}, {y}) not in {:?}",
                    index
                );
                let c = lattice.center(index);
                let d = ((x - c.x).powi(2) + (y - c.y).powi(2)).sqrt();
                assert!(d <= lattice.circumradius() + 1e-9);
            }
        }
    }
}
