//! Connected clusters of retained cells

use crate::threshold::ScoredCell;
use downtown_core::hexgrid::HexGrid;
use downtown_core::{Error, Result};
use geo::MultiPolygon;
use tracing::debug;

use super::scorer::BlobMetrics;
use super::Blob;

/// Label connected groups of retained cells and build their geometry.
///
/// Connectivity is the six-neighbour adjacency of the hexagonal lattice.
/// Cells are visited in grid (row-major) order and blob ids are assigned
/// sequentially from 0 in encounter order, so labelling is deterministic.
/// On return every retained cell carries its blob id.
///
/// # Errors
/// [`Error::EmptyBlobSet`] when no cell is retained.
pub fn build_blobs(grid: &HexGrid, cells: &mut [ScoredCell]) -> Result<Vec<Blob>> {
    debug_assert_eq!(grid.len(), cells.len());

    let mut blobs = Vec::new();
    for start in 0..cells.len() {
        if !cells[start].retained || cells[start].blob_id.is_some() {
            continue;
        }
        let id = blobs.len();
        let members = flood_fill(grid, cells, start, id);
        let geometry = union_cells(grid, &members);
        let metrics = BlobMetrics::compute(members.iter().map(|&p| cells[p].z_score));
        blobs.push(Blob {
            id,
            cells: members,
            geometry,
            n_hexes: metrics.n_hexes,
            mean_z: metrics.mean_z,
            score: metrics.score,
        });
    }

    if blobs.is_empty() {
        return Err(Error::EmptyBlobSet);
    }
    debug!("{} blobs from {} retained cells", blobs.len(), cells.iter().filter(|c| c.retained).count());
    Ok(blobs)
}

/// Mark every retained cell connected to `start` with `id`.
///
/// Returns the member positions in ascending order.
fn flood_fill(grid: &HexGrid, cells: &mut [ScoredCell], start: usize, id: usize) -> Vec<usize> {
    let mut members = Vec::new();
    let mut stack = vec![start];
    cells[start].blob_id = Some(id);

    while let Some(pos) = stack.pop() {
        members.push(pos);
        for n in grid.neighbors(pos) {
            let cell = &mut cells[n];
            if cell.retained && cell.blob_id.is_none() {
                cell.blob_id = Some(id);
                stack.push(n);
            }
        }
    }

    members.sort_unstable();
    members
}

/// Union of the cell polygons at `members`.
fn union_cells(grid: &HexGrid, members: &[usize]) -> MultiPolygon<f64> {
    let cells = grid.cells();
    if let [single] = members {
        return MultiPolygon::new(vec![cells[*single].polygon.clone()]);
    }
    geo::unary_union(members.iter().map(|&p| &cells[p].polygon))
}
