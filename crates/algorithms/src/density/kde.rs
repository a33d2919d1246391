//! Kernel density estimation on a hexagonal grid
//!
//! Estimates point intensity (points per unit area) at every cell center
//! of a hexagonal grid laid over the bounding box of the points.
//!
//! Reference:
//! Silverman, B.W. (1986). Density Estimation for Statistics and Data
//! Analysis. Chapman & Hall.

use crate::maybe_rayon::*;
use downtown_core::hexgrid::HexGrid;
use downtown_core::{Algorithm, Error, Result};
use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use super::bandwidth::{select_bandwidth, BandwidthRule};

/// Smoothing kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// Bivariate normal kernel, unbounded support
    Gaussian,
    /// Quartic (biweight) kernel with support radius equal to the bandwidth
    Quartic,
}

impl Kernel {
    /// Kernel value for squared distance `d2` and bandwidth `h`.
    ///
    /// Both kernels integrate to one over the plane.
    #[inline]
    pub fn weight(&self, d2: f64, h: f64) -> f64 {
        let h2 = h * h;
        match self {
            Kernel::Gaussian => (-d2 / (2.0 * h2)).exp() / (2.0 * PI * h2),
            Kernel::Quartic => {
                if d2 >= h2 {
                    0.0
                } else {
                    let u = 1.0 - d2 / h2;
                    3.0 / (PI * h2) * u * u
                }
            }
        }
    }
}

/// Parameters for density estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityParams {
    /// Flat-to-flat width of the hexagonal cells, in projected units (default: 100)
    pub cell_size: f64,
    /// Bandwidth selection rule (default: Scott)
    pub bandwidth: BandwidthRule,
    /// Smoothing kernel (default: Gaussian)
    pub kernel: Kernel,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            cell_size: 100.0,
            bandwidth: BandwidthRule::Scott,
            kernel: Kernel::Gaussian,
        }
    }
}

/// Density values over a hexagonal grid.
#[derive(Debug, Clone)]
pub struct DensitySurface {
    /// Grid covering the bounding box of the points
    pub grid: HexGrid,
    /// Intensity at each cell center, parallel to `grid.cells()`
    pub values: Vec<f64>,
    /// Bandwidth actually used
    pub bandwidth: f64,
}

/// Bounding rectangle of a non-empty point set
fn point_extent(points: &[Coord<f64>]) -> Option<Rect<f64>> {
    let first = *points.first()?;
    let (min, max) = points.iter().fold((first, first), |(min, max), c| {
        (
            Coord { x: min.x.min(c.x), y: min.y.min(c.y) },
            Coord { x: max.x.max(c.x), y: max.y.max(c.y) },
        )
    });
    Some(Rect::new(min, max))
}

/// Estimate kernel density on a hexagonal grid.
///
/// # Algorithm
///
/// The grid covers the bounding box of `points` (not the town boundary),
/// so empty land around the settlement does not dilute the estimate.
/// For each cell center `c`:
///
/// ```text
/// λ(c) = Σ K(|c - p_i|; h)
/// ```
///
/// # Errors
/// - [`Error::InsufficientPoints`] for fewer than two points
/// - [`Error::DegenerateBandwidth`] when the points have no spread
pub fn kernel_density(points: &[Coord<f64>], params: &DensityParams) -> Result<DensitySurface> {
    let h = select_bandwidth(points, params.bandwidth)?;
    let extent = point_extent(points).ok_or(Error::InsufficientPoints {
        found: 0,
        required: super::bandwidth::MIN_POINTS,
    })?;
    let grid = HexGrid::covering(extent, params.cell_size)?;
    let kernel = params.kernel;

    let values: Vec<f64> = grid
        .cells()
        .into_par_iter()
        .map(|cell| {
            let c = cell.center;
            points
                .iter()
                .map(|p| {
                    let dx = p.x - c.x;
                    let dy = p.y - c.y;
                    kernel.weight(dx * dx + dy * dy, h)
                })
                .sum::<f64>()
        })
        .collect();

    debug!(
        "KDE: {} points, {} cells, bandwidth {:.2}",
        points.len(),
        grid.len(),
        h
    );

    Ok(DensitySurface {
        grid,
        values,
        bandwidth: h,
    })
}

/// Kernel density estimation algorithm
#[derive(Debug, Clone, Default)]
pub struct KernelDensity;

impl Algorithm for KernelDensity {
    type Input = Vec<Coord<f64>>;
    type Output = DensitySurface;
    type Params = DensityParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "KernelDensity"
    }

    fn description(&self) -> &'static str {
        "Kernel density of points at hexagonal cell centers"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        kernel_density(&input, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cluster(cx: f64, cy: f64, n: usize, spread: f64) -> Vec<Coord<f64>> {
        (0..n)
            .map(|i| {
                let a = i as f64 * 2.399_963; // golden angle
                let r = spread * ((i as f64 + 0.5) / n as f64).sqrt();
                Coord { x: cx + r * a.cos(), y: cy + r * a.sin() }
            })
            .collect()
    }

    #[test]
    fn test_kernels_integrate_to_one() {
        // Riemann sum over a fine square lattice
        let h = 3.0;
        let step = 0.1;
        for kernel in [Kernel::Gaussian, Kernel::Quartic] {
            let mut total = 0.0;
            for i in -300..=300 {
                for j in -300..=300 {
                    let (x, y) = (i as f64 * step, j as f64 * step);
                    total += kernel.weight(x * x + y * y, h) * step * step;
                }
            }
            assert_relative_eq!(total, 1.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_grid_covers_point_extent_only() {
        let mut pts = cluster(500.0, 500.0, 30, 50.0);
        pts.push(Coord { x: 300.0, y: 300.0 });
        let surface = kernel_density(&pts, &DensityParams::default()).unwrap();
        assert_eq!(surface.values.len(), surface.grid.len());
        for p in &pts {
            assert!(surface.grid.locate(p.x, p.y).is_some());
        }
        // Extent is ~250 units wide: only a few rows and columns of 100-unit cells
        assert!(surface.grid.len() < 30, "grid has {} cells", surface.grid.len());
    }

    #[test]
    fn test_density_peaks_at_cluster() {
        let mut pts = cluster(100.0, 100.0, 50, 40.0);
        pts.extend([
            Coord { x: 900.0, y: 900.0 },
            Coord { x: 900.0, y: 100.0 },
            Coord { x: 100.0, y: 900.0 },
        ]);
        let surface = kernel_density(&pts, &DensityParams::default()).unwrap();

        let (argmax, _) = surface
            .values
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        let center = surface.grid.cells()[argmax].center;
        assert!(center.x < 250.0 && center.y < 250.0, "peak at {:?}", center);
        assert!(surface.values.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_total_mass_close_to_point_count() {
        // Density integrated over the grid approximates n when the grid is
        // much larger than the bandwidth.
        let pts: Vec<Coord<f64>> = (0..20)
            .map(|i| Coord { x: (i % 5) as f64 * 200.0, y: (i / 5) as f64 * 250.0 })
            .collect();
        let params = DensityParams {
            cell_size: 10.0,
            bandwidth: BandwidthRule::Fixed(30.0),
            kernel: Kernel::Quartic,
        };
        let surface = kernel_density(&pts, &params).unwrap();
        let area = surface.grid.lattice().cell_area();
        let mass: f64 = surface.values.iter().sum::<f64>() * area;
        // Points on the extent border lose the part of their kernel outside the grid
        assert!(mass > 8.0 && mass < 20.5, "mass {}", mass);
    }

    #[test]
    fn test_insufficient_points() {
        let err = kernel_density(&[Coord { x: 0.0, y: 0.0 }], &DensityParams::default()).unwrap_err();
        assert!(matches!(err, Error::InsufficientPoints { .. }));
    }

    #[test]
    fn test_algorithm_trait() {
        let pts = cluster(0.0, 0.0, 10, 100.0);
        let out = KernelDensity.execute_default(pts).unwrap();
        assert_eq!(KernelDensity.name(), "KernelDensity");
        assert!(out.bandwidth > 0.0);
    }
}
