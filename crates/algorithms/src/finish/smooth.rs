//! Kernel smoothing of polygon rings
//!
//! Each ring is densified, then every vertex is replaced by a
//! Gaussian-weighted average of the ring's vertices, weighted by distance
//! along the ring. Rings are closed, so the weights wrap around the start.
//!
//! The kernel bandwidth `b` follows the Nadaraya-Watson `ksmooth`
//! convention: the kernel quartiles sit at ±0.25·b, which gives a standard
//! deviation of `0.3706506 · b`. `b` is `smoothness` times the mean
//! spacing of the densified ring, so at the default settings only the
//! corners are rounded and the outline keeps its size.

use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Ratio of the Gaussian standard deviation to the `ksmooth` bandwidth
const KSMOOTH_SCALE: f64 = 0.370_650_6;

/// Kernel weights are ignored beyond this many standard deviations
const CUTOFF_SIGMAS: f64 = 4.0;

/// Parameters for ring smoothing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothParams {
    /// Bandwidth as a multiple of the densified vertex spacing; 0 disables smoothing (default: 5)
    pub smoothness: f64,
    /// Sub-segments per edge when densifying (default: 10)
    pub densify: usize,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self {
            smoothness: 5.0,
            densify: 10,
        }
    }
}

/// Split each edge of a closed ring into `n` equal pieces.
///
/// Takes the ring vertices without the closing duplicate and returns the
/// same, `n` times as many.
fn densify_ring(points: &[Coord<f64>], n: usize) -> Vec<Coord<f64>> {
    let m = points.len();
    let mut dense = Vec::with_capacity(m * n);
    for i in 0..m {
        let a = points[i];
        let b = points[(i + 1) % m];
        for k in 0..n {
            let t = k as f64 / n as f64;
            dense.push(Coord {
                x: a.x + t * (b.x - a.x),
                y: a.y + t * (b.y - a.y),
            });
        }
    }
    dense
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Smooth a closed ring.
///
/// Rings with fewer than three distinct vertices, zero length, or a
/// smoothness of 0 are returned unchanged.
pub fn smooth_ring(ring: &LineString<f64>, params: &SmoothParams) -> LineString<f64> {
    let coords = &ring.0;
    if params.smoothness <= 0.0 || coords.len() < 4 {
        return ring.clone();
    }
    // Drop the closing vertex
    let points = &coords[..coords.len() - 1];
    let m = points.len();

    let perimeter: f64 = (0..m).map(|i| distance(points[i], points[(i + 1) % m])).sum();
    if !(perimeter > 0.0) {
        return ring.clone();
    }
    let densify = params.densify.max(1);
    let spacing = perimeter / (m * densify) as f64;
    let sigma = KSMOOTH_SCALE * params.smoothness * spacing;
    let cutoff = CUTOFF_SIGMAS * sigma;

    let dense = densify_ring(points, densify);

    // Arc length position of every dense vertex
    let mut arc = Vec::with_capacity(dense.len());
    let mut s = 0.0;
    for i in 0..dense.len() {
        arc.push(s);
        s += distance(dense[i], dense[(i + 1) % dense.len()]);
    }
    let length = s;
    let wraps = (cutoff / length).ceil() as i64;

    let mut smoothed: Vec<Coord<f64>> = arc
        .iter()
        .map(|&si| {
            let (mut wx, mut wy, mut wsum) = (0.0, 0.0, 0.0);
            for k in -wraps..=wraps {
                let shift = k as f64 * length;
                for (p, &sj) in dense.iter().zip(&arc) {
                    let d = sj + shift - si;
                    if d.abs() > cutoff {
                        continue;
                    }
                    let w = (-d * d / (2.0 * sigma * sigma)).exp();
                    wx += w * p.x;
                    wy += w * p.y;
                    wsum += w;
                }
            }
            Coord {
                x: wx / wsum,
                y: wy / wsum,
            }
        })
        .collect();

    smoothed.push(smoothed[0]);
    LineString::new(smoothed)
}

/// Smooth every ring of every polygon.
pub fn smooth_polygons(geometry: &MultiPolygon<f64>, params: &SmoothParams) -> MultiPolygon<f64> {
    if params.smoothness <= 0.0 {
        return geometry.clone();
    }
    let polygons = geometry
        .0
        .iter()
        .map(|polygon| {
            let exterior = smooth_ring(polygon.exterior(), params);
            let interiors = polygon
                .interiors()
                .iter()
                .map(|ring| smooth_ring(ring, params))
                .collect();
            Polygon::new(exterior, interiors)
        })
        .collect();
    MultiPolygon::new(polygons)
}
