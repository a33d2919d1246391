//! Kernel bandwidth selection

use downtown_core::{Error, Result};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Minimum number of points for which a bandwidth is defined.
pub const MIN_POINTS: usize = 2;

/// Rule used to choose the kernel bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthRule {
    /// Isotropic normal-reference (Scott) rule for two dimensions:
    /// `h = σ · n^(-1/6)` with `σ² = (s_x² + s_y²) / 2`.
    Scott,
    /// Fixed bandwidth in projected units.
    Fixed(f64),
}

impl Default for BandwidthRule {
    fn default() -> Self {
        BandwidthRule::Scott
    }
}

/// Sample variance (n - 1 denominator). Requires at least two values.
fn sample_variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = values.clone().count() as f64;
    let mean = values.clone().sum::<f64>() / n;
    values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)
}

/// Select a bandwidth for `points` according to `rule`.
///
/// # Errors
/// - [`Error::InsufficientPoints`] with fewer than [`MIN_POINTS`] points
/// - [`Error::DegenerateBandwidth`] when the result is zero or not finite,
///   e.g. when every point has the same coordinates
pub fn select_bandwidth(points: &[Coord<f64>], rule: BandwidthRule) -> Result<f64> {
    let n = points.len();
    if n < MIN_POINTS {
        return Err(Error::InsufficientPoints {
            found: n,
            required: MIN_POINTS,
        });
    }

    let h = match rule {
        BandwidthRule::Scott => {
            let var_x = sample_variance(points.iter().map(|c| c.x));
            let var_y = sample_variance(points.iter().map(|c| c.y));
            let sigma = ((var_x + var_y) / 2.0).sqrt();
            sigma * (n as f64).powf(-1.0 / 6.0)
        }
        BandwidthRule::Fixed(h) => h,
    };

    if !(h.is_finite() && h > 0.0) {
        return Err(Error::DegenerateBandwidth { bandwidth: h });
    }
    Ok(h)
}
