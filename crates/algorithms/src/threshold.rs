//! Adaptive density thresholding
//!
//! Standardizes the raw density of every cell twice:
//!
//! - z-score: `(v - mean) / stddev`, sample standard deviation
//! - min-max: `(v - min) / (max - min)`
//!
//! Cells whose min-max score is strictly greater than the threshold are
//! retained. The cutoff is relative to each town, so small and large towns
//! are treated alike.

use downtown_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How to handle a density surface with no variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Report [`Error::DegenerateDensity`]
    Fail,
    /// Treat every cell as maximal: min-max 1.0, z-score 0.0
    Uniform,
}

impl Default for DegeneratePolicy {
    fn default() -> Self {
        DegeneratePolicy::Fail
    }
}

/// Parameters for the threshold selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Min-max cutoff in [0, 1); cells strictly above it are retained (default: 0.75)
    pub threshold: f64,
    /// Behaviour on a flat surface (default: Fail)
    pub degenerate: DegeneratePolicy,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            degenerate: DegeneratePolicy::Fail,
        }
    }
}

/// Per-cell metrics, parallel to the cells of the density grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCell {
    /// Position of the cell in the grid
    pub position: usize,
    /// Raw kernel density
    pub density: f64,
    pub z_score: f64,
    pub minmax: f64,
    pub retained: bool,
    /// Blob membership, filled in by the blob builder
    pub blob_id: Option<usize>,
}

/// Summary statistics of a density surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl DensityStats {
    /// Compute statistics, `None` when `values` is empty
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() > 1 {
            (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Self { mean, std_dev, min, max })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    fn is_degenerate(&self) -> bool {
        !(self.range() > 0.0 && self.std_dev > 0.0 && self.std_dev.is_finite())
    }
}

/// Min-max scores of `values`.
///
/// # Errors
/// [`Error::DegenerateDensity`] when there are no values or they span no range.
pub fn minmax_scores(values: &[f64]) -> Result<Vec<f64>> {
    let stats = DensityStats::compute(values).ok_or_else(|| Error::DegenerateDensity {
        reason: "no grid cells".into(),
    })?;
    let range = stats.range();
    if !(range > 0.0 && range.is_finite()) {
        return Err(Error::DegenerateDensity {
            reason: format!("density range is {}", range),
        });
    }
    Ok(values.iter().map(|v| (v - stats.min) / range).collect())
}

/// z-scores of `values`.
///
/// # Errors
/// [`Error::DegenerateDensity`] with fewer than two values or zero spread.
pub fn z_scores(values: &[f64]) -> Result<Vec<f64>> {
    let stats = DensityStats::compute(values).ok_or_else(|| Error::DegenerateDensity {
        reason: "no grid cells".into(),
    })?;
    if values.len() < 2 || !(stats.std_dev > 0.0 && stats.std_dev.is_finite()) {
        return Err(Error::DegenerateDensity {
            reason: format!("standard deviation is {} over {} cells", stats.std_dev, values.len()),
        });
    }
    Ok(values.iter().map(|v| (v - stats.mean) / stats.std_dev).collect())
}

/// Standardize densities and flag the retained cells.
///
/// Returns one [`ScoredCell`] per input value, in input order, with
/// `blob_id` unset.
///
/// A grid of a single cell is retained whole with min-max 1.0 and z-score
/// 0.0: every point lies in that cell, whatever the policy.
///
/// # Errors
/// - [`Error::DegenerateDensity`] on a flat surface of two or more cells
///   under [`DegeneratePolicy::Fail`]
/// - [`Error::NoRetainedCells`] when no cell exceeds the threshold
pub fn select_cells(densities: &[f64], params: &ThresholdParams) -> Result<Vec<ScoredCell>> {
    let stats = DensityStats::compute(densities).ok_or_else(|| Error::DegenerateDensity {
        reason: "no grid cells".into(),
    })?;

    let (z, mm) = if densities.len() == 1 {
        (vec![0.0], vec![1.0])
    } else if stats.is_degenerate() {
        match params.degenerate {
            DegeneratePolicy::Fail => {
                return Err(Error::DegenerateDensity {
                    reason: format!(
                        "{} cells, range {}, standard deviation {}",
                        densities.len(),
                        stats.range(),
                        stats.std_dev
                    ),
                })
            }
            DegeneratePolicy::Uniform => (vec![0.0; densities.len()], vec![1.0; densities.len()]),
        }
    } else {
        (z_scores(densities)?, minmax_scores(densities)?)
    };

    let cells: Vec<ScoredCell> = densities
        .iter()
        .zip(z)
        .zip(mm)
        .enumerate()
        .map(|(position, ((&density, z_score), minmax))| ScoredCell {
            position,
            density,
            z_score,
            minmax,
            retained: minmax > params.threshold,
            blob_id: None,
        })
        .collect();

    let retained = cells.iter().filter(|c| c.retained).count();
    debug!(
        "Threshold {}: {} of {} cells retained",
        params.threshold,
        retained,
        cells.len()
    );
    if retained == 0 {
        return Err(Error::NoRetainedCells {
            threshold: params.threshold,
        });
    }
    Ok(cells)
}
