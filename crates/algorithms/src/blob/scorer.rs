//! Blob scoring and selection
//!
//! A blob's score rewards both size and intensity:
//!
//! ```text
//! score = n_hexes * mean_z
//! ```

use downtown_core::{Error, Result};
use tracing::debug;

use super::Blob;

/// Aggregate metrics of one blob
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobMetrics {
    /// Number of member cells
    pub n_hexes: usize,
    /// Mean z-score of the member cells
    pub mean_z: f64,
    /// `n_hexes * mean_z`
    pub score: f64,
}

impl BlobMetrics {
    /// Metrics from the z-scores of the member cells
    pub fn compute(z_scores: impl IntoIterator<Item = f64>) -> Self {
        let (n, sum) = z_scores
            .into_iter()
            .fold((0usize, 0.0), |(n, sum), z| (n + 1, sum + z));
        let mean_z = if n > 0 { sum / n as f64 } else { 0.0 };
        Self {
            n_hexes: n,
            mean_z,
            score: n as f64 * mean_z,
        }
    }
}

/// Select the blob with the maximal score.
///
/// Exact ties go to the lowest blob id, so the choice does not depend on
/// the order of `blobs`.
///
/// # Errors
/// [`Error::EmptyBlobSet`] when `blobs` is empty.
pub fn best_blob(blobs: &[Blob]) -> Result<&Blob> {
    let best = blobs
        .iter()
        .reduce(|best, b| {
            if b.score > best.score || (b.score == best.score && b.id < best.id) {
                b
            } else {
                best
            }
        })
        .ok_or(Error::EmptyBlobSet)?;

    debug!(
        "Best blob {} of {}: {} cells, mean z {:.3}, score {:.3}",
        best.id,
        blobs.len(),
        best.n_hexes,
        best.mean_z,
        best.score
    );
    Ok(best)
}
