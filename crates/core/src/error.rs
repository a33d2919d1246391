//! Error types for downtown delineation

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for downtown delineation.
///
/// Per-town variants (see [`Error::kind`]) are expected outcomes of the
/// algorithm on real data and are recorded by the batch runner. The
/// remaining variants are infrastructure failures and abort whatever
/// operation produced them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown parameter profile: {0}")]
    UnknownProfile(String),

    #[error("no points of interest inside the boundary of town {town}")]
    NoPoints { town: String },

    #[error("density estimation needs at least {required} points, found {found}")]
    InsufficientPoints { found: usize, required: usize },

    #[error("kernel bandwidth is degenerate ({bandwidth}); points have no spatial spread")]
    DegenerateBandwidth { bandwidth: f64 },

    #[error("density standardization is degenerate: {reason}")]
    DegenerateDensity { reason: String },

    #[error("no grid cell exceeds the min-max threshold {threshold}")]
    NoRetainedCells { threshold: f64 },

    #[error("retained cells produced no blobs")]
    EmptyBlobSet,

    #[error("finishing blob {blob} left an empty boundary")]
    EmptyBoundary { blob: usize },

    #[error("{0}")]
    Other(String),
}

/// Classification of per-town failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Not enough usable points for the town.
    Input,
    /// Degenerate numerics (zero variance, zero range).
    Numeric,
    /// Thresholding or blob extraction produced nothing.
    Geometry,
    /// Anything else: I/O, malformed input files, bad parameters.
    Fatal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Input => "input",
            ErrorKind::Numeric => "numeric",
            ErrorKind::Geometry => "geometry",
            ErrorKind::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoPoints { .. } | Error::InsufficientPoints { .. } => ErrorKind::Input,
            Error::DegenerateBandwidth { .. } | Error::DegenerateDensity { .. } => {
                ErrorKind::Numeric
            }
            Error::NoRetainedCells { .. } | Error::EmptyBlobSet | Error::EmptyBoundary { .. } => {
                ErrorKind::Geometry
            }
            _ => ErrorKind::Fatal,
        }
    }

    /// Whether this error is scoped to a single town and must not halt a batch.
    pub fn is_per_town(&self) -> bool {
        self.kind() != ErrorKind::Fatal
    }

    pub(crate) fn geojson(msg: impl Into<String>) -> Self {
        Error::InvalidGeoJson(msg.into())
    }
}

/// Result type alias for downtown operations
pub type Result<T> = std::result::Result<T, Error>;
