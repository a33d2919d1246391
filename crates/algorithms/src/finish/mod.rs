//! Boundary regularization
//!
//! Turns the jagged union of hexagons into a presentable boundary:
//!
//! 1. Buffer by `buffer_distance` (mitre joins, square caps)
//! 2. Kernel-smooth every ring
//! 3. Optionally buffer again by `second_buffer`

mod buffer;
mod smooth;

pub use buffer::{buffer_polygons, BufferParams};
pub use smooth::{smooth_polygons, smooth_ring, SmoothParams};

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters for the boundary finisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinishParams {
    /// First buffer distance in projected units (default: 30)
    pub buffer_distance: f64,
    /// Mitre limit for buffer joins (default: 1)
    pub miter_limit: f64,
    /// Smoothing bandwidth multiplier; 0 disables smoothing (default: 5)
    pub smoothness: f64,
    /// Sub-segments per edge before smoothing (default: 10)
    pub densify: usize,
    /// Buffer applied after smoothing (default: none)
    pub second_buffer: Option<f64>,
}

impl Default for FinishParams {
    fn default() -> Self {
        Self {
            buffer_distance: 30.0,
            miter_limit: 1.0,
            smoothness: 5.0,
            densify: 10,
            second_buffer: None,
        }
    }
}

impl FinishParams {
    fn buffer(&self, distance: f64) -> BufferParams {
        BufferParams {
            distance,
            miter_limit: self.miter_limit,
        }
    }

    fn smooth(&self) -> SmoothParams {
        SmoothParams {
            smoothness: self.smoothness,
            densify: self.densify,
        }
    }
}

/// Buffer, smooth, and optionally buffer again.
pub fn finish_boundary(geometry: &MultiPolygon<f64>, params: &FinishParams) -> MultiPolygon<f64> {
    let buffered = buffer_polygons(geometry, &params.buffer(params.buffer_distance));
    let mut finished = smooth_polygons(&buffered, &params.smooth());
    if let Some(distance) = params.second_buffer {
        finished = buffer_polygons(&finished, &params.buffer(distance));
    }
    debug!(
        "Finished boundary: {} -> {} polygons",
        geometry.0.len(),
        finished.0.len()
    );
    finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area, Contains, Point};

    fn square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 200.0, y: 0.0),
            (x: 200.0, y: 200.0),
            (x: 0.0, y: 200.0),
        ]])
    }

    #[test]
    fn test_identity_when_disabled() {
        let params = FinishParams {
            buffer_distance: 0.0,
            smoothness: 0.0,
            ..Default::default()
        };
        assert_eq!(finish_boundary(&square(), &params), square());
    }

    #[test]
    fn test_default_finish_contains_core() {
        let out = finish_boundary(&square(), &FinishParams::default());
        assert!(!out.0.is_empty());
        assert!(out.contains(&Point::new(100.0, 100.0)));
        assert!(out.unsigned_area() > 0.0);
    }

    #[test]
    fn test_second_buffer_grows_result() {
        let v1 = finish_boundary(&square(), &FinishParams::default());
        let v2 = finish_boundary(
            &square(),
            &FinishParams {
                second_buffer: Some(50.0),
                ..Default::default()
            },
        );
        assert!(v2.unsigned_area() > v1.unsigned_area());
    }

    #[test]
    fn test_params_from_json() {
        let params: FinishParams = serde_json::from_str(r#"{ "second_buffer": 50 }"#).unwrap();
        assert_eq!(params.second_buffer, Some(50.0));
        assert_eq!(params.buffer_distance, 30.0);
    }
}
