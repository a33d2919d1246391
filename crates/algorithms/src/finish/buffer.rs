//! Buffer operations
//!
//! Offsets the boundary of a blob outward. Corners are joined with mitres
//! and open ends are squared, which keeps the angular look of the
//! hexagonal cells instead of rounding every vertex.

use geo::algorithm::buffer::{BufferStyle, LineCap, LineJoin};
use geo::{Buffer, MultiPolygon};

/// Parameters for buffer operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferParams {
    /// Buffer distance (positive = expand, negative = shrink)
    pub distance: f64,
    /// Maximum mitre length as a multiple of the distance (default: 1)
    pub miter_limit: f64,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 30.0,
            miter_limit: 1.0,
        }
    }
}

/// Buffer a polygon collection with mitre joins and square caps.
///
/// # Arguments
/// * `geometry` - Polygons to offset
/// * `params` - Buffer parameters (distance, mitre limit)
///
/// # Returns
/// The buffered polygons. A zero distance returns the input unchanged.
pub fn buffer_polygons(geometry: &MultiPolygon<f64>, params: &BufferParams) -> MultiPolygon<f64> {
    if params.distance == 0.0 {
        return geometry.clone();
    }
    let style = BufferStyle::new(params.distance)
        .line_join(LineJoin::Miter(params.miter_limit))
        .line_cap(LineCap::Square);
    geometry.buffer_with_style(style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area, BoundingRect};

    fn square(size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: size, y: 0.0),
            (x: size, y: size),
            (x: 0.0, y: size),
        ]])
    }

    #[test]
    fn test_zero_distance_is_identity() {
        let input = square(10.0);
        let out = buffer_polygons(&input, &BufferParams { distance: 0.0, miter_limit: 1.0 });
        assert_eq!(out, input);
    }

    #[test]
    fn test_buffer_grows_square() {
        let input = square(100.0);
        let out = buffer_polygons(&input, &BufferParams { distance: 10.0, miter_limit: 2.0 });

        // (100 + 2 * 10)², less whatever the corner joins trim
        let expected = 120.0 * 120.0;
        let error = (out.unsigned_area() - expected).abs() / expected;
        assert!(error < 0.02, "area {} expected {}", out.unsigned_area(), expected);

        let rect = out.bounding_rect().unwrap();
        assert!((rect.min().x + 10.0).abs() < 1e-3);
        assert!((rect.max().y - 110.0).abs() < 1e-3);
    }

    #[test]
    fn test_buffer_distance_affects_size() {
        let input = square(50.0);
        let small = buffer_polygons(&input, &BufferParams { distance: 5.0, ..Default::default() });
        let big = buffer_polygons(&input, &BufferParams { distance: 25.0, ..Default::default() });
        assert!(big.unsigned_area() > small.unsigned_area());
        assert!(small.unsigned_area() > input.unsigned_area());
    }

    #[test]
    fn test_buffer_merges_nearby_parts() {
        let a = square(10.0).0.remove(0);
        let b = polygon![
            (x: 15.0, y: 0.0),
            (x: 25.0, y: 0.0),
            (x: 25.0, y: 10.0),
            (x: 15.0, y: 10.0),
        ];
        let input = MultiPolygon::new(vec![a, b]);
        let out = buffer_polygons(&input, &BufferParams { distance: 3.0, ..Default::default() });
        assert_eq!(out.0.len(), 1);
    }
}
