//! Boundary ring simplification.
//!
//! Ramer–Douglas–Peucker comes from `geo`; this module only converts the
//! metric tolerance and guards against rings that collapse to nothing.

use geo::{Area, Coord, LineString, Polygon, Simplify};

/// Meters per degree of latitude, used to turn a metric tolerance into degrees.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Simplify a closed ring (first vertex repeated at the end).
///
/// The result is closed and keeps at least three distinct vertices with a
/// non-zero area. A ring that would fall below that is returned unchanged.
pub fn simplify_ring(ring: &[[f64; 2]], epsilon: f64) -> Vec<[f64; 2]> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return ring.to_vec();
    }

    let exterior: LineString = ring.iter().map(|c| Coord { x: c[0], y: c[1] }).collect();
    let simplified = Polygon::new(exterior, vec![]).simplify(epsilon);

    // Closed ring: the last coordinate repeats the first
    let distinct = simplified.exterior().0.len().saturating_sub(1);
    if distinct < 3 || simplified.unsigned_area() <= 0.0 {
        tracing::debug!(distinct, "Simplified ring collapsed, keeping original vertices");
        return ring.to_vec();
    }

    simplified.exterior().coords().map(|c| [c.x, c.y]).collect()
}

/// Convert a tolerance in meters to degrees.
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_square(steps: usize) -> Vec<[f64; 2]> {
        let mut ring = Vec::new();
        let corners = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for k in 0..4 {
            let (a, b) = (corners[k], corners[(k + 1) % 4]);
            for s in 0..steps {
                let t = s as f64 / steps as f64;
                ring.push([a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])]);
            }
        }
        ring.push(ring[0]);
        ring
    }

    #[test]
    fn test_dense_square_collapses_to_corners() {
        let ring = dense_square(25);
        let simplified = simplify_ring(&ring, 0.001);
        assert_eq!(simplified.len(), 5);
        assert_eq!(simplified.first(), simplified.last());
        for corner in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]] {
            assert!(simplified.contains(&corner));
        }
    }

    #[test]
    fn test_thin_ring_keeps_triangle() {
        let ring = vec![[0.0, 0.0], [1.0, 0.00001], [2.0, 0.0], [1.0, -0.00002], [0.0, 0.0]];
        let simplified = simplify_ring(&ring, 1.0);
        assert_eq!(simplified.len(), 4);
        assert_eq!(simplified.first(), simplified.last());
        assert!(simplified.contains(&[2.0, 0.0]));
    }

    #[test]
    fn test_small_rings_untouched() {
        let ring = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        assert_eq!(simplify_ring(&ring, 10.0), ring);
    }

    #[test]
    fn test_non_positive_tolerance_is_noop() {
        let ring = dense_square(3);
        assert_eq!(simplify_ring(&ring, 0.0), ring);
        assert_eq!(simplify_ring(&ring, f64::NAN), ring);
    }

    #[test]
    fn test_meters_to_degrees() {
        assert!((meters_to_degrees(111_320.0) - 1.0).abs() < 1e-12);
    }
}
