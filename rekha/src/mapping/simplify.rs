//! Douglas-Peucker outline simplification.
//!
//! Removes points that lie within `tolerance` meters of the chord between
//! the points kept around them. The first and last points always survive,
//! and survivors keep their original order.
//!
//! The split search runs on an explicit stack of index ranges and marks
//! survivors in a keep mask, so a long walk cannot overflow the call stack
//! and repeated coordinates (a closed loop repeats its start) are never
//! confused with each other.

use crate::core::types::Point;

/// Default tolerance (m)
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Simplify a polyline.
///
/// Inputs with fewer than three points are returned unchanged.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }

        let start = &points[first];
        let end = &points[last];
        let mut max_dist = 0.0f64;
        let mut max_idx = first;

        for (i, point) in points.iter().enumerate().take(last).skip(first + 1) {
            let dist = perpendicular_distance(point, start, end);
            if dist > max_dist {
                max_dist = dist;
                max_idx = i;
            }
        }

        if max_dist > tolerance {
            keep[max_idx] = true;
            stack.push((first, max_idx));
            stack.push((max_idx, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Distance from `point` to the infinite line through `line_start` and
/// `line_end`; plain point distance when the chord has zero length.
fn perpendicular_distance(point: &Point, line_start: &Point, line_end: &Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;

    let line_len_sq = dx * dx + dy * dy;

    if line_len_sq < 1e-12 {
        // Chord collapsed to a point (closed loop start == end)
        return point.distance(line_start);
    }

    let numerator = (dy * point.x - dx * point.y + line_end.x * line_start.y
        - line_end.y * line_start.x)
        .abs();

    numerator / line_len_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&c| c.into()).collect()
    }

    #[test]
    fn test_short_inputs_unchanged() {
        assert!(simplify(&[], 0.1).is_empty());
        let two = pts(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(simplify(&two, 0.1), two);
    }

    #[test]
    fn test_collinear_reduces_to_endpoints() {
        let line: Vec<Point> = (0..20).map(|i| Point::new(0.0, i as f64 * 0.75)).collect();
        let simplified = simplify(&line, 0.1);
        assert_eq!(simplified, vec![line[0], line[19]]);
    }

    #[test]
    fn test_keeps_corner() {
        let path = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (2.0, 2.0)]);
        let simplified = simplify(&path, 0.1);
        assert_eq!(simplified, pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]));
    }

    #[test]
    fn test_small_wiggle_removed() {
        let path = pts(&[(0.0, 0.0), (1.0, 0.05), (2.0, -0.05), (3.0, 0.0)]);
        assert_eq!(simplify(&path, 0.1).len(), 2);
        assert_eq!(simplify(&path, 0.01).len(), 4);
    }

    #[test]
    fn test_closed_square_keeps_corners_in_order() {
        // 4 steps per side, start repeated at the end
        let mut square = Vec::new();
        for i in 0..4 {
            square.push(Point::new(0.0, i as f64));
        }
        for i in 0..4 {
            square.push(Point::new(i as f64, 4.0));
        }
        for i in 0..4 {
            square.push(Point::new(4.0, 4.0 - i as f64));
        }
        for i in 0..4 {
            square.push(Point::new(4.0 - i as f64, 0.0));
        }
        square.push(Point::new(0.0, 0.0));

        let simplified = simplify(&square, 0.1);
        assert_eq!(
            simplified,
            pts(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0), (0.0, 0.0)])
        );
    }

    #[test]
    fn test_duplicate_coordinates_kept_by_position() {
        // Out and back along the same line: the turnaround point must survive
        // even though its neighbours share coordinates with earlier points.
        let path = pts(&[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0), (0.0, 1.0), (0.0, 0.0)]);
        let simplified = simplify(&path, 0.1);
        assert_eq!(simplified, pts(&[(0.0, 0.0), (0.0, 2.0), (0.0, 0.0)]));
    }

    #[test]
    fn test_long_walk_does_not_overflow() {
        // Zig-zag with every point significant
        let path: Vec<Point> = (0..10_000)
            .map(|i| Point::new(i as f64, if i % 2 == 0 { 0.0 } else { 1.0 }))
            .collect();
        let simplified = simplify(&path, 0.1);
        assert_eq!(simplified.len(), path.len());
    }

    #[test]
    fn test_perpendicular_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        assert_relative_eq!(perpendicular_distance(&Point::new(2.0, 3.0), &a, &b), 3.0);
        // Degenerate chord falls back to point distance
        assert_relative_eq!(perpendicular_distance(&Point::new(3.0, 4.0), &a, &a), 5.0);
    }
}
