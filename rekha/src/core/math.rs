//! Compass arithmetic in degrees.
//!
//! Headings in this crate are compass bearings: 0° is magnetic North (+y),
//! 90° is East (+x), increasing clockwise.

/// Normalize an angle in degrees to [0, 360).
///
/// # Example
/// ```
/// use rekha::core::math::normalize_degrees;
///
/// assert_eq!(normalize_degrees(370.0), 10.0);
/// assert_eq!(normalize_degrees(-90.0), 270.0);
/// assert_eq!(normalize_degrees(360.0), 0.0);
/// ```
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Shortest signed difference from `a` to `b` in degrees, in (-180, 180].
///
/// # Example
/// ```
/// use rekha::core::math::heading_diff;
///
/// assert_eq!(heading_diff(350.0, 10.0), 20.0);
/// assert_eq!(heading_diff(10.0, 350.0), -20.0);
/// ```
#[inline]
pub fn heading_diff(a: f64, b: f64) -> f64 {
    let d = normalize_degrees(b - a);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Unit displacement for a compass heading: `(sin θ, cos θ)`.
#[inline]
pub fn heading_vector(heading_deg: f64) -> (f64, f64) {
    heading_deg.to_radians().sin_cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_in_range() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(359.5), 359.5);
    }

    #[test]
    fn test_normalize_wraps() {
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(720.0 + 45.0), 45.0);
        assert_eq!(normalize_degrees(-45.0), 315.0);
        assert_eq!(normalize_degrees(-720.0), 0.0);
    }

    #[test]
    fn test_normalize_tiny_negative() {
        let a = normalize_degrees(-1e-15);
        assert!((0.0..360.0).contains(&a));
    }

    #[test]
    fn test_heading_diff_crossing_north() {
        assert_relative_eq!(heading_diff(359.0, 1.0), 2.0, epsilon = 1e-9);
        assert_relative_eq!(heading_diff(1.0, 359.0), -2.0, epsilon = 1e-9);
        assert_relative_eq!(heading_diff(0.0, 180.0), 180.0);
    }

    #[test]
    fn test_heading_vector_cardinals() {
        let (x, y) = heading_vector(0.0);
        assert_relative_eq!(x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(y, 1.0, epsilon = 1e-12);

        let (x, y) = heading_vector(90.0);
        assert_relative_eq!(x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(y, 0.0, epsilon = 1e-12);

        let (x, y) = heading_vector(225.0);
        assert_relative_eq!(x, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(y, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
    }
}
