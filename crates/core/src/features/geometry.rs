//! Distance and ratio helpers shared by the feature extractors.

use crate::shared::landmark_frame::PixelPoint;

/// Signed `a - b` per axis, widened to `f64` so saturated pixel
/// coordinates cannot overflow.
pub fn delta(a: PixelPoint, b: PixelPoint) -> (f64, f64) {
    (a.x as f64 - b.x as f64, a.y as f64 - b.y as f64)
}

pub fn euclidean(a: PixelPoint, b: PixelPoint) -> f64 {
    let (dx, dy) = delta(a, b);
    dx.hypot(dy)
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
///
/// Degenerate geometry (coincident reference points) then reads as a
/// neutral metric instead of an infinity or NaN.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_euclidean_3_4_5() {
        let d = euclidean(PixelPoint::new(0, 0), PixelPoint::new(3, 4));
        assert_relative_eq!(d, 5.0);
    }

    #[test]
    fn test_euclidean_same_point() {
        let p = PixelPoint::new(12, -7);
        assert_relative_eq!(euclidean(p, p), 0.0);
    }

    #[test]
    fn test_euclidean_extreme_coordinates_do_not_overflow() {
        let a = PixelPoint::new(i32::MAX, i32::MIN);
        let b = PixelPoint::new(i32::MIN, i32::MAX);
        let span = i32::MAX as f64 - i32::MIN as f64;
        assert_relative_eq!(euclidean(a, b), span * 2f64.sqrt(), max_relative = 1e-12);
        assert_eq!(delta(a, b), (span, -span));
    }

    #[test]
    fn test_safe_ratio_zero_denominator() {
        assert_relative_eq!(safe_ratio(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_safe_ratio_regular() {
        assert_relative_eq!(safe_ratio(1.0, 4.0), 0.25);
    }
}
