//! Geometric metrics over one face mesh.
//!
//! Every extractor is a pure function of the landmarks and the frame size.
//! Each returns its scalar metric(s) together with the pixel points it used,
//! so overlays can draw exactly what was measured. Ratios with a zero
//! reference distance evaluate to 0.0.

use crate::features::geometry::{delta, euclidean, safe_ratio};
use crate::shared::constants::*;
use crate::shared::landmark_frame::{FrameSize, LandmarkFrame, LandmarkSet, PixelPoint};

/// A face mesh paired with the frame size needed to de-normalize it.
#[derive(Clone, Copy, Debug)]
pub struct FaceView<'a> {
    landmarks: &'a LandmarkSet,
    size: FrameSize,
}

impl<'a> FaceView<'a> {
    pub fn new(landmarks: &'a LandmarkSet, size: FrameSize) -> Self {
        Self { landmarks, size }
    }

    /// `None` when no face was detected in the frame.
    pub fn from_frame(frame: &'a LandmarkFrame) -> Option<Self> {
        frame.face().map(|landmarks| Self::new(landmarks, frame.size()))
    }

    pub fn pixel(&self, index: usize) -> PixelPoint {
        self.size.to_pixel(self.landmarks.mesh_point(index))
    }

    fn pixels<const N: usize>(&self, indices: [usize; N]) -> [PixelPoint; N] {
        indices.map(|i| self.pixel(i))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EyeFeatures {
    /// Mean eye-aspect-ratio of both eyes.
    pub ear: f64,
    pub left: [PixelPoint; 6],
    pub right: [PixelPoint; 6],
}

impl EyeFeatures {
    pub fn points(&self) -> Vec<PixelPoint> {
        self.left.iter().chain(self.right.iter()).copied().collect()
    }
}

/// `(|p2-p6| + |p3-p5|) / (2 |p1-p4|)` over a six-point eye contour.
fn single_eye_ratio(p: &[PixelPoint; 6]) -> f64 {
    let vertical = euclidean(p[1], p[5]) + euclidean(p[2], p[4]);
    let horizontal = euclidean(p[0], p[3]);
    safe_ratio(vertical, 2.0 * horizontal)
}

pub fn eye_aspect_ratio(face: &FaceView<'_>) -> EyeFeatures {
    let left = face.pixels(LEFT_EYE);
    let right = face.pixels(RIGHT_EYE);
    let ear = (single_eye_ratio(&left) + single_eye_ratio(&right)) / 2.0;
    EyeFeatures { ear, left, right }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MouthFeatures {
    /// Lip gap over mouth width. Used both as MAR and as the stress lip ratio.
    pub ratio: f64,
    /// `[top, bottom, left, right]`.
    pub points: [PixelPoint; 4],
}

pub fn mouth_aspect_ratio(face: &FaceView<'_>) -> MouthFeatures {
    let points = face.pixels([MOUTH_TOP, MOUTH_BOTTOM, MOUTH_LEFT, MOUTH_RIGHT]);
    let vertical = euclidean(points[0], points[1]);
    let horizontal = euclidean(points[2], points[3]);
    MouthFeatures {
        ratio: safe_ratio(vertical, horizontal),
        points,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct YawFeatures {
    /// Nose-to-left-cheek over nose-to-right-cheek distance. 1.0 is frontal.
    pub ratio: f64,
    /// `[nose, left_cheek, right_cheek]`.
    pub points: [PixelPoint; 3],
}

pub fn yaw_ratio(face: &FaceView<'_>) -> YawFeatures {
    let points = face.pixels([NOSE_TIP, LEFT_CHEEK, RIGHT_CHEEK]);
    let left = euclidean(points[0], points[1]);
    let right = euclidean(points[0], points[2]);
    YawFeatures {
        ratio: safe_ratio(left, right),
        points,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrowEyeDistance {
    /// Mean inner-brow to upper-eyelid distance in pixels. Shrinks when the
    /// brows are lowered or furrowed.
    pub distance: f64,
    /// `[left_brow, right_brow, left_eye_top, right_eye_top]`.
    pub points: [PixelPoint; 4],
}

pub fn brow_eye_distance(face: &FaceView<'_>) -> BrowEyeDistance {
    let points = face.pixels([LEFT_INNER_BROW, RIGHT_INNER_BROW, LEFT_EYE_TOP, RIGHT_EYE_TOP]);
    let left = euclidean(points[0], points[2]);
    let right = euclidean(points[1], points[3]);
    BrowEyeDistance {
        distance: (left + right) / 2.0,
        points,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrowFeatures {
    /// Mean vertical drop from inner brow to eye top, in pixels.
    pub raise: f64,
    pub left_raise: f64,
    pub right_raise: f64,
    /// `|left_raise - right_raise|`.
    pub asymmetry: f64,
    /// Inner-brow distance over outer-brow distance; drops as brows pinch.
    pub inward: f64,
    /// `[outer_left, outer_right, inner_left, inner_right]`.
    pub points: [PixelPoint; 4],
}

pub fn brow_metrics(face: &FaceView<'_>) -> BrowFeatures {
    let points = face.pixels([
        LEFT_OUTER_BROW,
        RIGHT_OUTER_BROW,
        LEFT_INNER_BROW,
        RIGHT_INNER_BROW,
    ]);
    let [outer_left, outer_right, inner_left, inner_right] = points;
    let left_eye_top = face.pixel(LEFT_EYE_TOP);
    let right_eye_top = face.pixel(RIGHT_EYE_TOP);

    let (_, left_raise) = delta(left_eye_top, inner_left);
    let (_, right_raise) = delta(right_eye_top, inner_right);

    BrowFeatures {
        raise: (left_raise + right_raise) / 2.0,
        left_raise,
        right_raise,
        asymmetry: (left_raise - right_raise).abs(),
        inward: safe_ratio(
            euclidean(inner_left, inner_right),
            euclidean(outer_left, outer_right),
        ),
        points,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TiltFeatures {
    /// Absolute roll of the eye-corner line, in degrees.
    pub angle_degrees: f64,
    /// `[left_eye_outer, right_eye_outer]`.
    pub points: [PixelPoint; 2],
}

pub fn head_tilt(face: &FaceView<'_>) -> TiltFeatures {
    let points = face.pixels([LEFT_EYE_OUTER, RIGHT_EYE_OUTER]);
    let (dx, dy) = delta(points[1], points[0]);
    TiltFeatures {
        angle_degrees: dy.atan2(dx).to_degrees().abs(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{frame_size, FaceBuilder};
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn view(set: &LandmarkSet) -> FaceView<'_> {
        FaceView::new(set, frame_size())
    }

    // ── eye aspect ratio ────────────────────────────────────────────

    #[rstest]
    #[case::open(10.0, 1.0 / 3.0)]
    #[case::drowsy(6.0, 0.2)]
    #[case::closed(0.0, 0.0)]
    fn test_ear_tracks_lid_gap(#[case] half_gap: f64, #[case] expected: f64) {
        let set = FaceBuilder::neutral().eye_opening(half_gap).build();
        let eyes = eye_aspect_ratio(&view(&set));
        assert_relative_eq!(eyes.ear, expected, epsilon = 1e-9);
        assert_eq!(eyes.points().len(), 12);
    }

    #[test]
    fn test_ear_zero_width_eye_is_zero() {
        // Collapse both eyes' corners onto one point.
        let mut builder = FaceBuilder::neutral();
        for i in [LEFT_EYE[0], LEFT_EYE[3], RIGHT_EYE[0], RIGHT_EYE[3]] {
            builder = builder.with(i, 450.0, 400.0);
        }
        let set = builder.build();
        assert_relative_eq!(eye_aspect_ratio(&view(&set)).ear, 0.0);
    }

    // ── mouth ───────────────────────────────────────────────────────

    #[test]
    fn test_mar_neutral_and_yawn() {
        let set = FaceBuilder::neutral().build();
        assert_relative_eq!(mouth_aspect_ratio(&view(&set)).ratio, 0.2, epsilon = 1e-9);

        let set = FaceBuilder::neutral().mouth_opening(40.0).build();
        assert_relative_eq!(mouth_aspect_ratio(&view(&set)).ratio, 0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_mar_zero_width_mouth_is_zero() {
        let set = FaceBuilder::neutral()
            .with(MOUTH_LEFT, 500.0, 610.0)
            .with(MOUTH_RIGHT, 500.0, 610.0)
            .build();
        assert_relative_eq!(mouth_aspect_ratio(&view(&set)).ratio, 0.0);
    }

    // ── yaw ─────────────────────────────────────────────────────────

    #[rstest]
    #[case::frontal(0.0, 1.0)]
    #[case::turned_left(40.0, 1.5)]
    #[case::turned_right(-40.0, 160.0 / 240.0)]
    fn test_yaw_ratio(#[case] dx: f64, #[case] expected: f64) {
        let set = FaceBuilder::neutral().nose_offset(dx).build();
        let yaw = yaw_ratio(&view(&set));
        assert_relative_eq!(yaw.ratio, expected, epsilon = 1e-9);
        assert_eq!(yaw.points[0], PixelPoint::new((500.0 + dx) as i32, 500));
    }

    #[test]
    fn test_yaw_nose_on_right_cheek_is_zero() {
        let set = FaceBuilder::neutral().nose_offset(200.0).build();
        assert_relative_eq!(yaw_ratio(&view(&set)).ratio, 0.0);
    }

    // ── brows ───────────────────────────────────────────────────────

    #[test]
    fn test_brow_eye_distance_neutral() {
        let set = FaceBuilder::neutral().build();
        assert_relative_eq!(brow_eye_distance(&view(&set)).distance, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_brow_eye_distance_lowered() {
        let set = FaceBuilder::neutral().brow_height(365.0).build();
        assert_relative_eq!(brow_eye_distance(&view(&set)).distance, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_brow_metrics_neutral() {
        let set = FaceBuilder::neutral().build();
        let brows = brow_metrics(&view(&set));
        assert_relative_eq!(brows.raise, 50.0);
        assert_relative_eq!(brows.asymmetry, 0.0);
        assert_relative_eq!(brows.inward, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_brow_metrics_one_sided_raise() {
        let set = FaceBuilder::neutral()
            .with(LEFT_INNER_BROW, 440.0, 320.0)
            .build();
        let brows = brow_metrics(&view(&set));
        assert_relative_eq!(brows.left_raise, 70.0);
        assert_relative_eq!(brows.right_raise, 50.0);
        assert_relative_eq!(brows.raise, 60.0);
        assert_relative_eq!(brows.asymmetry, 20.0);
    }

    #[test]
    fn test_brow_inward_zero_outer_span_is_zero() {
        let set = FaceBuilder::neutral()
            .with(LEFT_OUTER_BROW, 500.0, 350.0)
            .with(RIGHT_OUTER_BROW, 500.0, 350.0)
            .build();
        assert_relative_eq!(brow_metrics(&view(&set)).inward, 0.0);
    }

    // ── tilt ────────────────────────────────────────────────────────

    #[test]
    fn test_head_tilt_level() {
        let set = FaceBuilder::neutral().build();
        assert_relative_eq!(head_tilt(&view(&set)).angle_degrees, 0.0);
    }

    #[rstest]
    #[case::clockwise(600.0, 600.0)]
    #[case::counter_clockwise(600.0, 200.0)]
    fn test_head_tilt_45_degrees(#[case] x: f64, #[case] y: f64) {
        // Left corner at (400, 400); right corner 200 px away on a diagonal.
        let set = FaceBuilder::neutral().with(RIGHT_EYE_OUTER, x, y).build();
        assert_relative_eq!(head_tilt(&view(&set)).angle_degrees, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_from_frame_without_face() {
        let frame = crate::test_support::empty_frame(0);
        assert!(FaceView::from_frame(&frame).is_none());
    }
}
