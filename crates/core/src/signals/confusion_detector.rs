use std::time::Duration;

use crate::estimation::calibration_tracker::CalibrationTracker;
use crate::estimation::rate_meter::RateMeter;
use crate::estimation::score_fusion::ScoreFusion;
use crate::features::feature_extractor::{brow_metrics, eye_aspect_ratio, head_tilt, yaw_ratio, FaceView};
use crate::features::geometry::safe_ratio;
use crate::shared::config::{ConfigError, ConfusionConfig};
use crate::shared::landmark_frame::LandmarkFrame;
use crate::shared::score::{clamp_score, DetectorPhase, Score, Signal};
use crate::signals::signal_detector::SignalDetector;

/// Estimates confusion from six facial cues:
///
/// | cue        | metric                                           |
/// |------------|--------------------------------------------------|
/// | raise      | brow raise above baseline, percent               |
/// | inward     | inner-brow pinch below baseline, percent         |
/// | asymmetry  | left/right raise difference, pixels              |
/// | tilt       | head roll, degrees                               |
/// | squint     | EAR inside a band just below baseline            |
/// | yaw change | side glances per second                          |
///
/// Baselines for raise, inward ratio and EAR come from the first
/// `calibration_frames` face frames.
pub struct ConfusionDetector {
    config: ConfusionConfig,
    calibration: CalibrationTracker<3>,
    rate: RateMeter,
    fusion: ScoreFusion<6>,
    last_yaw: f64,
    yaw_changes: u64,
    last_score: Option<Score>,
}

impl ConfusionDetector {
    pub fn new(config: ConfusionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            calibration: CalibrationTracker::new(config.calibration_frames),
            rate: RateMeter::new(),
            fusion: ScoreFusion::new("confusion", config.weights.table())?,
            last_yaw: config.initial_yaw_ratio,
            yaw_changes: 0,
            config,
            last_score: None,
        })
    }

    pub fn yaw_change_count(&self) -> u64 {
        self.yaw_changes
    }

    pub fn yaw_changes_per_second(&self, now: Duration) -> f64 {
        self.rate.per_second(self.yaw_changes, now)
    }

    /// `[brow_raise, inward_ratio, ear]` once calibrated.
    pub fn baseline(&self) -> Option<[f64; 3]> {
        self.calibration.baseline()
    }

    fn squint_score(&self, ear: f64, baseline_ear: f64) -> f64 {
        let low = self.config.squint_low * baseline_ear;
        let high = self.config.squint_high * baseline_ear;
        if ear > low && ear < high {
            self.config.squint_score
        } else {
            0.0
        }
    }
}

impl SignalDetector for ConfusionDetector {
    fn signal(&self) -> Signal {
        Signal::Confusion
    }

    fn process(&mut self, frame: &LandmarkFrame) -> Option<Score> {
        self.rate.start(frame.timestamp());
        let Some(face) = FaceView::from_frame(frame) else {
            return self.last_score.clone();
        };

        let brows = brow_metrics(&face);
        let eyes = eye_aspect_ratio(&face);
        let [base_raise, base_inward, base_ear] =
            self.calibration
                .scoring_baseline([brows.raise, brows.inward, eyes.ear])?;

        let tilt = head_tilt(&face);
        let yaw = yaw_ratio(&face);
        if (yaw.ratio - self.last_yaw).abs() > self.config.yaw_change_delta {
            self.yaw_changes += 1;
        }
        self.last_yaw = yaw.ratio;

        let c = &self.config;
        let components = [
            clamp_score(safe_ratio((brows.raise - base_raise).max(0.0), base_raise) * c.raise_gain),
            clamp_score(safe_ratio((base_inward - brows.inward).max(0.0), base_inward) * c.inward_gain),
            clamp_score(brows.asymmetry * c.asymmetry_gain),
            clamp_score(tilt.angle_degrees.abs() * c.tilt_gain),
            self.squint_score(eyes.ear, base_ear),
            clamp_score(self.yaw_changes_per_second(frame.timestamp()) * c.yaw_rate_gain),
        ];

        let mut points = brows.points.to_vec();
        points.extend_from_slice(&tilt.points);
        points.extend_from_slice(&yaw.points);
        points.extend(eyes.points());
        let score = Score::new(self.fusion.fuse(components), points);
        self.last_score = Some(score.clone());
        Some(score)
    }

    fn phase(&self) -> DetectorPhase {
        self.calibration.phase()
    }

    fn last_score(&self) -> Option<&Score> {
        self.last_score.as_ref()
    }

    fn counters(&self) -> Vec<(&'static str, f64)> {
        vec![("yaw_changes", self.yaw_changes as f64)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{LEFT_INNER_BROW, RIGHT_EYE_OUTER};
    use crate::shared::landmark_frame::PixelPoint;
    use crate::test_support::{empty_frame, face_frame, timestamp, FaceBuilder};
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn calibrated(calibration_frames: usize) -> ConfusionDetector {
        let mut d = ConfusionDetector::new(ConfusionConfig {
            calibration_frames,
            ..Default::default()
        })
        .unwrap();
        for i in 0..calibration_frames {
            assert!(d.process(&face_frame(i, &FaceBuilder::neutral())).is_none());
        }
        d
    }

    fn score_after_calibration(face: &FaceBuilder) -> f64 {
        let mut d = calibrated(60);
        d.process(&face_frame(60, face)).unwrap().value()
    }

    #[test]
    fn test_neutral_face_scores_zero() {
        assert_relative_eq!(score_after_calibration(&FaceBuilder::neutral()), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_doubled_brow_raise() {
        // Raise 50 -> 100 px: 100% deviation, raise score 100, weighted 0.25.
        let value = score_after_calibration(&FaceBuilder::neutral().brow_height(290.0));
        assert_relative_eq!(value, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_points_cover_brows_tilt_yaw_and_eyes() {
        let mut d = calibrated(5);
        let score = d.process(&face_frame(5, &FaceBuilder::neutral())).unwrap();
        let points = score.points();
        assert_eq!(points.len(), 4 + 2 + 3 + 12);
        assert!(points.contains(&PixelPoint::new(300, 500)));
        assert!(points.contains(&PixelPoint::new(700, 500)));
    }

    #[test]
    fn test_one_sided_raise_adds_asymmetry() {
        // Left raise 70, right 50: mean 60 (+20%), asymmetry 20 px.
        let face = FaceBuilder::neutral().with(LEFT_INNER_BROW, 440.0, 320.0);
        let expected = 0.25 * 20.0 + 0.15 * 60.0;
        assert_relative_eq!(score_after_calibration(&face), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_head_tilt() {
        // Right corner at (600, 600): 45 degrees -> 90, weighted 0.20.
        let face = FaceBuilder::neutral().with(RIGHT_EYE_OUTER, 600.0, 600.0);
        let value = score_after_calibration(&face);
        assert!(value >= 0.20 * 90.0 - 1e-9, "value = {value}");
    }

    #[rstest]
    #[case::inside_band(9.0, 60.0)]
    #[case::at_baseline(10.0, 0.0)]
    #[case::too_narrow(7.0, 0.0)]
    fn test_squint_band(#[case] half_gap: f64, #[case] expected: f64) {
        let d = calibrated(5);
        let [_, _, base_ear] = d.baseline().unwrap();
        assert_relative_eq!(d.squint_score(half_gap / 30.0, base_ear), expected);
    }

    #[test]
    fn test_yaw_changes_counted_per_second() {
        let mut d = calibrated(5);
        let frames = [
            FaceBuilder::neutral().nose_offset(40.0),
            FaceBuilder::neutral().nose_offset(40.0),
            FaceBuilder::neutral(),
            FaceBuilder::neutral().nose_offset(4.0),
        ];
        for (i, face) in frames.iter().enumerate() {
            d.process(&face_frame(5 + i, face));
        }
        // 1.0 -> 1.5 and 1.5 -> 1.0 count; 1.0 -> 1.04 does not.
        assert_eq!(d.yaw_change_count(), 2);
        assert_relative_eq!(
            d.yaw_changes_per_second(timestamp(8)),
            2.0 / timestamp(8).as_secs_f64(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_calibration_ignores_no_face_frames() {
        let mut d = ConfusionDetector::new(ConfusionConfig::default()).unwrap();
        for i in 0..30 {
            d.process(&face_frame(2 * i, &FaceBuilder::neutral()));
            assert!(d.process(&empty_frame(2 * i + 1)).is_none());
        }
        assert_eq!(
            d.phase(),
            DetectorPhase::Calibrating {
                observed: 30,
                required: 60
            }
        );
    }

    #[test]
    fn test_extreme_inputs_stay_in_range() {
        let mut d = calibrated(5);
        let faces = [
            FaceBuilder::neutral().brow_height(0.0).nose_offset(150.0),
            FaceBuilder::neutral().with(RIGHT_EYE_OUTER, 400.0, 900.0).nose_offset(-150.0),
            FaceBuilder::neutral().with(LEFT_INNER_BROW, 560.0, 10.0),
        ];
        for (i, face) in faces.iter().enumerate() {
            let value = d.process(&face_frame(5 + i, face)).unwrap().value();
            assert!((0.0..=100.0).contains(&value), "value = {value}");
        }
    }
}
