use crate::estimation::calibration_tracker::CalibrationTracker;
use crate::estimation::event_state_machine::{Direction, DirectionalHysteresis};
use crate::estimation::rate_meter::RateMeter;
use crate::estimation::score_fusion::ScoreFusion;
use crate::features::feature_extractor::{yaw_ratio, FaceView};
use crate::shared::config::{AttentionConfig, ConfigError};
use crate::shared::landmark_frame::LandmarkFrame;
use crate::shared::score::{clamp_score, DetectorPhase, Score, Signal};
use crate::signals::signal_detector::SignalDetector;

/// Score points at a deviation exactly on the direction threshold.
const DEVIATION_SCORE_AT_THRESHOLD: f64 = 50.0;

/// Tracks head turns away from a calibrated frontal pose.
///
/// The yaw ratio is averaged over `calibration_frames` face frames. After
/// that, each frame's deviation from the baseline is classified as
/// LEFT/RIGHT/CENTER and fed through directional hysteresis to count
/// sustained turns.
pub struct AttentionDetector {
    config: AttentionConfig,
    calibration: CalibrationTracker<1>,
    turns: DirectionalHysteresis,
    rate: RateMeter,
    fusion: ScoreFusion<2>,
    direction: Direction,
    last_score: Option<Score>,
}

impl AttentionDetector {
    pub fn new(config: AttentionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            calibration: CalibrationTracker::new(config.calibration_frames),
            turns: DirectionalHysteresis::new(config.min_stable_frames),
            rate: RateMeter::new(),
            fusion: ScoreFusion::new("attention", config.weights.table())?,
            direction: Direction::Center,
            config,
            last_score: None,
        })
    }

    /// Direction observed on the most recent scored frame.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Last direction the hysteresis committed to.
    pub fn committed_direction(&self) -> Direction {
        self.turns.committed()
    }

    pub fn baseline(&self) -> Option<f64> {
        self.calibration.baseline().map(|[yaw]| yaw)
    }

    pub fn turn_count(&self) -> u64 {
        self.turns.transitions()
    }

    pub fn turns_per_minute(&self, now: std::time::Duration) -> f64 {
        self.rate.per_minute(self.turns.transitions(), now)
    }
}

impl SignalDetector for AttentionDetector {
    fn signal(&self) -> Signal {
        Signal::Attention
    }

    fn process(&mut self, frame: &LandmarkFrame) -> Option<Score> {
        self.rate.start(frame.timestamp());
        let Some(face) = FaceView::from_frame(frame) else {
            return self.last_score.clone();
        };

        let yaw = yaw_ratio(&face);
        let [baseline] = self.calibration.scoring_baseline([yaw.ratio])?;

        let deviation = yaw.ratio - baseline;
        self.direction = Direction::classify(deviation, self.config.deviation_threshold);
        if self.turns.update(self.direction) {
            log::debug!(
                "Head turn {} committed at frame {} (total {})",
                self.direction,
                frame.index(),
                self.turns.transitions()
            );
        }

        let deviation_score =
            clamp_score(deviation.abs() / self.config.deviation_threshold * DEVIATION_SCORE_AT_THRESHOLD);
        let turn_score = clamp_score(self.turns_per_minute(frame.timestamp()) * self.config.turn_rate_gain);

        let score = Score::new(self.fusion.fuse([deviation_score, turn_score]), yaw.points.to_vec());
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
        vec![("turns", self.turns.transitions() as f64)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{empty_frame, face_frame, timestamp, FaceBuilder};
    use approx::assert_relative_eq;

    fn detector(calibration_frames: usize, min_stable_frames: usize) -> AttentionDetector {
        AttentionDetector::new(AttentionConfig {
            calibration_frames,
            min_stable_frames,
            ..Default::default()
        })
        .unwrap()
    }

    /// Runs `count` frames of `face` starting at `*next`, returning the last score.
    fn run(d: &mut AttentionDetector, next: &mut usize, face: &FaceBuilder, count: usize) -> Option<Score> {
        let mut last = None;
        for _ in 0..count {
            last = d.process(&face_frame(*next, face));
            *next += 1;
        }
        last
    }

    #[test]
    fn test_calibrating_then_active() {
        let mut d = detector(40, 10);
        let mut next = 0;
        assert!(run(&mut d, &mut next, &FaceBuilder::neutral(), 39).is_none());
        assert_eq!(
            d.phase(),
            DetectorPhase::Calibrating {
                observed: 39,
                required: 40
            }
        );

        // The completing frame is absorbed into the baseline.
        assert!(run(&mut d, &mut next, &FaceBuilder::neutral(), 1).is_none());
        assert!(d.phase().is_active());
        assert_relative_eq!(d.baseline().unwrap(), 1.0, epsilon = 1e-12);

        let score = run(&mut d, &mut next, &FaceBuilder::neutral(), 1).unwrap();
        assert_relative_eq!(score.value(), 0.0, epsilon = 1e-9);
        assert_eq!(score.points().len(), 3);
    }

    #[test]
    fn test_sustained_turn_counts_once() {
        let mut d = detector(5, 10);
        let mut next = 0;
        run(&mut d, &mut next, &FaceBuilder::neutral(), 5);

        let turned = FaceBuilder::neutral().nose_offset(40.0);
        run(&mut d, &mut next, &turned, 9);
        assert_eq!(d.turn_count(), 0);
        assert_eq!(d.direction(), Direction::Left);

        run(&mut d, &mut next, &turned, 20);
        assert_eq!(d.turn_count(), 1);
        assert_eq!(d.committed_direction(), Direction::Left);
    }

    #[test]
    fn test_brief_glance_is_ignored() {
        let mut d = detector(5, 3);
        let mut next = 0;
        run(&mut d, &mut next, &FaceBuilder::neutral(), 5);
        run(&mut d, &mut next, &FaceBuilder::neutral(), 3);
        run(&mut d, &mut next, &FaceBuilder::neutral().nose_offset(-40.0), 1);
        run(&mut d, &mut next, &FaceBuilder::neutral(), 3);
        assert_eq!(d.turn_count(), 0);
    }

    #[test]
    fn test_score_matches_fusion_formula() {
        let mut d = detector(5, 2);
        let mut next = 0;
        run(&mut d, &mut next, &FaceBuilder::neutral(), 5);

        // yaw 1.5 -> deviation 0.5 -> deviation score 0.5 / 0.3 * 50
        let turned = FaceBuilder::neutral().nose_offset(40.0);
        let score = run(&mut d, &mut next, &turned, 2).unwrap();
        assert_eq!(d.turn_count(), 1);

        let deviation_score = 0.5 / 0.3 * 50.0;
        let tpm = 60.0 / timestamp(next - 1).as_secs_f64();
        let turn_score = (tpm * 10.0).min(100.0);
        let expected = 0.6 * deviation_score + 0.4 * turn_score;
        assert_relative_eq!(score.value(), expected, epsilon = 1e-6);
        assert_relative_eq!(d.turns_per_minute(timestamp(next - 1)), tpm, epsilon = 1e-9);
    }

    #[test]
    fn test_no_face_keeps_state() {
        let mut d = detector(3, 2);
        let mut next = 0;
        run(&mut d, &mut next, &FaceBuilder::neutral(), 2);
        assert!(d.process(&empty_frame(next)).is_none());
        next += 1;
        assert_eq!(
            d.phase(),
            DetectorPhase::Calibrating {
                observed: 2,
                required: 3
            }
        );

        run(&mut d, &mut next, &FaceBuilder::neutral(), 1);
        let scored = run(&mut d, &mut next, &FaceBuilder::neutral(), 1);
        let held = d.process(&empty_frame(next));
        assert_eq!(held, scored);
    }

    #[test]
    fn test_calibration_starvation_stays_calibrating() {
        let mut d = detector(3, 2);
        for i in 0..100 {
            assert!(d.process(&empty_frame(i)).is_none());
        }
        assert_eq!(
            d.phase(),
            DetectorPhase::Calibrating {
                observed: 0,
                required: 3
            }
        );
    }
}
