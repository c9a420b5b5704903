use std::time::Duration;

use crate::estimation::calibration_tracker::CalibrationTracker;
use crate::estimation::event_state_machine::BlinkHysteresis;
use crate::estimation::rate_meter::RateMeter;
use crate::estimation::score_fusion::ScoreFusion;
use crate::features::feature_extractor::{brow_eye_distance, eye_aspect_ratio, mouth_aspect_ratio, FaceView};
use crate::features::geometry::safe_ratio;
use crate::shared::config::{ConfigError, StressConfig};
use crate::shared::landmark_frame::LandmarkFrame;
use crate::shared::score::{clamp_score, DetectorPhase, Score, Signal};
use crate::signals::signal_detector::SignalDetector;

/// Percentage drop of `current` below `baseline`, scaled by `gain`.
/// Increases above the baseline score 0.
fn drop_score(baseline: f64, current: f64, gain: f64) -> f64 {
    clamp_score(safe_ratio((baseline - current).max(0.0), baseline) * gain)
}

/// Estimates stress from lowered brows, pressed lips and blink rate.
///
/// Baselines for brow-to-eye distance and lip ratio come from the first
/// `calibration_frames` face frames. Blinks are only counted once
/// calibration is complete.
pub struct StressDetector {
    config: StressConfig,
    calibration: CalibrationTracker<2>,
    blinks: BlinkHysteresis,
    rate: RateMeter,
    fusion: ScoreFusion<3>,
    last_score: Option<Score>,
}

impl StressDetector {
    pub fn new(config: StressConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            calibration: CalibrationTracker::new(config.calibration_frames),
            blinks: BlinkHysteresis::new(config.blink_close_threshold, config.blink_reopen_threshold)?,
            rate: RateMeter::new(),
            fusion: ScoreFusion::new("stress", config.weights.table())?,
            config,
            last_score: None,
        })
    }

    pub fn blink_count(&self) -> u64 {
        self.blinks.blinks()
    }

    pub fn blinks_per_minute(&self, now: Duration) -> f64 {
        self.rate.per_minute(self.blinks.blinks(), now)
    }

    /// `[brow_eye_distance, lip_ratio]` once calibrated.
    pub fn baseline(&self) -> Option<[f64; 2]> {
        self.calibration.baseline()
    }
}

impl SignalDetector for StressDetector {
    fn signal(&self) -> Signal {
        Signal::Stress
    }

    fn process(&mut self, frame: &LandmarkFrame) -> Option<Score> {
        self.rate.start(frame.timestamp());
        let Some(face) = FaceView::from_frame(frame) else {
            return self.last_score.clone();
        };

        let brow = brow_eye_distance(&face);
        let lip = mouth_aspect_ratio(&face);
        let [base_brow, base_lip] = self.calibration.scoring_baseline([brow.distance, lip.ratio])?;

        let eyes = eye_aspect_ratio(&face);
        if self.blinks.update(eyes.ear) {
            log::debug!("Blink {} at frame {}", self.blinks.blinks(), frame.index());
        }

        let brow_score = drop_score(base_brow, brow.distance, self.config.brow_gain);
        let lip_score = drop_score(base_lip, lip.ratio, self.config.lip_gain);
        let blink_score = clamp_score(self.blinks_per_minute(frame.timestamp()) * self.config.blink_gain);

        let mut points = brow.points.to_vec();
        points.extend_from_slice(&lip.points);
        points.extend(eyes.points());
        let score = Score::new(self.fusion.fuse([brow_score, lip_score, blink_score]), points);
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
        vec![("blinks", self.blinks.blinks() as f64)]
    }
}
