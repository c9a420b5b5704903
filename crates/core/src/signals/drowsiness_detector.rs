use crate::estimation::event_state_machine::SustainedCondition;
use crate::features::feature_extractor::{eye_aspect_ratio, mouth_aspect_ratio, FaceView};
use crate::shared::config::{ConfigError, DrowsinessConfig};
use crate::shared::landmark_frame::LandmarkFrame;
use crate::shared::score::{DetectorPhase, Score, Signal, MAX_SCORE};
use crate::signals::signal_detector::SignalDetector;

/// Flags sustained eye closure, or drooping eyes combined with a yawn.
///
/// Has no calibration phase. The score ramps from 0 to 100 as the run of
/// consecutive sleepy frames approaches `consec_frames`.
pub struct DrowsinessDetector {
    config: DrowsinessConfig,
    sleepy: SustainedCondition,
    last_score: Option<Score>,
}

impl DrowsinessDetector {
    pub fn new(config: DrowsinessConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sleepy: SustainedCondition::new(config.consec_frames),
            config,
            last_score: None,
        })
    }

    fn is_sleepy_frame(&self, ear: f64, mar: f64) -> bool {
        ear <= self.config.ear_closed || (ear <= self.config.ear_drowsy && mar >= self.config.mar_yawn)
    }

    /// Whether the sleepy state is currently asserted.
    pub fn is_sleepy(&self) -> bool {
        self.sleepy.is_asserted()
    }

    pub fn consecutive_frames(&self) -> usize {
        self.sleepy.consecutive()
    }
}

impl SignalDetector for DrowsinessDetector {
    fn signal(&self) -> Signal {
        Signal::Drowsiness
    }

    fn process(&mut self, frame: &LandmarkFrame) -> Option<Score> {
        let Some(face) = FaceView::from_frame(frame) else {
            return self.last_score.clone();
        };

        let eyes = eye_aspect_ratio(&face);
        let mouth = mouth_aspect_ratio(&face);
        let sleepy_frame = self.is_sleepy_frame(eyes.ear, mouth.ratio);

        let was_asserted = self.sleepy.is_asserted();
        if self.sleepy.update(sleepy_frame) && !was_asserted {
            log::debug!("Drowsiness asserted at frame {}", frame.index());
        }

        let mut points = eyes.points();
        points.extend_from_slice(&mouth.points);
        let score = Score::new(self.sleepy.progress() * MAX_SCORE, points);
        self.last_score = Some(score.clone());
        Some(score)
    }

    fn phase(&self) -> DetectorPhase {
        DetectorPhase::Active
    }

    fn last_score(&self) -> Option<&Score> {
        self.last_score.as_ref()
    }

    fn counters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("sleepy_frames", self.sleepy.consecutive() as f64),
            ("sleepy", if self.is_sleepy() { 1.0 } else { 0.0 }),
        ]
    }
}
