use std::time::Instant;

use crate::shared::config::{ConfigError, EstimationConfig};
use crate::shared::landmark_frame::LandmarkFrame;
use crate::shared::score::{DetectorPhase, FrameScores, Score, Signal};
use crate::signals::attention_detector::AttentionDetector;
use crate::signals::confusion_detector::ConfusionDetector;
use crate::signals::drowsiness_detector::DrowsinessDetector;
use crate::signals::signal_detector::SignalDetector;
use crate::signals::stress_detector::StressDetector;

/// The set of detectors that every frame is fanned out to.
///
/// Holds at most one detector per [`Signal`]. Each detector is exclusively
/// owned by the bank, or by one worker thread while a threaded executor
/// has lent it out.
pub struct SignalBank {
    detectors: Vec<Box<dyn SignalDetector>>,
}

impl SignalBank {
    pub fn new(detectors: Vec<Box<dyn SignalDetector>>) -> Self {
        Self { detectors }
    }

    /// All four detectors, configured and validated.
    pub fn from_config(config: &EstimationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(vec![
            Box::new(DrowsinessDetector::new(config.drowsiness.clone())?),
            Box::new(AttentionDetector::new(config.attention.clone())?),
            Box::new(StressDetector::new(config.stress.clone())?),
            Box::new(ConfusionDetector::new(config.confusion.clone())?),
        ]))
    }

    /// Runs every detector on `frame`, timing each one.
    pub fn process(&mut self, frame: &LandmarkFrame) -> FrameScores {
        let mut scores = FrameScores::new(frame.index(), frame.timestamp(), frame.has_face());
        for detector in &mut self.detectors {
            let start = Instant::now();
            let score = detector.process(frame);
            scores.set(detector.signal(), score, start.elapsed().as_secs_f64() * 1000.0);
        }
        scores
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.detectors.iter().map(|d| d.signal()).collect()
    }

    pub fn phases(&self) -> Vec<(Signal, DetectorPhase)> {
        self.detectors.iter().map(|d| (d.signal(), d.phase())).collect()
    }

    pub fn last_score(&self, signal: Signal) -> Option<&Score> {
        self.detector(signal).and_then(|d| d.last_score())
    }

    pub fn detector(&self, signal: Signal) -> Option<&dyn SignalDetector> {
        self.detectors
            .iter()
            .find(|d| d.signal() == signal)
            .map(|d| &**d)
    }

    pub fn detectors(&self) -> &[Box<dyn SignalDetector>] {
        &self.detectors
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Hands the detectors out, e.g. to worker threads.
    pub fn into_detectors(self) -> Vec<Box<dyn SignalDetector>> {
        self.detectors
    }
}
