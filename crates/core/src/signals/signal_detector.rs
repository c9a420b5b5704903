use crate::shared::landmark_frame::LandmarkFrame;
use crate::shared::score::{DetectorPhase, Score, Signal};

/// Domain interface for one cognitive-state estimator.
///
/// Detectors are stateful (baselines, debounce counters, event rates),
/// hence `&mut self`. Each instance is owned by exactly one thread at a time.
///
/// Frames without a face leave all state untouched and return the previous
/// score. `None` means no score exists yet (still calibrating).
pub trait SignalDetector: Send {
    fn signal(&self) -> Signal;

    fn process(&mut self, frame: &LandmarkFrame) -> Option<Score>;

    fn phase(&self) -> DetectorPhase;

    fn last_score(&self) -> Option<&Score>;

    /// Named event counters accumulated so far (turns, blinks, ...).
    fn counters(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}
