use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::landmark_frame::PixelPoint;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Clamps to `[0, 100]` with `min(100, max(0, x))` semantics.
///
/// NaN collapses to 0 because `f64::max` prefers the non-NaN operand.
pub fn clamp_score(value: f64) -> f64 {
    value.max(MIN_SCORE).min(MAX_SCORE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Drowsiness,
    Attention,
    Stress,
    Confusion,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::Drowsiness,
        Signal::Attention,
        Signal::Stress,
        Signal::Confusion,
    ];

    /// Stable slot of this signal in per-signal arrays.
    pub fn slot(self) -> usize {
        match self {
            Signal::Drowsiness => 0,
            Signal::Attention => 1,
            Signal::Stress => 2,
            Signal::Confusion => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Signal::Drowsiness => "drowsiness",
            Signal::Attention => "attention",
            Signal::Stress => "stress",
            Signal::Confusion => "confusion",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Drowsiness => write!(f, "Drowsiness"),
            Signal::Attention => write!(f, "Attention"),
            Signal::Stress => write!(f, "Stress"),
            Signal::Confusion => write!(f, "Confusion"),
        }
    }
}

/// One signal's estimate for one frame, with the pixel points that fed it
/// so an overlay can draw them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Score {
    value: f64,
    points: Vec<PixelPoint>,
}

impl Score {
    /// The value is clamped to `[0, 100]`.
    pub fn new(value: f64, points: Vec<PixelPoint>) -> Self {
        Self {
            value: clamp_score(value),
            points,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }
}

/// Lifecycle of a detector. `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DetectorPhase {
    Calibrating { observed: usize, required: usize },
    Active,
}

impl DetectorPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, DetectorPhase::Active)
    }
}

/// All four signal estimates for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameScores {
    frame_index: usize,
    timestamp: Duration,
    face_detected: bool,
    scores: [Option<Score>; 4],
    /// Milliseconds each detector spent on this frame.
    timings_ms: [f64; 4],
}

impl FrameScores {
    pub fn new(frame_index: usize, timestamp: Duration, face_detected: bool) -> Self {
        Self {
            frame_index,
            timestamp,
            face_detected,
            scores: [None, None, None, None],
            timings_ms: [0.0; 4],
        }
    }

    pub fn set(&mut self, signal: Signal, score: Option<Score>, elapsed_ms: f64) {
        self.scores[signal.slot()] = score;
        self.timings_ms[signal.slot()] = elapsed_ms;
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn face_detected(&self) -> bool {
        self.face_detected
    }

    pub fn get(&self, signal: Signal) -> Option<&Score> {
        self.scores[signal.slot()].as_ref()
    }

    pub fn value(&self, signal: Signal) -> Option<f64> {
        self.get(signal).map(Score::value)
    }

    pub fn timing_ms(&self, signal: Signal) -> f64 {
        self.timings_ms[signal.slot()]
    }

    /// `(signal, value)` pairs for every signal that produced a score.
    pub fn values(&self) -> Vec<(Signal, f64)> {
        Signal::ALL
            .iter()
            .filter_map(|&s| self.value(s).map(|v| (s, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::inside(42.5, 42.5)]
    #[case::negative(-10.0, 0.0)]
    #[case::above(250.0, 100.0)]
    #[case::nan(f64::NAN, 0.0)]
    #[case::pos_inf(f64::INFINITY, 100.0)]
    #[case::neg_inf(f64::NEG_INFINITY, 0.0)]
    fn test_clamp_score(#[case] input: f64, #[case] expected: f64) {
        assert_relative_eq!(clamp_score(input), expected);
    }

    #[test]
    fn test_score_new_clamps() {
        assert_relative_eq!(Score::new(140.0, vec![]).value(), 100.0);
        assert_relative_eq!(Score::new(-3.0, vec![]).value(), 0.0);
    }

    #[test]
    fn test_signal_slots_are_distinct() {
        let mut slots: Vec<usize> = Signal::ALL.iter().map(|s| s.slot()).collect();
        slots.sort();
        assert_eq!(slots, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_frame_scores_values_skip_absent() {
        let mut scores = FrameScores::new(7, Duration::from_secs(1), true);
        scores.set(Signal::Stress, Some(Score::new(30.0, vec![])), 0.2);
        scores.set(Signal::Attention, None, 0.1);

        assert_eq!(scores.values(), vec![(Signal::Stress, 30.0)]);
        assert_eq!(scores.value(Signal::Drowsiness), None);
        assert_relative_eq!(scores.timing_ms(Signal::Stress), 0.2);
    }

    #[test]
    fn test_phase_serializes_with_tag() {
        let json = serde_json::to_string(&DetectorPhase::Calibrating {
            observed: 3,
            required: 40,
        })
        .unwrap();
        assert_eq!(json, r#"{"phase":"calibrating","observed":3,"required":40}"#);
    }
}
