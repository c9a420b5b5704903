//! Hysteresis state machines that turn noisy continuous metrics into
//! discrete events.
//!
//! - [`DirectionalHysteresis`]: committed head turns, debounced by a
//!   minimum run of consistent frames.
//! - [`BlinkHysteresis`]: open/closed eye cycles with separate close and
//!   reopen thresholds (a dead-band between them).
//! - [`SustainedCondition`]: a boolean that must hold for N consecutive
//!   frames before it is asserted.

use serde::Serialize;

use crate::shared::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Left,
    Right,
    Center,
}

impl Direction {
    /// Maps a signed deviation from baseline onto a direction using a
    /// symmetric threshold. Values exactly on the threshold are `Center`.
    pub fn classify(deviation: f64, threshold: f64) -> Self {
        if deviation > threshold {
            Direction::Left
        } else if deviation < -threshold {
            Direction::Right
        } else {
            Direction::Center
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Left => write!(f, "LEFT"),
            Direction::Right => write!(f, "RIGHT"),
            Direction::Center => write!(f, "CENTER"),
        }
    }
}

/// Counts committed direction changes.
///
/// A transition commits once one non-center direction, different from the
/// last committed direction, has been observed for `min_stable_frames`
/// consecutive frames. A center frame, a frame matching the committed
/// direction, or a switch to the other side restarts the run.
#[derive(Clone, Debug)]
pub struct DirectionalHysteresis {
    min_stable_frames: usize,
    committed: Direction,
    candidate: Option<Direction>,
    stable_frames: usize,
    transitions: u64,
}

impl DirectionalHysteresis {
    pub fn new(min_stable_frames: usize) -> Self {
        Self {
            min_stable_frames: min_stable_frames.max(1),
            committed: Direction::Center,
            candidate: None,
            stable_frames: 0,
            transitions: 0,
        }
    }

    /// Feeds one observation. Returns `true` on the frame a transition commits.
    pub fn update(&mut self, observed: Direction) -> bool {
        if observed == Direction::Center || observed == self.committed {
            self.candidate = None;
            self.stable_frames = 0;
            return false;
        }

        if self.candidate != Some(observed) {
            self.candidate = Some(observed);
            self.stable_frames = 0;
        }
        self.stable_frames += 1;

        if self.stable_frames < self.min_stable_frames {
            return false;
        }

        self.committed = observed;
        self.candidate = None;
        self.stable_frames = 0;
        self.transitions += 1;
        true
    }

    pub fn committed(&self) -> Direction {
        self.committed
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn stable_frames(&self) -> usize {
        self.stable_frames
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EyeState {
    Open,
    Closed,
}

/// Counts full close-then-reopen cycles of an aperture metric.
///
/// `Open → Closed` when the metric drops strictly below `close_threshold`;
/// `Closed → Open` (one blink) when it rises strictly above the higher
/// `reopen_threshold`. Values inside the dead-band never change state.
#[derive(Clone, Debug)]
pub struct BlinkHysteresis {
    close_threshold: f64,
    reopen_threshold: f64,
    state: EyeState,
    blinks: u64,
}

impl BlinkHysteresis {
    pub fn new(close_threshold: f64, reopen_threshold: f64) -> Result<Self, ConfigError> {
        if !(close_threshold < reopen_threshold) {
            return Err(ConfigError::InvertedBlinkThresholds {
                close: close_threshold,
                reopen: reopen_threshold,
            });
        }
        Ok(Self {
            close_threshold,
            reopen_threshold,
            state: EyeState::Open,
            blinks: 0,
        })
    }

    /// Feeds one aperture sample. Returns `true` when a blink completes.
    pub fn update(&mut self, aperture: f64) -> bool {
        match self.state {
            EyeState::Open if aperture < self.close_threshold => {
                self.state = EyeState::Closed;
                false
            }
            EyeState::Closed if aperture > self.reopen_threshold => {
                self.state = EyeState::Open;
                self.blinks += 1;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> EyeState {
        self.state
    }

    pub fn blinks(&self) -> u64 {
        self.blinks
    }
}

/// Debounces a per-frame condition: asserted once it has held for
/// `required` consecutive frames, reset by any frame where it does not hold.
#[derive(Clone, Debug)]
pub struct SustainedCondition {
    required: usize,
    consecutive: usize,
}

impl SustainedCondition {
    pub fn new(required: usize) -> Self {
        Self {
            required: required.max(1),
            consecutive: 0,
        }
    }

    /// Returns whether the condition is asserted after this frame.
    pub fn update(&mut self, holds: bool) -> bool {
        if holds {
            self.consecutive = self.consecutive.saturating_add(1);
        } else {
            self.consecutive = 0;
        }
        self.is_asserted()
    }

    pub fn is_asserted(&self) -> bool {
        self.consecutive >= self.required
    }

    pub fn consecutive(&self) -> usize {
        self.consecutive
    }

    /// Fraction of the debounce run completed, capped at 1.0.
    pub fn progress(&self) -> f64 {
        (self.consecutive as f64 / self.required as f64).min(1.0)
    }
}
