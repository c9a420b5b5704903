//! Tunable thresholds for every detector.
//!
//! Defaults are empirically tuned constants. All structs deserialize with
//! `#[serde(default)]` so a partial JSON file only overrides what it names.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed deviation of a fusion weight table's sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    ZeroLength { field: &'static str },
    #[error("{field} must be a finite positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("blink close threshold {close} must be below reopen threshold {reopen}")]
    InvertedBlinkThresholds { close: f64, reopen: f64 },
    #[error("squint band ({low}, {high}) must satisfy 0 < low < high")]
    InvalidSquintBand { low: f64, high: f64 },
    #[error("{signal} fusion weight '{name}' must be finite and non-negative, got {value}")]
    InvalidWeight {
        signal: &'static str,
        name: &'static str,
        value: f64,
    },
    #[error("{signal} fusion weights sum to {sum}, expected 1.0")]
    WeightSum { signal: &'static str, sum: f64 },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Checks a named weight table: each weight finite and non-negative, and the
/// total within `WEIGHT_SUM_TOLERANCE` of 1.0.
pub fn validate_weights(signal: &'static str, table: &[(&'static str, f64)]) -> Result<(), ConfigError> {
    for &(name, value) in table {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidWeight {
                signal,
                name,
                value,
            });
        }
    }
    let sum: f64 = table.iter().map(|(_, w)| w).sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::WeightSum { signal, sum });
    }
    Ok(())
}

fn require_length(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroLength { field });
    }
    Ok(())
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrowsinessConfig {
    /// Consecutive sleepy frames before the sleepy state is asserted.
    pub consec_frames: usize,
    /// EAR at or below which the eyes count as closed on their own.
    pub ear_closed: f64,
    /// EAR at or below which a yawn also counts as sleepy.
    pub ear_drowsy: f64,
    /// MAR at or above which the mouth counts as yawning.
    pub mar_yawn: f64,
}

impl Default for DrowsinessConfig {
    fn default() -> Self {
        Self {
            consec_frames: 15,
            ear_closed: 0.15,
            ear_drowsy: 0.20,
            mar_yawn: 0.35,
        }
    }
}

impl DrowsinessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_length("drowsiness.consec_frames", self.consec_frames)?;
        require_positive("drowsiness.ear_closed", self.ear_closed)?;
        require_positive("drowsiness.ear_drowsy", self.ear_drowsy)?;
        require_positive("drowsiness.mar_yawn", self.mar_yawn)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionWeights {
    pub deviation: f64,
    pub turn_rate: f64,
}

impl Default for AttentionWeights {
    fn default() -> Self {
        Self {
            deviation: 0.6,
            turn_rate: 0.4,
        }
    }
}

impl AttentionWeights {
    pub fn table(&self) -> [(&'static str, f64); 2] {
        [("deviation", self.deviation), ("turn_rate", self.turn_rate)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    pub calibration_frames: usize,
    /// Consecutive frames a new direction must hold before a turn counts.
    pub min_stable_frames: usize,
    /// Symmetric yaw-ratio deviation from baseline that means LEFT/RIGHT.
    pub deviation_threshold: f64,
    /// Score points per turn-per-minute.
    pub turn_rate_gain: f64,
    pub weights: AttentionWeights,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            calibration_frames: 40,
            min_stable_frames: 10,
            deviation_threshold: 0.30,
            turn_rate_gain: 10.0,
            weights: AttentionWeights::default(),
        }
    }
}

impl AttentionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_length("attention.calibration_frames", self.calibration_frames)?;
        require_length("attention.min_stable_frames", self.min_stable_frames)?;
        require_positive("attention.deviation_threshold", self.deviation_threshold)?;
        require_positive("attention.turn_rate_gain", self.turn_rate_gain)?;
        validate_weights("attention", &self.weights.table())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressWeights {
    pub brow: f64,
    pub lip: f64,
    pub blink: f64,
}

impl Default for StressWeights {
    fn default() -> Self {
        Self {
            brow: 0.40,
            lip: 0.30,
            blink: 0.30,
        }
    }
}

impl StressWeights {
    pub fn table(&self) -> [(&'static str, f64); 3] {
        [("brow", self.brow), ("lip", self.lip), ("blink", self.blink)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    pub calibration_frames: usize,
    pub blink_close_threshold: f64,
    pub blink_reopen_threshold: f64,
    pub brow_gain: f64,
    pub lip_gain: f64,
    /// Score points per blink-per-minute.
    pub blink_gain: f64,
    pub weights: StressWeights,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            calibration_frames: 50,
            blink_close_threshold: 0.22,
            blink_reopen_threshold: 0.25,
            brow_gain: 200.0,
            lip_gain: 250.0,
            blink_gain: 3.0,
            weights: StressWeights::default(),
        }
    }
}

impl StressConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_length("stress.calibration_frames", self.calibration_frames)?;
        require_positive("stress.blink_close_threshold", self.blink_close_threshold)?;
        require_positive("stress.blink_reopen_threshold", self.blink_reopen_threshold)?;
        if self.blink_close_threshold >= self.blink_reopen_threshold {
            return Err(ConfigError::InvertedBlinkThresholds {
                close: self.blink_close_threshold,
                reopen: self.blink_reopen_threshold,
            });
        }
        require_positive("stress.brow_gain", self.brow_gain)?;
        require_positive("stress.lip_gain", self.lip_gain)?;
        require_positive("stress.blink_gain", self.blink_gain)?;
        validate_weights("stress", &self.weights.table())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfusionWeights {
    pub raise: f64,
    pub inward: f64,
    pub asymmetry: f64,
    pub tilt: f64,
    pub squint: f64,
    pub yaw_change: f64,
}

impl Default for ConfusionWeights {
    fn default() -> Self {
        Self {
            raise: 0.25,
            inward: 0.15,
            asymmetry: 0.15,
            tilt: 0.20,
            squint: 0.15,
            yaw_change: 0.10,
        }
    }
}

impl ConfusionWeights {
    pub fn table(&self) -> [(&'static str, f64); 6] {
        [
            ("raise", self.raise),
            ("inward", self.inward),
            ("asymmetry", self.asymmetry),
            ("tilt", self.tilt),
            ("squint", self.squint),
            ("yaw_change", self.yaw_change),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfusionConfig {
    pub calibration_frames: usize,
    /// Frame-to-frame yaw-ratio jump that counts as a side glance.
    pub yaw_change_delta: f64,
    /// Squint band as fractions of baseline EAR, exclusive on both ends.
    pub squint_low: f64,
    pub squint_high: f64,
    /// Sub-score emitted while squinting.
    pub squint_score: f64,
    pub raise_gain: f64,
    pub inward_gain: f64,
    pub asymmetry_gain: f64,
    /// Score points per degree of head tilt.
    pub tilt_gain: f64,
    /// Score points per yaw change per second.
    pub yaw_rate_gain: f64,
    /// Yaw ratio assumed before the first scored frame.
    pub initial_yaw_ratio: f64,
    pub weights: ConfusionWeights,
}

impl Default for ConfusionConfig {
    fn default() -> Self {
        Self {
            calibration_frames: 60,
            yaw_change_delta: 0.08,
            squint_low: 0.75,
            squint_high: 0.95,
            squint_score: 60.0,
            raise_gain: 100.0,
            inward_gain: 100.0,
            asymmetry_gain: 3.0,
            tilt_gain: 2.0,
            yaw_rate_gain: 40.0,
            initial_yaw_ratio: 1.0,
            weights: ConfusionWeights::default(),
        }
    }
}

impl ConfusionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_length("confusion.calibration_frames", self.calibration_frames)?;
        require_positive("confusion.yaw_change_delta", self.yaw_change_delta)?;
        if !(self.squint_low > 0.0 && self.squint_low < self.squint_high && self.squint_high.is_finite()) {
            return Err(ConfigError::InvalidSquintBand {
                low: self.squint_low,
                high: self.squint_high,
            });
        }
        require_positive("confusion.squint_score", self.squint_score)?;
        require_positive("confusion.raise_gain", self.raise_gain)?;
        require_positive("confusion.inward_gain", self.inward_gain)?;
        require_positive("confusion.asymmetry_gain", self.asymmetry_gain)?;
        require_positive("confusion.tilt_gain", self.tilt_gain)?;
        require_positive("confusion.yaw_rate_gain", self.yaw_rate_gain)?;
        require_positive("confusion.initial_yaw_ratio", self.initial_yaw_ratio)?;
        validate_weights("confusion", &self.weights.table())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Retention window for chart samples.
    pub window_seconds: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_seconds: 60.0,
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("analytics.window_seconds", self.window_seconds)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    pub drowsiness: DrowsinessConfig,
    pub attention: AttentionConfig,
    pub stress: StressConfig,
    pub confusion: ConfusionConfig,
    pub analytics: AnalyticsConfig,
}

impl EstimationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.drowsiness.validate()?;
        self.attention.validate()?;
        self.stress.validate()?;
        self.confusion.validate()?;
        self.analytics.validate()
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
