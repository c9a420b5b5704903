use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::FACE_MESH_LANDMARKS;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("face mesh needs at least {expected} landmarks, got {actual}")]
    TooFewLandmarks { expected: usize, actual: usize },
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
}

/// Normalized landmark coordinate. `x` and `y` are fractions of the frame
/// width and height; `z` is relative depth and is carried but unused.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Landmark position in frame pixels, used for overlay geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of the captured frame, used for de-normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    width: u32,
    height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Result<Self, LandmarkError> {
        if width == 0 || height == 0 {
            return Err(LandmarkError::EmptyFrame { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Scales a normalized landmark to pixels, truncating toward zero.
    /// Coordinates beyond the `i32` range saturate.
    pub fn to_pixel(&self, landmark: Landmark) -> PixelPoint {
        PixelPoint {
            x: (landmark.x * self.width as f64) as i32,
            y: (landmark.y * self.height as f64) as i32,
        }
    }
}

/// The full face mesh of one subject.
///
/// Construction guarantees the face-mesh cardinality and finite coordinates,
/// so lookups by the fixed indices in `constants` cannot go out of range.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Result<Self, LandmarkError> {
        if points.len() < FACE_MESH_LANDMARKS {
            return Err(LandmarkError::TooFewLandmarks {
                expected: FACE_MESH_LANDMARKS,
                actual: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Landmark at a face-mesh index. Indices below `FACE_MESH_LANDMARKS`
    /// are always present.
    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    pub(crate) fn mesh_point(&self, index: usize) -> Landmark {
        debug_assert!(index < FACE_MESH_LANDMARKS);
        self.points[index]
    }
}

/// Landmark detector output for one captured frame.
///
/// `face` is `None` when the detector found nobody in the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkFrame {
    index: usize,
    timestamp: Duration,
    size: FrameSize,
    face: Option<LandmarkSet>,
}

impl LandmarkFrame {
    pub fn new(index: usize, timestamp: Duration, size: FrameSize, face: Option<LandmarkSet>) -> Self {
        Self {
            index,
            timestamp,
            size,
            face,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Capture time, measured from a monotonic origin shared by the stream.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn face(&self) -> Option<&LandmarkSet> {
        self.face.as_ref()
    }

    pub fn has_face(&self) -> bool {
        self.face.is_some()
    }
}
