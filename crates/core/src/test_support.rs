//! Synthetic face meshes for exercising detectors without a model.
//!
//! Coordinates are given in whole pixels of a 1000x1000 frame and
//! normalized at the pixel center on build, so `FrameSize::to_pixel`
//! truncates them back to the same pixel.

use std::time::Duration;

use crate::landmarks::domain::landmark_source::LandmarkSource;
use crate::shared::config::EstimationConfig;
use crate::shared::constants::*;
use crate::shared::landmark_frame::{FrameSize, Landmark, LandmarkFrame, LandmarkSet};

pub const SIZE: u32 = 1000;
/// Spacing between synthetic frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

pub fn frame_size() -> FrameSize {
    FrameSize::new(SIZE, SIZE).unwrap()
}

/// Neutral frontal face:
/// - EAR 1/3 (eye width 60, lid gap 20 on both eyes)
/// - MAR 0.2 (mouth 100 wide, 20 open)
/// - yaw ratio 1.0 (nose centered between cheeks 200 px away)
/// - brow-to-eye distance 50, brow raise 50, inward ratio 120/240 = 0.5
/// - head tilt 0 degrees
#[derive(Clone)]
pub struct FaceBuilder {
    pixels: Vec<(f64, f64)>,
}

impl FaceBuilder {
    pub fn neutral() -> Self {
        let mut b = Self {
            pixels: vec![(500.0, 500.0); FACE_MESH_LANDMARKS],
        };
        b = b.eye_opening(10.0);
        b.set(LEFT_EYE[0], 400.0, 400.0);
        b.set(LEFT_EYE[3], 460.0, 400.0);
        b.set(RIGHT_EYE[0], 540.0, 400.0);
        b.set(RIGHT_EYE[3], 600.0, 400.0);
        b.set(LEFT_EYE_TOP, 440.0, 390.0);
        b.set(RIGHT_EYE_TOP, 560.0, 390.0);
        b = b.mouth_opening(20.0);
        b.set(MOUTH_LEFT, 450.0, 610.0);
        b.set(MOUTH_RIGHT, 550.0, 610.0);
        b.set(NOSE_TIP, 500.0, 500.0);
        b.set(LEFT_CHEEK, 300.0, 500.0);
        b.set(RIGHT_CHEEK, 700.0, 500.0);
        b.set(LEFT_OUTER_BROW, 380.0, 350.0);
        b.set(RIGHT_OUTER_BROW, 620.0, 350.0);
        b.brow_height(340.0)
    }

    fn set(&mut self, index: usize, x: f64, y: f64) {
        self.pixels[index] = (x, y);
    }

    pub fn with(mut self, index: usize, x: f64, y: f64) -> Self {
        self.set(index, x, y);
        self
    }

    /// Lid gap of `2 * half_gap` on both eyes, so EAR = half_gap / 30.
    pub fn eye_opening(mut self, half_gap: f64) -> Self {
        for (eye, xs) in [(LEFT_EYE, [420.0, 440.0]), (RIGHT_EYE, [560.0, 580.0])] {
            self.set(eye[1], xs[0], 400.0 - half_gap);
            self.set(eye[2], xs[1], 400.0 - half_gap);
            self.set(eye[4], xs[1], 400.0 + half_gap);
            self.set(eye[5], xs[0], 400.0 + half_gap);
        }
        self
    }

    /// Vertical lip gap in pixels; MAR = gap / 100.
    pub fn mouth_opening(mut self, gap: f64) -> Self {
        self.set(MOUTH_TOP, 500.0, 610.0 - gap / 2.0);
        self.set(MOUTH_BOTTOM, 500.0, 610.0 + gap / 2.0);
        self
    }

    /// Horizontal nose offset; yaw ratio = (200 + dx) / (200 - dx).
    pub fn nose_offset(mut self, dx: f64) -> Self {
        self.set(NOSE_TIP, 500.0 + dx, 500.0);
        self
    }

    /// Places both inner brows at `y`; the eye tops sit at y = 390.
    pub fn brow_height(mut self, y: f64) -> Self {
        self.set(LEFT_INNER_BROW, 440.0, y);
        self.set(RIGHT_INNER_BROW, 560.0, y);
        self
    }

    pub fn build(&self) -> LandmarkSet {
        let size = SIZE as f64;
        let points = self
            .pixels
            .iter()
            .map(|&(x, y)| Landmark::new((x + 0.5) / size, (y + 0.5) / size))
            .collect();
        LandmarkSet::new(points).unwrap()
    }
}

pub fn timestamp(index: usize) -> Duration {
    FRAME_INTERVAL * index as u32
}

pub fn face_frame(index: usize, face: &FaceBuilder) -> LandmarkFrame {
    LandmarkFrame::new(index, timestamp(index), frame_size(), Some(face.build()))
}

pub fn empty_frame(index: usize) -> LandmarkFrame {
    LandmarkFrame::new(index, timestamp(index), frame_size(), None)
}

/// In-memory landmark stream. `Err` entries simulate malformed frames.
pub struct VecLandmarkSource {
    frames: Vec<Result<LandmarkFrame, String>>,
}

impl VecLandmarkSource {
    pub fn new(frames: Vec<Result<LandmarkFrame, String>>) -> Self {
        Self { frames }
    }

    /// `calibration` neutral frames, then `extra` frames alternating a
    /// raised-brow face with a no-face frame.
    pub fn scripted(calibration: usize, extra: usize) -> Self {
        let mut frames: Vec<_> = (0..calibration)
            .map(|i| Ok(face_frame(i, &FaceBuilder::neutral())))
            .collect();
        for i in calibration..calibration + extra {
            let frame = if i % 2 == 0 {
                face_frame(i, &FaceBuilder::neutral().brow_height(300.0).eye_opening(3.0))
            } else {
                empty_frame(i)
            };
            frames.push(Ok(frame));
        }
        Self::new(frames)
    }
}

impl LandmarkSource for VecLandmarkSource {
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<LandmarkFrame, Box<dyn std::error::Error>>> + '_> {
        Box::new(
            self.frames
                .drain(..)
                .map(|r| r.map_err(|e| -> Box<dyn std::error::Error> { e.into() })),
        )
    }

    fn total_frames(&self) -> Option<usize> {
        Some(self.frames.len())
    }
}

/// Defaults with short calibration windows.
pub fn quick_config(calibration_frames: usize) -> EstimationConfig {
    let mut config = EstimationConfig::default();
    config.attention.calibration_frames = calibration_frames;
    config.stress.calibration_frames = calibration_frames;
    config.confusion.calibration_frames = calibration_frames;
    config
}
