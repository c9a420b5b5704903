use thiserror::Error;

use crate::shared::image_frame::ImageFrame;
use crate::shared::landmark_frame::LandmarkSet;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("frame index {index} is lower than previous index {last}")]
    NonMonotonicIndex { index: usize, last: usize },
}

/// Domain interface for face-mesh landmark detection.
///
/// Implementations are usually stateful (video-mode trackers that reuse the
/// previous frame's result), hence `&mut self`. Frame indices passed to one
/// instance must be non-decreasing. `Ok(None)` means no face was found.
pub trait LandmarkProvider: Send {
    fn detect(
        &mut self,
        image: &ImageFrame,
        frame_index: usize,
    ) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>>;
}
