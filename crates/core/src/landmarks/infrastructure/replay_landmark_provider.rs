use std::collections::HashMap;
use std::sync::Arc;

use crate::landmarks::domain::landmark_provider::{LandmarkProvider, ProviderError};
use crate::shared::image_frame::ImageFrame;
use crate::shared::landmark_frame::LandmarkSet;

/// Replays pre-computed landmark sets by frame index.
///
/// Stands in for a live model when re-analysing a recorded session or when
/// testing the pipeline. Indices missing from the recording report no face.
/// Like a live tracker, it rejects frame indices that go backwards.
pub struct ReplayLandmarkProvider {
    recording: Arc<HashMap<usize, LandmarkSet>>,
    last_index: Option<usize>,
}

impl ReplayLandmarkProvider {
    pub fn new(recording: Arc<HashMap<usize, LandmarkSet>>) -> Self {
        Self {
            recording,
            last_index: None,
        }
    }
}

impl LandmarkProvider for ReplayLandmarkProvider {
    fn detect(
        &mut self,
        _image: &ImageFrame,
        frame_index: usize,
    ) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>> {
        if let Some(last) = self.last_index {
            if frame_index < last {
                return Err(ProviderError::NonMonotonicIndex {
                    index: frame_index,
                    last,
                }
                .into());
            }
        }
        self.last_index = Some(frame_index);
        Ok(self.recording.get(&frame_index).cloned())
    }
}
