use crate::landmarks::domain::landmark_provider::LandmarkProvider;
use crate::landmarks::domain::landmark_source::LandmarkSource;
use crate::shared::image_frame::ImageFrame;
use crate::shared::landmark_frame::{FrameSize, LandmarkFrame};

pub type ImageStream = Box<dyn Iterator<Item = Result<ImageFrame, Box<dyn std::error::Error>>> + Send>;

/// Runs a [`LandmarkProvider`] over a stream of camera images.
///
/// Owns the provider exclusively and hands it a strictly increasing frame
/// index of its own, independent of any numbering in the image stream.
pub struct DetectingLandmarkSource {
    images: ImageStream,
    provider: Box<dyn LandmarkProvider>,
    next_index: usize,
    total_frames: Option<usize>,
}

impl DetectingLandmarkSource {
    pub fn new(images: ImageStream, provider: Box<dyn LandmarkProvider>) -> Self {
        Self {
            images,
            provider,
            next_index: 0,
            total_frames: None,
        }
    }

    pub fn with_total_frames(mut self, total: usize) -> Self {
        self.total_frames = Some(total);
        self
    }
}

impl LandmarkSource for DetectingLandmarkSource {
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<LandmarkFrame, Box<dyn std::error::Error>>> + '_> {
        let Self {
            images,
            provider,
            next_index,
            ..
        } = self;

        Box::new(images.map(move |image| {
            let image = image?;
            let index = *next_index;
            *next_index += 1;

            let size = FrameSize::new(image.width(), image.height())?;
            let face = provider.detect(&image, index)?;
            Ok(LandmarkFrame::new(index, image.timestamp(), size, face))
        }))
    }

    fn total_frames(&self) -> Option<usize> {
        self.total_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::infrastructure::replay_landmark_provider::ReplayLandmarkProvider;
    use crate::shared::landmark_frame::LandmarkSet;
    use crate::test_support::FaceBuilder;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn images(count: u64) -> ImageStream {
        Box::new((0..count).map(|i| -> Result<ImageFrame, Box<dyn std::error::Error>> {
            Ok(ImageFrame::new(
                vec![0u8; 8 * 6 * 3],
                8,
                6,
                3,
                Duration::from_millis(33 * i),
            ))
        }))
    }

    /// Records every index it is asked about.
    struct IndexRecorder(Arc<std::sync::Mutex<Vec<usize>>>);

    impl LandmarkProvider for IndexRecorder {
        fn detect(
            &mut self,
            _image: &ImageFrame,
            frame_index: usize,
        ) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>> {
            self.0.lock().unwrap().push(frame_index);
            Ok(None)
        }
    }

    #[test]
    fn test_assigns_monotonic_indices() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut source = DetectingLandmarkSource::new(images(4), Box::new(IndexRecorder(seen.clone())));

        let frames: Vec<_> = source.frames().collect::<Result<_, _>>().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(frames.iter().map(LandmarkFrame::index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(frames[2].timestamp(), Duration::from_millis(66));
        assert_eq!(frames[0].size().width(), 8);
        assert!(frames.iter().all(|f| !f.has_face()));
    }

    #[test]
    fn test_attaches_detected_face() {
        let recording = HashMap::from([(1, FaceBuilder::neutral().build())]);
        let provider = ReplayLandmarkProvider::new(Arc::new(recording));
        let mut source = DetectingLandmarkSource::new(images(3), Box::new(provider));

        let faces: Vec<bool> = source.frames().map(|f| f.unwrap().has_face()).collect();

        assert_eq!(faces, vec![false, true, false]);
    }

    #[test]
    fn test_image_errors_propagate_per_frame() {
        let stream: ImageStream = Box::new((0..2).map(|i| -> Result<ImageFrame, Box<dyn std::error::Error>> {
            if i == 0 {
                Ok(ImageFrame::new(vec![0u8; 3], 1, 1, 3, Duration::ZERO))
            } else {
                Err("camera unplugged".into())
            }
        }));
        let recorder = IndexRecorder(Arc::new(std::sync::Mutex::new(Vec::new())));
        let mut source = DetectingLandmarkSource::new(stream, Box::new(recorder));

        let results: Vec<_> = source.frames().collect();

        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().to_string(), "camera unplugged");
    }

    #[test]
    fn test_total_frames_hint() {
        let recorder = IndexRecorder(Arc::new(std::sync::Mutex::new(Vec::new())));
        let source = DetectingLandmarkSource::new(images(1), Box::new(recorder)).with_total_frames(1);
        assert_eq!(source.total_frames(), Some(1));
    }
}
