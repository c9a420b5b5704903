use crate::shared::landmark_frame::LandmarkFrame;

/// A stream of landmark frames in capture order.
///
/// Either a live camera paired with a provider, or a recording of an
/// earlier run.
pub trait LandmarkSource: Send {
    /// Returns an iterator over frames. Errors are per frame; callers decide
    /// whether to skip or abort.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<LandmarkFrame, Box<dyn std::error::Error>>> + '_>;

    /// Number of frames, if known up front. Used for progress reporting.
    fn total_frames(&self) -> Option<usize> {
        None
    }
}
