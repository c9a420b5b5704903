use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::landmarks::domain::landmark_source::LandmarkSource;
use crate::pipeline::signal_bank::SignalBank;
use crate::shared::score::FrameScores;

/// Progress callback: `(frames_processed, total_frames)`. Returning `false`
/// cancels the run.
pub type ProgressCallback = Box<dyn Fn(usize, Option<usize>) -> bool + Send>;

/// Configuration for a pipeline execution run.
pub struct PipelineConfig {
    /// Skip frames the source fails to produce instead of aborting.
    pub skip_invalid_frames: bool,
    pub on_progress: Option<ProgressCallback>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_invalid_frames: false,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// What an executor hands back once the source is exhausted or cancelled.
pub struct ExecutionOutcome {
    /// The detectors, with all state accumulated during the run.
    pub bank: SignalBank,
    pub frames_processed: usize,
    pub frames_skipped: usize,
}

/// Abstracts how the source → detectors → sink pipeline is executed.
///
/// This is a port (application-layer interface). Infrastructure provides
/// concrete implementations (sequential, threaded). Every implementation
/// delivers frames to `on_frame` in source order, and finishes all
/// detectors on one frame before any detector sees the next.
pub trait PipelineExecutor: Send {
    fn execute(
        &self,
        source: Box<dyn LandmarkSource>,
        bank: SignalBank,
        on_frame: &mut dyn FnMut(&FrameScores),
        config: PipelineConfig,
    ) -> Result<ExecutionOutcome, Box<dyn std::error::Error>>;
}

/// Applies the skip policy to a frame the source failed to produce.
pub(crate) fn handle_frame_error(
    err: Box<dyn std::error::Error>,
    config: &PipelineConfig,
    frames_skipped: &mut usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config.skip_invalid_frames {
        return Err(err);
    }
    log::warn!("Skipping invalid frame: {err}");
    *frames_skipped += 1;
    Ok(())
}

pub(crate) fn report_progress(
    config: &PipelineConfig,
    frames_processed: usize,
    total_frames: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ref callback) = config.on_progress {
        if !callback(frames_processed, total_frames) {
            return Err("Cancelled".into());
        }
    }
    Ok(())
}
