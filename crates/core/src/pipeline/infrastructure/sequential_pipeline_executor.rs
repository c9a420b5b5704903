use std::sync::atomic::Ordering;

use crate::landmarks::domain::landmark_source::LandmarkSource;
use crate::pipeline::pipeline_executor::{
    handle_frame_error, report_progress, ExecutionOutcome, PipelineConfig, PipelineExecutor,
};
use crate::pipeline::signal_bank::SignalBank;
use crate::shared::score::FrameScores;

/// Runs every detector on the calling thread, one after another.
pub struct SequentialPipelineExecutor;

impl PipelineExecutor for SequentialPipelineExecutor {
    fn execute(
        &self,
        mut source: Box<dyn LandmarkSource>,
        mut bank: SignalBank,
        on_frame: &mut dyn FnMut(&FrameScores),
        config: PipelineConfig,
    ) -> Result<ExecutionOutcome, Box<dyn std::error::Error>> {
        let total_frames = source.total_frames();
        let mut frames_processed = 0;
        let mut frames_skipped = 0;

        for frame_result in source.frames() {
            if config.cancelled.load(Ordering::Relaxed) {
                break;
            }
            let frame = match frame_result {
                Ok(frame) => frame,
                Err(e) => {
                    handle_frame_error(e, &config, &mut frames_skipped)?;
                    continue;
                }
            };

            let scores = bank.process(&frame);
            on_frame(&scores);
            frames_processed += 1;
            report_progress(&config, frames_processed, total_frames)?;
        }

        Ok(ExecutionOutcome {
            bank,
            frames_processed,
            frames_skipped,
        })
    }
}
