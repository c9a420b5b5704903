use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::analytics::analytics_aggregator::{AnalyticsAggregator, AnalyticsSample};
use crate::landmarks::domain::landmark_source::LandmarkSource;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor, ProgressCallback};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::signal_bank::SignalBank;
use crate::shared::score::{DetectorPhase, FrameScores, Signal};

/// End-of-run state of one signal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SignalSummary {
    #[serde(flatten)]
    pub phase: DetectorPhase,
    pub final_score: Option<f64>,
    /// Mean over every frame that carried a score.
    pub mean_score: Option<f64>,
    pub peak_score: Option<f64>,
    /// First frame index that produced a score.
    pub first_scored_frame: Option<usize>,
    pub counters: BTreeMap<&'static str, f64>,
    /// Samples still inside the analytics window at the end of the run.
    pub series: Vec<AnalyticsSample>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub frames_processed: usize,
    pub frames_with_face: usize,
    pub frames_skipped: usize,
    /// Stream time between the first and last processed frame.
    pub duration_seconds: f64,
    pub window_seconds: f64,
    pub signals: BTreeMap<Signal, SignalSummary>,
}

#[derive(Default)]
struct ScoreStats {
    count: usize,
    sum: f64,
    peak: f64,
    first_frame: Option<usize>,
}

/// Running totals gathered from the executor's per-frame callback.
struct StreamTally {
    origin: Option<Duration>,
    last: Duration,
    frames_with_face: usize,
    stats: [ScoreStats; 4],
}

impl StreamTally {
    fn new() -> Self {
        Self {
            origin: None,
            last: Duration::ZERO,
            frames_with_face: 0,
            stats: Default::default(),
        }
    }

    /// Seconds since the first frame of the stream.
    fn elapsed_seconds(&mut self, timestamp: Duration) -> f64 {
        let origin = *self.origin.get_or_insert(timestamp);
        self.last = timestamp;
        timestamp.saturating_sub(origin).as_secs_f64()
    }

    fn duration_seconds(&self) -> f64 {
        self.origin
            .map(|origin| self.last.saturating_sub(origin).as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Orchestrates one analysis run over a landmark stream.
///
/// Wires the source, the detector bank, the analytics window and the logger
/// together and delegates execution to a `PipelineExecutor`. This is a
/// single-use struct: `execute` consumes the owned components, so calling it
/// twice will fail.
pub struct AnalyzeStreamUseCase {
    source: Option<Box<dyn LandmarkSource>>,
    bank: Option<SignalBank>,
    aggregator: AnalyticsAggregator,
    executor: Box<dyn PipelineExecutor>,
    logger: Box<dyn PipelineLogger>,
    skip_invalid_frames: bool,
    on_progress: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
}

impl AnalyzeStreamUseCase {
    pub fn new(
        source: Box<dyn LandmarkSource>,
        bank: SignalBank,
        aggregator: AnalyticsAggregator,
        executor: Box<dyn PipelineExecutor>,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<ProgressCallback>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source: Some(source),
            bank: Some(bank),
            aggregator,
            executor,
            logger,
            skip_invalid_frames: false,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn skip_invalid_frames(mut self, skip: bool) -> Self {
        self.skip_invalid_frames = skip;
        self
    }

    pub fn execute(&mut self) -> Result<AnalysisReport, Box<dyn std::error::Error>> {
        let source = self.source.take().ok_or("Pipeline already executed")?;
        let bank = self.bank.take().ok_or("Pipeline already executed")?;
        let total_frames = source.total_frames();

        let config = PipelineConfig {
            skip_invalid_frames: self.skip_invalid_frames,
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
        };

        self.logger.info(&format!(
            "Analyzing stream with {} detectors ({:.0}s window)",
            bank.len(),
            self.aggregator.window_seconds()
        ));

        let mut tally = StreamTally::new();
        let aggregator = &mut self.aggregator;
        let logger = &mut self.logger;
        let mut frames_seen = 0;

        let outcome = self.executor.execute(
            source,
            bank,
            &mut |scores: &FrameScores| {
                frames_seen += 1;
                record_frame(scores, &mut tally, aggregator, &mut **logger);
                logger.progress(frames_seen, total_frames);
            },
            config,
        )?;

        if outcome.frames_skipped > 0 {
            self.logger
                .info(&format!("Skipped {} invalid frames", outcome.frames_skipped));
        }
        self.logger.summary();

        let signals = outcome
            .bank
            .detectors()
            .iter()
            .map(|detector| {
                let signal = detector.signal();
                let stats = &tally.stats[signal.slot()];
                let summary = SignalSummary {
                    phase: detector.phase(),
                    final_score: detector.last_score().map(|s| s.value()),
                    mean_score: (stats.count > 0).then(|| stats.sum / stats.count as f64),
                    peak_score: (stats.count > 0).then_some(stats.peak),
                    first_scored_frame: stats.first_frame,
                    counters: detector.counters().into_iter().collect(),
                    series: self.aggregator.series(signal).iter().copied().collect(),
                };
                (signal, summary)
            })
            .collect();

        Ok(AnalysisReport {
            frames_processed: outcome.frames_processed,
            frames_with_face: tally.frames_with_face,
            frames_skipped: outcome.frames_skipped,
            duration_seconds: tally.duration_seconds(),
            window_seconds: self.aggregator.window_seconds(),
            signals,
        })
    }
}

fn record_frame(
    scores: &FrameScores,
    tally: &mut StreamTally,
    aggregator: &mut AnalyticsAggregator,
    logger: &mut dyn PipelineLogger,
) {
    if scores.face_detected() {
        tally.frames_with_face += 1;
    }

    let values = scores.values();
    for &(signal, value) in &values {
        let stats = &mut tally.stats[signal.slot()];
        if stats.first_frame.is_none() {
            stats.first_frame = Some(scores.frame_index());
            logger.signal_active(signal, scores.frame_index());
        }
        stats.count += 1;
        stats.sum += value;
        stats.peak = stats.peak.max(value);
    }
    logger.frame(scores);

    let elapsed = tally.elapsed_seconds(scores.timestamp());
    aggregator.update(elapsed, &values);
}
