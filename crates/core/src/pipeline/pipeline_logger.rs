use std::time::{Duration, Instant};

use crate::shared::score::{FrameScores, Signal};

/// Observer for analysis runs.
///
/// The use case reports every frame's scores and each detector's switch
/// from calibration to scoring; implementations decide what to keep and
/// where it goes.
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is `None` for open-ended streams.
    fn progress(&mut self, current: usize, total: Option<usize>);

    /// Scores and per-detector timings of one processed frame.
    fn frame(&mut self, scores: &FrameScores);

    /// `signal` produced its first score at `frame_index`.
    fn signal_active(&mut self, signal: Signal, frame_index: usize);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. For embedders that render their own progress.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: Option<usize>) {}
    fn frame(&mut self, _scores: &FrameScores) {}
    fn signal_active(&mut self, _signal: Signal, _frame_index: usize) {}
    fn info(&mut self, _message: &str) {}
}

/// Running score statistics for one signal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignalLog {
    pub active_from: Option<usize>,
    pub scored: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    /// Total detector time across all frames, scored or not.
    pub busy_ms: f64,
}

impl SignalLog {
    fn record(&mut self, value: f64) {
        if self.scored == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.scored += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.scored > 0).then(|| self.sum / self.scored as f64)
    }
}

/// CLI logger: throttled progress through `log`, per-signal statistics,
/// and a closing summary comparing stream time with wall-clock time.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    signals: [SignalLog; 4],
    frames_seen: usize,
    frames_with_face: usize,
    stream_span: Option<(Duration, Duration)>,
    started: Instant,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            signals: Default::default(),
            frames_seen: 0,
            frames_with_face: 0,
            stream_span: None,
            started: Instant::now(),
        }
    }

    pub fn signal_log(&self, signal: Signal) -> &SignalLog {
        &self.signals[signal.slot()]
    }

    fn stream_seconds(&self) -> f64 {
        self.stream_span
            .map(|(first, last)| last.saturating_sub(first).as_secs_f64())
            .unwrap_or(0.0)
    }

    /// The summary text, or `None` before any frame was seen.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames_seen == 0 {
            return None;
        }

        let mut lines = vec![format!(
            "Analysis summary ({} frames, {} with a face, {:.1}s of stream):",
            self.frames_seen,
            self.frames_with_face,
            self.stream_seconds()
        )];

        for signal in Signal::ALL {
            let log = self.signal_log(signal);
            let per_frame_ms = log.busy_ms / self.frames_seen as f64;
            let line = match (log.active_from, log.mean()) {
                (Some(from), Some(mean)) => format!(
                    "  {:11} from frame {from}: mean {mean:5.1}  min {:5.1}  max {:5.1}  ({per_frame_ms:.3} ms/frame)",
                    signal.name(),
                    log.min,
                    log.max
                ),
                _ => format!("  {:11} never left calibration", signal.name()),
            };
            lines.push(line);
        }

        let wall = self.started.elapsed().as_secs_f64();
        let stream = self.stream_seconds();
        if wall > 0.0 && stream > 0.0 {
            lines.push(format!("  Speed: {:.1}x real time", stream / wall));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: Option<usize>) {
        match total {
            Some(total) if total > 0 => {
                if current % self.throttle_frames == 0 || current == total {
                    let pct = current as f64 / total as f64 * 100.0;
                    log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
                }
            }
            _ => {
                if current % self.throttle_frames == 0 {
                    log::info!("Processing: {current} frames");
                }
            }
        }
    }

    fn frame(&mut self, scores: &FrameScores) {
        self.frames_seen += 1;
        if scores.face_detected() {
            self.frames_with_face += 1;
        }
        let at = scores.timestamp();
        self.stream_span = Some(match self.stream_span {
            Some((first, _)) => (first, at),
            None => (at, at),
        });

        for signal in Signal::ALL {
            self.signals[signal.slot()].busy_ms += scores.timing_ms(signal);
        }
        for (signal, value) in scores.values() {
            self.signals[signal.slot()].record(value);
        }
    }

    fn signal_active(&mut self, signal: Signal, frame_index: usize) {
        self.signals[signal.slot()].active_from = Some(frame_index);
        log::info!("{signal} scoring from frame {frame_index}");
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
