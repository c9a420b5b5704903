use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::landmarks::domain::landmark_source::LandmarkSource;
use crate::pipeline::pipeline_executor::{
    handle_frame_error, report_progress, ExecutionOutcome, PipelineConfig, PipelineExecutor,
};
use crate::pipeline::signal_bank::SignalBank;
use crate::shared::landmark_frame::LandmarkFrame;
use crate::shared::score::{FrameScores, Score, Signal};
use crate::signals::signal_detector::SignalDetector;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// One detector running on its own thread.
struct Worker {
    signal: Signal,
    frame_tx: Sender<Arc<LandmarkFrame>>,
    result_rx: Receiver<(Option<Score>, f64)>,
    handle: JoinHandle<Box<dyn SignalDetector>>,
}

/// Executes the estimation pipeline with a reader thread and one worker
/// thread per detector.
///
/// Layout: `reader → main [fan out → collect] → on_frame`
///
/// The main thread sends each frame to every worker and waits for all of
/// them to answer before dispatching the next frame, so each detector still
/// sees a strictly ordered stream. Reading overlaps with estimation.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        source: Box<dyn LandmarkSource>,
        bank: SignalBank,
        on_frame: &mut dyn FnMut(&FrameScores),
        config: PipelineConfig,
    ) -> Result<ExecutionOutcome, Box<dyn std::error::Error>> {
        let total_frames = source.total_frames();

        let (frame_tx, frame_rx) =
            crossbeam_channel::bounded::<Result<LandmarkFrame, SendError>>(self.channel_capacity);
        let reader_handle = spawn_reader(source, frame_tx, config.cancelled.clone());

        let workers: Vec<Worker> = bank.into_detectors().into_iter().map(spawn_worker).collect();

        let main_result = run_main_loop(frame_rx, &workers, on_frame, total_frames, &config);

        join_threads(reader_handle, workers, main_result)
    }
}

fn spawn_reader(
    mut source: Box<dyn LandmarkSource>,
    frame_tx: Sender<Result<LandmarkFrame, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for frame_result in source.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(mapped).is_err() {
                break;
            }
        }
    })
}

fn spawn_worker(mut detector: Box<dyn SignalDetector>) -> Worker {
    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Arc<LandmarkFrame>>(1);
    let (result_tx, result_rx) = crossbeam_channel::bounded(1);
    let signal = detector.signal();

    let handle = std::thread::spawn(move || {
        for frame in frame_rx {
            let start = Instant::now();
            let score = detector.process(&frame);
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            if result_tx.send((score, elapsed_ms)).is_err() {
                break;
            }
        }
        detector
    });

    Worker {
        signal,
        frame_tx,
        result_rx,
        handle,
    }
}

/// Runs the main thread loop: receive frames, fan each one out to every
/// worker, gather their scores and hand the frame's results to `on_frame`.
/// Returns `(frames_processed, frames_skipped)`.
fn run_main_loop(
    frame_rx: Receiver<Result<LandmarkFrame, SendError>>,
    workers: &[Worker],
    on_frame: &mut dyn FnMut(&FrameScores),
    total_frames: Option<usize>,
    config: &PipelineConfig,
) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let mut frames_processed = 0;
    let mut frames_skipped = 0;

    for frame_result in frame_rx {
        if config.cancelled.load(Ordering::Relaxed) {
            break;
        }
        let frame = match frame_result {
            Ok(frame) => Arc::new(frame),
            Err(e) => {
                handle_frame_error(e, config, &mut frames_skipped)?;
                continue;
            }
        };

        for worker in workers {
            worker
                .frame_tx
                .send(Arc::clone(&frame))
                .map_err(|_| format!("{} worker stopped unexpectedly", worker.signal))?;
        }

        let mut scores = FrameScores::new(frame.index(), frame.timestamp(), frame.has_face());
        for worker in workers {
            let (score, elapsed_ms) = worker
                .result_rx
                .recv()
                .map_err(|_| format!("{} worker stopped unexpectedly", worker.signal))?;
            scores.set(worker.signal, score, elapsed_ms);
        }

        on_frame(&scores);
        frames_processed += 1;
        report_progress(config, frames_processed, total_frames)?;
    }

    Ok((frames_processed, frames_skipped))
}

/// Joins all pipeline threads, reassembles the bank and coalesces the first
/// error encountered.
fn join_threads(
    reader_handle: JoinHandle<()>,
    workers: Vec<Worker>,
    main_result: Result<(usize, usize), Box<dyn std::error::Error>>,
) -> Result<ExecutionOutcome, Box<dyn std::error::Error>> {
    let mut first_error = main_result.as_ref().err().map(|e| e.to_string());

    // Closing every frame channel lets the workers drain and exit.
    let handles: Vec<(Signal, JoinHandle<Box<dyn SignalDetector>>)> = workers
        .into_iter()
        .map(|worker| (worker.signal, worker.handle))
        .collect();

    let mut detectors = Vec::with_capacity(handles.len());
    for (signal, handle) in handles {
        match handle.join() {
            Ok(detector) => detectors.push(detector),
            Err(_) => {
                first_error.get_or_insert_with(|| format!("{signal} worker thread panicked"));
            }
        }
    }

    if reader_handle.join().is_err() {
        first_error.get_or_insert_with(|| "Reader thread panicked".to_string());
    }

    match (main_result, first_error) {
        (Err(e), _) => Err(e),
        (Ok(_), Some(message)) => Err(message.into()),
        (Ok((frames_processed, frames_skipped)), None) => Ok(ExecutionOutcome {
            bank: SignalBank::new(detectors),
            frames_processed,
            frames_skipped,
        }),
    }
}
