use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::landmarks::domain::landmark_source::LandmarkSource;
use crate::shared::landmark_frame::{FrameSize, Landmark, LandmarkError, LandmarkFrame, LandmarkSet};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("line {line}: read failed: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: {source}")]
    Landmark {
        line: usize,
        #[source]
        source: LandmarkError,
    },
    #[error("line {line}: landmark {index} has {len} coordinates, expected 2 or 3")]
    Point { line: usize, index: usize, len: usize },
    #[error("line {line}: timestamp {value} ms is not a valid duration")]
    Timestamp { line: usize, value: f64 },
}

/// One line of a recording.
#[derive(Deserialize)]
struct RecordedFrame {
    index: usize,
    timestamp_ms: f64,
    width: u32,
    height: u32,
    landmarks: Option<Vec<Vec<f64>>>,
}

/// Reads a landmark recording in JSON Lines format, one frame per line:
///
/// ```text
/// {"index":0,"timestamp_ms":0.0,"width":640,"height":480,"landmarks":[[0.41,0.52,-0.01], ...]}
/// {"index":1,"timestamp_ms":33.3,"width":640,"height":480,"landmarks":null}
/// ```
///
/// Blank lines are skipped. A malformed line yields a [`SourceError`] naming
/// its 1-based line number; reading continues with the next line.
pub struct JsonlLandmarkSource {
    reader: Box<dyn BufRead + Send>,
}

impl JsonlLandmarkSource {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path).map_err(|e| format!("Cannot open {}: {e}", path.display()))?;
        Ok(Self::from_reader(Box::new(BufReader::new(file))))
    }

    pub fn from_reader(reader: Box<dyn BufRead + Send>) -> Self {
        Self { reader }
    }
}

fn parse_point(line: usize, index: usize, coords: &[f64]) -> Result<Landmark, SourceError> {
    match *coords {
        [x, y] => Ok(Landmark::new(x, y)),
        [x, y, z] => Ok(Landmark { x, y, z }),
        _ => Err(SourceError::Point {
            line,
            index,
            len: coords.len(),
        }),
    }
}

fn parse_line(line: usize, text: &str) -> Result<LandmarkFrame, SourceError> {
    let record: RecordedFrame =
        serde_json::from_str(text).map_err(|source| SourceError::Json { line, source })?;

    let timestamp = Duration::try_from_secs_f64(record.timestamp_ms / 1000.0).map_err(|_| {
        SourceError::Timestamp {
            line,
            value: record.timestamp_ms,
        }
    })?;
    let size = FrameSize::new(record.width, record.height)
        .map_err(|source| SourceError::Landmark { line, source })?;

    let face = match record.landmarks {
        Some(points) => {
            let points = points
                .iter()
                .enumerate()
                .map(|(i, coords)| parse_point(line, i, coords))
                .collect::<Result<Vec<_>, _>>()?;
            Some(LandmarkSet::new(points).map_err(|source| SourceError::Landmark { line, source })?)
        }
        None => None,
    };

    Ok(LandmarkFrame::new(record.index, timestamp, size, face))
}

impl LandmarkSource for JsonlLandmarkSource {
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<LandmarkFrame, Box<dyn std::error::Error>>> + '_> {
        Box::new(
            (&mut self.reader)
                .lines()
                .enumerate()
                .filter_map(|(i, text)| {
                    let line = i + 1;
                    match text {
                        Ok(text) if text.trim().is_empty() => None,
                        Ok(text) => Some(parse_line(line, &text)),
                        Err(source) => Some(Err(SourceError::Io { line, source })),
                    }
                })
                .map(|result| result.map_err(|e| -> Box<dyn std::error::Error> { Box::new(e) })),
        )
    }
}
