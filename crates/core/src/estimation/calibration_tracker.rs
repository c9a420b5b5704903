use crate::shared::score::DetectorPhase;

/// Outcome of feeding one sample to a [`CalibrationTracker`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CalibrationStatus<const N: usize> {
    Calibrating { observed: usize, required: usize },
    Ready([f64; N]),
}

/// Averages `N` metrics over a fixed warm-up window to set a per-subject
/// baseline.
///
/// The baseline is computed exactly once, when the `required`-th sample
/// arrives, and is frozen for the tracker's lifetime. Callers only feed
/// frames in which a face was detected.
#[derive(Clone, Debug)]
pub struct CalibrationTracker<const N: usize> {
    required: usize,
    observed: usize,
    sums: [f64; N],
    baseline: Option<[f64; N]>,
}

impl<const N: usize> CalibrationTracker<N> {
    /// A zero `required` is treated as 1.
    pub fn new(required: usize) -> Self {
        Self {
            required: required.max(1),
            observed: 0,
            sums: [0.0; N],
            baseline: None,
        }
    }

    pub fn observe(&mut self, values: [f64; N]) -> CalibrationStatus<N> {
        if let Some(baseline) = self.baseline {
            return CalibrationStatus::Ready(baseline);
        }

        for (sum, value) in self.sums.iter_mut().zip(values) {
            *sum += value;
        }
        self.observed += 1;

        if self.observed < self.required {
            return CalibrationStatus::Calibrating {
                observed: self.observed,
                required: self.required,
            };
        }

        let count = self.observed as f64;
        let baseline = self.sums.map(|sum| sum / count);
        self.baseline = Some(baseline);
        CalibrationStatus::Ready(baseline)
    }

    pub fn status(&self) -> CalibrationStatus<N> {
        match self.baseline {
            Some(baseline) => CalibrationStatus::Ready(baseline),
            None => CalibrationStatus::Calibrating {
                observed: self.observed,
                required: self.required,
            },
        }
    }

    pub fn baseline(&self) -> Option<[f64; N]> {
        self.baseline
    }

    pub fn is_ready(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn observed(&self) -> usize {
        self.observed
    }

    pub fn required(&self) -> usize {
        self.required
    }

    /// Feeds a sample and returns the baseline only when this frame can be
    /// scored against it. The sample that completes calibration is absorbed
    /// into the baseline and yields `None`, like every warm-up sample.
    pub fn scoring_baseline(&mut self, values: [f64; N]) -> Option<[f64; N]> {
        let was_ready = self.is_ready();
        match self.observe(values) {
            CalibrationStatus::Ready(baseline) if was_ready => Some(baseline),
            CalibrationStatus::Ready(baseline) => {
                log::debug!("Calibration complete after {} samples: {:?}", self.observed, baseline);
                None
            }
            CalibrationStatus::Calibrating { .. } => None,
        }
    }

    pub fn phase(&self) -> DetectorPhase {
        match self.baseline {
            Some(_) => DetectorPhase::Active,
            None => DetectorPhase::Calibrating {
                observed: self.observed,
                required: self.required,
            },
        }
    }
}
