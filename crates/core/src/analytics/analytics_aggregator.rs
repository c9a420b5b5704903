//! Sliding time-window history of signal scores for charting.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::shared::config::AnalyticsConfig;
use crate::shared::score::Signal;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnalyticsSample {
    pub elapsed_seconds: f64,
    pub value: f64,
}

/// Retains, per signal, the samples no more than `window_seconds` older
/// than that signal's newest sample.
///
/// Each series is a deque ordered by time, so eviction pops from the front
/// in amortized constant time.
#[derive(Clone, Debug)]
pub struct AnalyticsAggregator {
    window_seconds: f64,
    series: [VecDeque<AnalyticsSample>; 4],
}

impl AnalyticsAggregator {
    pub fn new(window_seconds: f64) -> Self {
        Self {
            window_seconds,
            series: Default::default(),
        }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.window_seconds)
    }

    pub fn window_seconds(&self) -> f64 {
        self.window_seconds
    }

    /// Appends one sample per listed signal at `elapsed_seconds`, then evicts
    /// samples that fell out of the window. Signals not listed are untouched.
    pub fn update(&mut self, elapsed_seconds: f64, values: &[(Signal, f64)]) {
        for &(signal, value) in values {
            let series = &mut self.series[signal.slot()];
            series.push_back(AnalyticsSample {
                elapsed_seconds,
                value,
            });
            while let Some(front) = series.front() {
                if elapsed_seconds - front.elapsed_seconds > self.window_seconds {
                    series.pop_front();
                } else {
                    break;
                }
            }
        }
    }

    pub fn series(&self, signal: Signal) -> &VecDeque<AnalyticsSample> {
        &self.series[signal.slot()]
    }

    pub fn latest(&self, signal: Signal) -> Option<AnalyticsSample> {
        self.series(signal).back().copied()
    }

    pub fn len(&self) -> usize {
        self.series.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(VecDeque::is_empty)
    }

    /// Copy of every retained series, keyed by signal.
    pub fn snapshot(&self) -> BTreeMap<Signal, Vec<AnalyticsSample>> {
        Signal::ALL
            .iter()
            .map(|&signal| (signal, self.series(signal).iter().copied().collect()))
            .collect()
    }
}
