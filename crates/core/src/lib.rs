//! Cognitive and affective signal estimation from facial landmark streams.
//!
//! Each incoming [`shared::landmark_frame::LandmarkFrame`] is fanned out to four
//! independent detectors (drowsiness, attention, stress, confusion). Every
//! detector produces a 0-100 score per frame once its calibration phase is
//! complete, and the [`analytics::analytics_aggregator::AnalyticsAggregator`]
//! keeps a sliding time window of those scores for charting.

pub mod analytics;
pub mod estimation;
pub mod features;
pub mod landmarks;
pub mod pipeline;
pub mod shared;
pub mod signals;

#[cfg(test)]
pub(crate) mod test_support;
