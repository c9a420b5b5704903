use std::time::Duration;

/// Converts a cumulative event count into a rate over elapsed stream time.
///
/// Uses capture timestamps rather than frame counts, so uneven frame spacing
/// (inference latency jitter) does not distort the rate.
#[derive(Clone, Debug, Default)]
pub struct RateMeter {
    started_at: Option<Duration>,
}

impl RateMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of measurement. Only the first call takes effect.
    pub fn start(&mut self, at: Duration) {
        if self.started_at.is_none() {
            self.started_at = Some(at);
        }
    }

    pub fn started_at(&self) -> Option<Duration> {
        self.started_at
    }

    /// Seconds since `start`, or 0.0 before it (or for an earlier `now`).
    pub fn elapsed_seconds(&self, now: Duration) -> f64 {
        self.started_at
            .map(|start| now.saturating_sub(start).as_secs_f64())
            .unwrap_or(0.0)
    }

    /// `count * 60 / elapsed_seconds`, or 0.0 while no time has elapsed.
    pub fn per_minute(&self, count: u64, now: Duration) -> f64 {
        self.rate(count as f64 * 60.0, now)
    }

    pub fn per_second(&self, count: u64, now: Duration) -> f64 {
        self.rate(count as f64, now)
    }

    fn rate(&self, scaled_count: f64, now: Duration) -> f64 {
        let elapsed = self.elapsed_seconds(now);
        if elapsed > 0.0 {
            scaled_count / elapsed
        } else {
            0.0
        }
    }
}
