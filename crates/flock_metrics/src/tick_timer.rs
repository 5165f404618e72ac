//! Wall-clock cost of simulation ticks against a fixed-rate budget

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

/// Rolling window of tick costs, plus a count of ticks that overran the
/// budget of one fixed step.
pub struct TickTimer {
    started: Option<Instant>,
    samples: RingBuffer<Duration>,
    budget: Duration,
    overruns: u64,
}

impl TickTimer {
    /// Budget used by [`new`](Self::new): one step at 60 Hz.
    pub const DEFAULT_BUDGET: Duration = Duration::from_micros(16_667);

    pub fn new(window: usize) -> Self {
        Self::with_budget(window, Self::DEFAULT_BUDGET)
    }

    pub fn with_budget(window: usize, budget: Duration) -> Self {
        Self {
            started: None,
            samples: RingBuffer::new(window),
            budget,
            overruns: 0,
        }
    }

    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Close the tick opened by [`begin`](Self::begin). Without a matching
    /// `begin` nothing is recorded.
    pub fn end(&mut self) {
        if let Some(started) = self.started.take() {
            self.record(started.elapsed());
        }
    }

    fn record(&mut self, cost: Duration) {
        if cost > self.budget {
            self.overruns += 1;
        }
        self.samples.push(cost);
    }

    /// Sustainable tick rate given the average tick cost.
    pub fn ticks_per_second(&self) -> f64 {
        let avg = self.samples.average().as_secs_f64();
        if avg > 0.0 {
            avg.recip()
        } else {
            0.0
        }
    }

    pub fn tick_time_ms(&self) -> f64 {
        self.samples.average().as_secs_f64() * 1000.0
    }

    pub fn tick_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.samples.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }

    pub fn last_tick_ms(&self) -> f64 {
        self.samples
            .latest()
            .map_or(0.0, |cost| cost.as_secs_f64() * 1000.0)
    }

    /// Ticks since construction that took longer than the budget.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new(120)
    }
}
