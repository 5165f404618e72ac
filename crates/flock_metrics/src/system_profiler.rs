//! Accumulated wall time per named tick phase

use std::time::{Duration, Instant};

#[derive(Default)]
pub struct SystemProfiler {
    timings: Vec<(&'static str, Duration)>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self {
            timings: Vec::new(),
        }
    }

    pub fn time_system<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        match self.timings.iter_mut().find(|(n, _)| *n == name) {
            Some((_, total)) => *total += elapsed,
            None => self.timings.push((name, elapsed)),
        }
        result
    }

    pub fn get_timing(&self, name: &str) -> Duration {
        self.timings
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, d)| *d)
            .unwrap_or(Duration::ZERO)
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.timings.iter().copied()
    }
}
