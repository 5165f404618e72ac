//! Deterministic simulation time
//!
//! Ticks advance by a fixed delta chosen at construction; the clock never
//! reads the wall clock.

use std::time::Duration;

/// Default simulation tick rate.
pub const TICK_RATE_HZ: u32 = 60;

/// Simulation time tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationTime {
    tick_count: u64,
    elapsed: f64,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            elapsed: 0.0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Count one tick of `dt` seconds. Returns the new tick number.
    pub fn advance(&mut self, dt: f32) -> u64 {
        self.tick_count += 1;
        self.elapsed += f64::from(dt);
        self.tick_count
    }

    /// Seconds of simulated time, accumulated in f64 to avoid drift.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    pub fn total_time(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed)
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_counts_ticks_and_time() {
        let mut time = SimulationTime::new();
        for _ in 0..TICK_RATE_HZ {
            time.advance(1.0 / TICK_RATE_HZ as f32);
        }
        assert_eq!(time.tick_count(), TICK_RATE_HZ as u64);
        assert!((time.elapsed_secs() - 1.0).abs() < 1e-5);
        assert!((time.total_time().as_secs_f64() - 1.0).abs() < 1e-5);
    }
}
