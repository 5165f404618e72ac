//! Flock Metrics - instrumentation for the simulation tick
//!
//! Tick phase timings, rolling tick-duration averages and named event
//! counters. Everything here compiles down to no-op stubs unless the
//! `metrics` feature is enabled.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use flock_metrics::{SystemProfiler, TickTimer};
//!
//! let mut timer = TickTimer::new(120); // Track last 120 ticks
//! let mut profiler = SystemProfiler::new();
//! timer.begin();
//! profiler.time_system("movement", || { /* integrate */ });
//! timer.end();
//! println!("{:.3} ms/tick", timer.tick_time_ms());
//! ```

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod system_profiler;
#[cfg(feature = "metrics")]
mod tick_timer;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use system_profiler::SystemProfiler;
#[cfg(feature = "metrics")]
pub use tick_timer::TickTimer;

/// Whether this build collects metrics.
pub const ENABLED: bool = cfg!(feature = "metrics");

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct TickTimer;

#[cfg(not(feature = "metrics"))]
impl TickTimer {
    pub const DEFAULT_BUDGET: std::time::Duration = std::time::Duration::from_micros(16_667);
    pub fn new(_window: usize) -> Self { Self }
    pub fn with_budget(_window: usize, _budget: std::time::Duration) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn ticks_per_second(&self) -> f64 { 0.0 }
    pub fn tick_time_ms(&self) -> f64 { 0.0 }
    pub fn tick_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
    pub fn last_tick_ms(&self) -> f64 { 0.0 }
    pub fn overruns(&self) -> u64 { 0 }
}

#[cfg(not(feature = "metrics"))]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
    pub fn clear(&mut self) {}
    pub fn latest(&self) -> Option<T> { None }
}

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: u64) {}
    pub fn set(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
    pub fn reset_all(&mut self) {}
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> { std::iter::empty() }
}

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct SystemProfiler;

#[cfg(not(feature = "metrics"))]
impl SystemProfiler {
    pub fn new() -> Self { Self }
    pub fn time_system<F, R>(&mut self, _name: &'static str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn get_timing(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn reset(&mut self) {}
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, std::time::Duration)> { std::iter::empty() }
}
