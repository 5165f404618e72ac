//! Fixed-window sample history

use std::time::Duration;

/// Keeps the most recent `window` samples; older ones are overwritten.
pub struct RingBuffer<T> {
    slots: Vec<T>,
    window: usize,
    head: usize,
}

impl<T: Copy> RingBuffer<T> {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            slots: Vec::with_capacity(window),
            window,
            head: 0,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.slots.len() < self.window {
            self.slots.push(sample);
        } else {
            self.slots[self.head] = sample;
        }
        self.head = (self.head + 1) % self.window;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<T> {
        let last = (self.head + self.window - 1) % self.window;
        self.slots.get(last).copied()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        // Until the window fills, head == len and the first chain is empty.
        let split = if self.slots.len() < self.window { 0 } else { self.head };
        self.slots[split..]
            .iter()
            .chain(&self.slots[..split])
            .copied()
    }
}

impl RingBuffer<Duration> {
    pub fn average(&self) -> Duration {
        match self.len() as u32 {
            0 => Duration::ZERO,
            n => self.iter().sum::<Duration>() / n,
        }
    }

    pub fn min_max(&self) -> (Duration, Duration) {
        self.iter()
            .fold(None, |acc: Option<(Duration, Duration)>, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
            .unwrap_or_default()
    }
}
