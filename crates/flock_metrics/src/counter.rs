//! Named counters for simulation events (collisions, compactions, ...)

/// Small ordered set of counters keyed by static names.
///
/// Counter names are a handful of compile-time strings, so a linear
/// scan over a `Vec` beats hashing and never allocates per increment.
#[derive(Default)]
pub struct Counter {
    counters: Vec<(&'static str, u64)>,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            counters: Vec::new(),
        }
    }

    fn slot(&mut self, name: &'static str) -> &mut u64 {
        let idx = match self.counters.iter().position(|(n, _)| *n == name) {
            Some(idx) => idx,
            None => {
                self.counters.push((name, 0));
                self.counters.len() - 1
            }
        };
        &mut self.counters[idx].1
    }

    pub fn increment(&mut self, name: &'static str, value: u64) {
        *self.slot(name) += value;
    }

    pub fn set(&mut self, name: &'static str, value: u64) {
        *self.slot(name) = value;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    /// Counters in first-touched order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counters.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_accumulate_and_set_overrides() {
        let mut counter = Counter::new();
        counter.increment("collisions", 2);
        counter.increment("collisions", 3);
        counter.set("compactions", 1);

        assert_eq!(counter.get("collisions"), 5);
        assert_eq!(counter.get("compactions"), 1);
        assert_eq!(counter.get("missing"), 0);

        let names: Vec<_> = counter.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["collisions", "compactions"]);
    }
}
