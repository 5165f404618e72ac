//! Deterministic math utilities
//!
//! Re-exports glam with a seedable random source for reproducible spawning.

pub use glam::*;

/// SplitMix64 generator. Same seed, same sequence, on every platform.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u64,
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self { seed, state: seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        // Top 24 bits fill the mantissa exactly.
        (self.next_u64() >> 40) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    /// Uniform in `[min, max)`.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Point uniformly distributed in the rectangle `min..max`.
    pub fn vec2_in(&mut self, min: Vec2, max: Vec2) -> Vec2 {
        Vec2::new(self.range_f32(min.x, max.x), self.range_f32(min.y, max.y))
    }

    /// Vector of length `len` pointing in a uniformly random direction.
    pub fn direction(&mut self, len: f32) -> Vec2 {
        Vec2::from_angle(self.range_f32(0.0, std::f32::consts::TAU)) * len
    }
}
