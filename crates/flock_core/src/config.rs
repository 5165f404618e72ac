//! Simulation settings

use crate::collision::CollisionError;
use crate::scene::{Scene, SceneError};
use crate::time::TICK_RATE_HZ;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("grid cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f32),

    #[error("fixed delta must be a positive finite number of seconds, got {0}")]
    InvalidDelta(f32),

    #[error("compaction pending ratio must be within 0..=1, got {0}")]
    InvalidRatio(f32),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Collision(#[from] CollisionError),
}

/// When the simulation driver runs [`ActorManager::compact`](crate::actors::ActorManager::compact).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionPolicy {
    /// Compact every `interval_ticks` ticks. 0 disables the periodic trigger.
    pub interval_ticks: u64,
    /// Compact as soon as this fraction of actors is pending destruction.
    pub pending_ratio: f32,
}

impl CompactionPolicy {
    /// Never compact automatically.
    pub const MANUAL: Self = Self {
        interval_ticks: 0,
        pending_ratio: 1.0,
    };

    pub fn should_compact(&self, tick: u64, pending: usize, total: usize) -> bool {
        if pending == 0 {
            return false;
        }
        if self.interval_ticks != 0 && tick % self.interval_ticks == 0 {
            return true;
        }
        total != 0 && pending as f32 / total as f32 > self.pending_ratio
    }
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            interval_ticks: 120,
            pending_ratio: 0.2,
        }
    }
}

/// Everything needed to build a [`Simulation`](crate::simulation::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub scene: Scene,
    pub cell_size: f32,
    pub compaction: CompactionPolicy,
    /// Seconds advanced by [`Simulation::tick`](crate::simulation::Simulation::tick).
    pub fixed_delta: f32,
}

impl SimulationSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.scene.validate()?;
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(SettingsError::InvalidCellSize(self.cell_size));
        }
        if !self.fixed_delta.is_finite() || self.fixed_delta <= 0.0 {
            return Err(SettingsError::InvalidDelta(self.fixed_delta));
        }
        let ratio = self.compaction.pending_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(SettingsError::InvalidRatio(ratio));
        }
        Ok(())
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            scene: Scene::default(),
            cell_size: 32.0,
            compaction: CompactionPolicy::default(),
            fixed_delta: 1.0 / TICK_RATE_HZ as f32,
        }
    }
}
