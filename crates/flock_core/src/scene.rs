//! Scene bounds consulted by movement and the collision grid.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("scene bounds must be finite, got ({min_x}, {min_y})..({max_x}, {max_y})")]
    NonFinite {
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    },

    #[error("scene max must not be below min, got ({min_x}, {min_y})..({max_x}, {max_y})")]
    Inverted {
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    },
}

/// Axis-aligned scene rectangle. `min_y` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Scene {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Result<Self, SceneError> {
        let scene = Self {
            min_x,
            min_y,
            max_x,
            max_y,
        };
        scene.validate()?;
        Ok(scene)
    }

    /// Scene of the given size centred on the origin.
    pub fn centered(width: f32, height: f32) -> Result<Self, SceneError> {
        Self::new(-width * 0.5, -height * 0.5, width * 0.5, height * 0.5)
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        let Self {
            min_x,
            min_y,
            max_x,
            max_y,
        } = *self;
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(SceneError::NonFinite {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        if max_x < min_x || max_y < min_y {
            return Err(SceneError::Inverted {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.min_x, self.min_y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.max_x, self.max_y)
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            min_x: -1000.0,
            min_y: -1000.0,
            max_x: 1000.0,
            max_y: 1000.0,
        }
    }
}
