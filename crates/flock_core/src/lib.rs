//! Flock Core
//!
//! Data-oriented simulation core for large swarms of 2D actors:
//! - Component stores with survivor-block compaction over pooled buffers
//! - Actor lifecycle over parallel move/collider arrays
//! - Kinematic movement with per-side scene boundaries
//! - Grid broad phase with deferred collision dispatch
//! - Deterministic time and math

pub mod actors;
pub mod collision;
pub mod components;
pub mod config;
pub mod math;
pub mod movement;
pub mod pool;
pub mod scene;
pub mod simulation;
pub mod store;
pub mod time;

pub use glam;

pub use actors::{ActorDesc, ActorError, ActorManager, DEFAULT_RADIUS};
pub use collision::{Behavior, CollisionError, CollisionEvent, CollisionService};
pub use components::{
    Actor, ActorHandle, BoundaryBehavior, BoundarySide, ColliderShape, ColliderState, LayerMask,
    MoveFlags, MoveState,
};
pub use config::{CompactionPolicy, SettingsError, SimulationSettings};
pub use movement::MovementService;
pub use scene::{Scene, SceneError};
pub use simulation::{Simulation, TickReport};
pub use store::{ComponentStore, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
