//! Grid-accelerated collision detection with deferred event dispatch.
//!
//! Detection and dispatch are separate passes. [`CollisionService::detect_collisions`]
//! only does math and appends [`CollisionEvent`]s to a buffer it owns;
//! [`CollisionService::dispatch_events`] (or [`dispatch_with`](CollisionService::dispatch_with))
//! later drains that buffer and runs game-side reactions, which are free to
//! be slow or to mutate the actor manager because the grid is no longer in
//! use by then.

mod grid;
mod narrow;

pub use grid::{CollisionGrid, GridStats};

use crate::actors::ActorManager;
use crate::scene::{Scene, SceneError};
use glam::Vec2;
use grid::FORWARD_NEIGHBORS;
use narrow::NarrowInput;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollisionError {
    #[error("grid cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f32),

    #[error("grid of {columns}x{rows} cells is too large")]
    TooManyCells { columns: usize, rows: usize },

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// A pair of overlapping actors found during detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// Lower slot index of the pair.
    pub a: usize,
    /// Higher slot index of the pair.
    pub b: usize,
    /// Smallest `radius_sum - distance` among the overlapping shape pairs.
    pub penetration: f32,
    /// Unit direction from `a`'s contact shape towards `b`'s.
    pub normal: Vec2,
}

/// Game-side reaction to a collision, invoked only from dispatch.
pub trait Behavior {
    /// `this` collided with `other`; both are slot indices at detection time.
    fn on_collision(&mut self, this: usize, other: usize);
}

impl Behavior for () {
    fn on_collision(&mut self, _this: usize, _other: usize) {}
}

/// Owns the broad-phase grid and the pending event buffer.
#[derive(Debug, Clone)]
pub struct CollisionService {
    grid: CollisionGrid,
    events: Vec<CollisionEvent>,
    pair_tests: usize,
}

impl CollisionService {
    pub fn new(scene: &Scene, cell_size: f32) -> Result<Self, CollisionError> {
        Ok(Self {
            grid: CollisionGrid::new(scene, cell_size)?,
            events: Vec::new(),
            pair_tests: 0,
        })
    }

    pub fn grid(&self) -> &CollisionGrid {
        &self.grid
    }

    /// Events detected and not yet dispatched.
    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Narrow-phase pair tests performed by the last detection pass.
    pub fn pair_tests(&self) -> usize {
        self.pair_tests
    }

    /// Rebuild the grid from `actors` and append every overlapping pair to
    /// the event buffer. Returns the number of pairs found by this pass.
    pub fn detect_collisions<P>(&mut self, actors: &ActorManager<P>) -> usize {
        let Self {
            grid,
            events,
            pair_tests,
        } = self;

        grid.rebuild(actors.move_states(), actors.colliders());

        let input = NarrowInput {
            moves: actors.move_states(),
            colliders: actors.colliders(),
            shapes: actors.shapes(),
        };
        let before = events.len();
        let mut tests = 0;
        let mut record = |a: u32, b: u32| {
            tests += 1;
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            if let Some(event) = input.test(lo as usize, hi as usize) {
                events.push(event);
            }
        };

        for (cx, cy) in grid.occupied_cells() {
            let bucket = grid.bucket(cx, cy);
            for (i, &a) in bucket.iter().enumerate() {
                for &b in &bucket[i + 1..] {
                    record(a, b);
                }
            }

            for (dx, dy) in FORWARD_NEIGHBORS {
                let Some((nx, ny)) = grid.neighbor(cx, cy, dx, dy) else {
                    continue;
                };
                let other = grid.bucket(nx, ny);
                for &a in bucket {
                    for &b in other {
                        record(a, b);
                    }
                }
            }
        }

        *pair_tests = tests;
        let found = events.len() - before;
        trace!(
            found,
            tests,
            bucketed = grid.stats().bucketed,
            dropped = grid.stats().dropped,
            "collision detection"
        );
        found
    }

    /// Notify both actors of every buffered event (A of B, then B of A)
    /// and clear the buffer. Returns the number of events dispatched.
    ///
    /// Slots that no longer exist (destroyed since detection) are skipped.
    pub fn dispatch_events<P: Behavior>(&mut self, actors: &mut ActorManager<P>) -> usize {
        self.dispatch_with(|this, other| {
            if let Ok(payload) = actors.payload_mut(this) {
                payload.on_collision(this, other);
            }
        })
    }

    /// Drain the buffer, calling `notify(this, other)` twice per event
    /// (A of B, then B of A). The closure may hold mutable access to any
    /// game state, including the actor manager.
    pub fn dispatch_with<F>(&mut self, mut notify: F) -> usize
    where
        F: FnMut(usize, usize),
    {
        let events = std::mem::take(&mut self.events);
        for event in &events {
            notify(event.a, event.b);
            notify(event.b, event.a);
        }
        let dispatched = events.len();
        // Hand the allocation back for the next tick.
        self.events = events;
        self.events.clear();
        dispatched
    }
}
