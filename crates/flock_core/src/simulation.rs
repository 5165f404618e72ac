//! Fixed-step driver running the per-tick pipeline.
//!
//! One tick is: movement, collision detection, event dispatch, then
//! compaction when the [`CompactionPolicy`] asks for it. Detection never
//! overlaps with dispatch or compaction, so game reactions see a stable
//! event list and the grid never sees a half-compacted store.

use crate::actors::ActorManager;
use crate::collision::{Behavior, CollisionService};
use crate::config::{CompactionPolicy, SettingsError, SimulationSettings};
use crate::movement::MovementService;
use crate::time::SimulationTime;
use flock_metrics::{Counter, SystemProfiler};
use tracing::debug;

/// What a single [`Simulation::step`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub moved: usize,
    pub collisions: usize,
    /// Actors removed, when this tick compacted.
    pub compacted: Option<usize>,
}

pub struct Simulation<P> {
    actors: ActorManager<P>,
    movement: MovementService,
    collision: CollisionService,
    policy: CompactionPolicy,
    time: SimulationTime,
    fixed_delta: f32,
    profiler: SystemProfiler,
    counters: Counter,
}

impl<P> Simulation<P> {
    pub fn new(settings: &SimulationSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            actors: ActorManager::new(),
            movement: MovementService::new(settings.scene),
            collision: CollisionService::new(&settings.scene, settings.cell_size)?,
            policy: settings.compaction,
            time: SimulationTime::new(),
            fixed_delta: settings.fixed_delta,
            profiler: SystemProfiler::new(),
            counters: Counter::new(),
        })
    }

    pub fn actors(&self) -> &ActorManager<P> {
        &self.actors
    }

    pub fn actors_mut(&mut self) -> &mut ActorManager<P> {
        &mut self.actors
    }

    pub fn movement(&self) -> &MovementService {
        &self.movement
    }

    pub fn collision(&self) -> &CollisionService {
        &self.collision
    }

    pub fn time(&self) -> &SimulationTime {
        &self.time
    }

    pub fn fixed_delta(&self) -> f32 {
        self.fixed_delta
    }

    pub fn policy(&self) -> CompactionPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: CompactionPolicy) {
        self.policy = policy;
    }

    /// Accumulated wall time per tick phase.
    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }
}

impl<P: Behavior> Simulation<P> {
    /// Step by the configured fixed delta.
    pub fn tick(&mut self) -> TickReport {
        self.step(self.fixed_delta)
    }

    pub fn step(&mut self, dt: f32) -> TickReport {
        let Self {
            actors,
            movement,
            collision,
            policy,
            time,
            profiler,
            counters,
            ..
        } = self;

        let moved = profiler.time_system("movement", || movement.update(actors, dt));
        let collisions = profiler.time_system("detect", || collision.detect_collisions(actors));
        profiler.time_system("dispatch", || collision.dispatch_events(actors));

        let tick = time.advance(dt);
        let compacted = policy
            .should_compact(tick, actors.pending_destroy_count(), actors.total_count())
            .then(|| profiler.time_system("compact", || actors.compact()));

        counters.increment("ticks", 1);
        counters.increment("collisions", collisions as u64);
        if let Some(removed) = compacted {
            counters.increment("compactions", 1);
            counters.increment("actors_removed", removed as u64);
            debug!(tick, removed, live = actors.live_count(), "policy compaction");
        }

        TickReport {
            tick,
            moved,
            collisions,
            compacted,
        }
    }
}
