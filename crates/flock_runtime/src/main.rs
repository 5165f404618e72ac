//! Flock Runtime
//!
//! Headless driver: loads settings, spawns a deterministic swarm and runs
//! the simulation for a fixed number of ticks.
//!
//! Usage: `flock [config.json]`

use anyhow::{Context, Result};
use flock_core::math::DeterministicRng;
use flock_core::{
    ActorDesc, Behavior, BoundaryBehavior, LayerMask, Simulation, SimulationSettings,
};
use flock_metrics::TickTimer;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Top-level runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RuntimeConfig {
    simulation: SimulationSettings,
    ticks: u64,
    swarm_size: usize,
    seed: u64,
    max_speed: f32,
    radius: f32,
    /// Hits an actor absorbs before it is removed and replaced.
    max_hits: u32,
    /// Log a progress line every this many ticks. 0 disables.
    report_every: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationSettings::default(),
            ticks: 600,
            swarm_size: 5_000,
            seed: 0xF10C,
            max_speed: 120.0,
            radius: 4.0,
            max_hits: 3,
            report_every: 120,
        }
    }
}

impl RuntimeConfig {
    fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path}"))?;
        let config: Self =
            serde_json::from_str(&text).with_context(|| format!("failed to parse {path}"))?;
        config.simulation.validate().context("invalid simulation settings")?;
        Ok(config)
    }
}

#[derive(Debug, Default)]
struct Boid {
    hits: u32,
}

impl Behavior for Boid {
    fn on_collision(&mut self, _this: usize, _other: usize) {
        self.hits += 1;
    }
}

/// Spawn one boid somewhere in the scene heading in a random direction.
/// Half the swarm bounces off the walls, the other half slides along them.
fn spawn(sim: &mut Simulation<Boid>, rng: &mut DeterministicRng, config: &RuntimeConfig) -> Result<()> {
    let scene = *sim.movement().scene();
    let speed = rng.range_f32(0.2, 1.0) * config.max_speed;
    let walls = if rng.next_u32() % 2 == 1 {
        BoundaryBehavior::Bounce
    } else {
        BoundaryBehavior::Clamp
    };
    let desc = ActorDesc::at(rng.vec2_in(scene.min(), scene.max()))
        .with_velocity(rng.direction(speed))
        .with_radius(config.radius)
        .with_layer(LayerMask::layer((rng.next_u32() % 4) as u8) | LayerMask::layer(0))
        .with_all_boundaries(walls);
    sim.actors_mut().create_actor(Boid::default(), desc)?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("flock=info".parse()?))
        .init();

    info!("Flock v{}", flock_core::VERSION);

    let path = std::env::args().nth(1);
    let config = RuntimeConfig::load(path.as_deref())?;
    if 2.0 * config.radius > config.simulation.cell_size {
        warn!(
            radius = config.radius,
            cell_size = config.simulation.cell_size,
            "collider diameter exceeds grid cell size; some contacts will be missed"
        );
    }

    let mut sim: Simulation<Boid> = Simulation::new(&config.simulation)?;
    let mut rng = DeterministicRng::new(config.seed);
    for _ in 0..config.swarm_size {
        spawn(&mut sim, &mut rng, &config)?;
    }
    info!(
        actors = config.swarm_size,
        ticks = config.ticks,
        seed = config.seed,
        "swarm spawned"
    );

    let mut timer = TickTimer::new(120);
    let mut total_collisions = 0;
    for _ in 0..config.ticks {
        timer.begin();
        let report = sim.tick();

        let worn_out = sim
            .actors_mut()
            .mark_for_destroy_where(|actor| actor.payload().hits >= config.max_hits);
        for _ in 0..worn_out {
            spawn(&mut sim, &mut rng, &config)?;
        }
        timer.end();

        total_collisions += report.collisions;
        if config.report_every != 0 && report.tick % config.report_every == 0 {
            info!(
                tick = report.tick,
                live = sim.actors().live_count(),
                pending = sim.actors().pending_destroy_count(),
                collisions = report.collisions,
                tick_ms = timer.tick_time_ms(),
                "progress"
            );
        }
    }

    let (min_ms, max_ms) = timer.tick_time_range_ms();
    info!(
        ticks = sim.time().tick_count(),
        simulated_secs = sim.time().elapsed_secs(),
        total_collisions,
        tps = timer.ticks_per_second(),
        min_ms,
        max_ms,
        overruns = timer.overruns(),
        "run complete"
    );
    for (phase, time) in sim.profiler().iter() {
        info!(phase, ms = time.as_secs_f64() * 1000.0, "phase time");
    }
    for (name, value) in sim.counters().iter() {
        info!(name, value, "counter");
    }

    Ok(())
}
