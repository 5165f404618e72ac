//! Cross-module scenarios: movement, detection, dispatch and compaction
//! working together on one actor manager.

use flock_core::math::DeterministicRng;
use flock_core::{
    ActorDesc, ActorManager, Behavior, BoundaryBehavior, CollisionService, CompactionPolicy,
    LayerMask, MovementService, Scene, Simulation, SimulationSettings,
};
use glam::Vec2;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
struct Ship {
    name: &'static str,
    contacts: Vec<usize>,
}

impl Ship {
    fn named(name: &'static str) -> Self {
        Self {
            name,
            contacts: Vec::new(),
        }
    }
}

impl Behavior for Ship {
    fn on_collision(&mut self, _this: usize, other: usize) {
        self.contacts.push(other);
    }
}

#[test]
fn head_on_approach_collides_then_survivor_is_renumbered() {
    let settings = SimulationSettings {
        scene: Scene::new(-200.0, -200.0, 200.0, 200.0).unwrap(),
        cell_size: 16.0,
        compaction: CompactionPolicy::MANUAL,
        fixed_delta: 1.0,
    };
    let mut sim = Simulation::new(&settings).unwrap();
    let a = sim
        .actors_mut()
        .create_actor(
            Ship::named("a"),
            ActorDesc::at(Vec2::ZERO)
                .with_velocity(Vec2::new(10.0, 0.0))
                .with_radius(5.0),
        )
        .unwrap();
    let b = sim
        .actors_mut()
        .create_actor(
            Ship::named("b"),
            ActorDesc::at(Vec2::new(100.0, 0.0))
                .with_velocity(Vec2::new(-10.0, 0.0))
                .with_radius(5.0),
        )
        .unwrap();

    // Centres close 20 units per tick: 80, 60, 40, 20 apart.
    for _ in 0..4 {
        assert_eq!(sim.tick().collisions, 0);
    }
    assert_eq!(sim.actors().move_state(0).unwrap().position, Vec2::new(40.0, 0.0));
    assert_eq!(sim.actors().move_state(1).unwrap().position, Vec2::new(60.0, 0.0));

    // Fifth tick puts both centres at x = 50.
    let report = sim.tick();
    assert_eq!(report.collisions, 1);
    assert_eq!(sim.actors().get(0).unwrap().payload().contacts, vec![1]);
    assert_eq!(sim.actors().get(1).unwrap().payload().contacts, vec![0]);

    sim.actors_mut().mark_for_destroy(0).unwrap();
    assert_eq!(sim.actors_mut().compact(), 1);

    let actors = sim.actors();
    assert_eq!(actors.total_count(), 1);
    let survivor = actors.get(0).unwrap();
    assert_eq!(survivor.id(), 0);
    assert_eq!(survivor.payload().name, "b");
    assert_eq!(actors.move_state(0).unwrap().position, Vec2::new(50.0, 0.0));
    assert_eq!(actors.resolve(b), Some(0));
    assert_eq!(actors.resolve(a), None);
}

/// Every overlapping pair, by brute force over all `i < j`.
fn brute_force_pairs<P>(actors: &ActorManager<P>) -> BTreeSet<(usize, usize)> {
    let moves = actors.move_states();
    let colliders = actors.colliders();
    let mut pairs = BTreeSet::new();
    for i in 0..moves.len() {
        for j in i + 1..moves.len() {
            if moves[i].is_deleted() || moves[j].is_deleted() {
                continue;
            }
            if !colliders[i].layer().overlaps(colliders[j].layer()) {
                continue;
            }
            let ri = actors.shapes_of(i).unwrap()[0].radius;
            let rj = actors.shapes_of(j).unwrap()[0].radius;
            let sum = ri + rj;
            if (moves[j].position - moves[i].position).length_squared() <= sum * sum {
                pairs.insert((i, j));
            }
        }
    }
    pairs
}

#[test]
fn grid_detection_matches_brute_force() {
    let scene = Scene::new(0.0, 0.0, 400.0, 300.0).unwrap();
    let mut rng = DeterministicRng::new(0x5EED);
    let mut actors: ActorManager<()> = ActorManager::new();
    for _ in 0..600 {
        let layer = if rng.next_f32() < 0.5 {
            LayerMask::ALL
        } else {
            LayerMask::layer((rng.next_u32() % 3) as u8)
        };
        actors
            .create_actor(
                (),
                ActorDesc::at(rng.vec2_in(scene.min(), scene.max()))
                    .with_velocity(rng.direction(30.0))
                    .with_radius(rng.range_f32(1.0, 6.0))
                    .with_layer(layer)
                    .with_all_boundaries(BoundaryBehavior::Bounce),
            )
            .unwrap();
    }
    actors.mark_for_destroy_where(|a| a.id() % 7 == 0);

    let movement = MovementService::new(scene);
    let mut collisions = CollisionService::new(&scene, 12.0).unwrap();
    for _ in 0..10 {
        movement.update(&mut actors, 0.1);
        collisions.detect_collisions(&actors);

        let found: BTreeSet<_> = collisions.events().iter().map(|e| (e.a, e.b)).collect();
        assert_eq!(found.len(), collisions.events().len(), "pair reported twice");
        assert_eq!(found, brute_force_pairs(&actors));
        assert!(collisions
            .events()
            .iter()
            .all(|e| e.penetration >= 0.0 && (e.normal.length() - 1.0).abs() < 1e-4));
        collisions.clear_events();
    }
}

#[test]
fn repeated_compaction_keeps_arrays_parallel_and_handles_valid() {
    let mut rng = DeterministicRng::new(99);
    let mut actors: ActorManager<u32> = ActorManager::new();
    let mut handles = Vec::new();

    for round in 0..20u32 {
        for i in 0..50 {
            let desc = ActorDesc::at(rng.vec2_in(Vec2::splat(-50.0), Vec2::splat(50.0)));
            let handle = if i % 5 == 0 {
                actors.create_actor_without_collider(round * 100 + i, desc)
            } else {
                actors.create_actor(round * 100 + i, desc.with_radius(rng.range_f32(0.5, 2.0)))
            }
            .unwrap();
            handles.push((handle, round * 100 + i));
        }

        let marked = actors.mark_for_destroy_where(|_| rng.next_f32() < 0.3);
        assert_eq!(actors.pending_destroy_count(), marked);
        let before = actors.total_count();
        assert_eq!(actors.compact(), marked);
        assert_eq!(actors.total_count(), before - marked);
        assert!(actors.is_consistent());
        assert_eq!(
            actors.move_state_bytes().len(),
            actors.total_count() * std::mem::size_of::<flock_core::MoveState>()
        );

        handles.retain(|(handle, payload)| match actors.resolve(*handle) {
            Some(slot) => {
                assert_eq!(*actors.get(slot).unwrap().payload(), *payload);
                true
            }
            None => false,
        });
        assert_eq!(handles.len(), actors.total_count());

        // Shapes stayed attached to their owners through every compaction.
        for id in 0..actors.total_count() {
            let shapes = actors.shapes_of(id).unwrap();
            assert!(shapes.len() <= 1);
        }
    }
}

#[test]
fn immediate_destroy_and_soft_delete_mix() {
    let mut actors: ActorManager<char> = ActorManager::new();
    for (i, c) in "abcdef".chars().enumerate() {
        actors
            .create_actor(c, ActorDesc::at(Vec2::new(i as f32, 0.0)))
            .unwrap();
    }

    actors.mark_for_destroy(4).unwrap();
    assert_eq!(actors.destroy_actor(1).unwrap(), 'b');
    // 'e' moved from slot 4 to slot 3 but stays marked.
    assert!(actors.get(3).unwrap().is_deleted());
    assert_eq!(actors.pending_destroy_count(), 1);

    assert_eq!(actors.compact(), 1);
    let names: String = actors.actors().iter().map(|a| *a.payload()).collect();
    assert_eq!(names, "acdf");
    assert!(actors.is_consistent());
}
