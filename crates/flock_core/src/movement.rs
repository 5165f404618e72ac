//! Per-tick kinematic integration with per-side boundary handling.

use crate::actors::ActorManager;
use crate::components::{BoundaryBehavior, BoundarySide, MoveState};
use crate::scene::Scene;
use tracing::trace;

/// Integrates velocity into position once per tick.
///
/// No collision response happens here; the only constraint applied is the
/// scene rectangle, and only on sides whose behaviour is not `Pass`.
#[derive(Debug, Clone)]
pub struct MovementService {
    scene: Scene,
}

impl MovementService {
    pub fn new(scene: Scene) -> Self {
        Self { scene }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = scene;
    }

    /// Advance every live actor by `dt` seconds. Returns the number of
    /// actors integrated.
    pub fn update<P>(&self, actors: &mut ActorManager<P>, dt: f32) -> usize {
        self.integrate(actors.move_states_mut(), dt)
    }

    /// Advance every non-deleted state in `states` by `dt` seconds.
    pub fn integrate(&self, states: &mut [MoveState], dt: f32) -> usize {
        let mut moved = 0;
        for state in states.iter_mut().filter(|s| !s.is_deleted()) {
            state.previous_position = state.position;
            state.refresh_derived();
            state.position += state.velocity * dt;
            apply_boundaries(state, &self.scene);
            moved += 1;
        }
        trace!(moved, dt, "movement tick");
        moved
    }
}

/// Apply each side's behaviour once if the position overshoots that side.
fn apply_boundaries(state: &mut MoveState, scene: &Scene) {
    let flags = state.flags;

    if state.position.x < scene.min_x {
        match flags.boundary(BoundarySide::Left) {
            BoundaryBehavior::Pass => {}
            BoundaryBehavior::Clamp => {
                state.position.x = scene.min_x;
                state.velocity.x = 0.0;
            }
            BoundaryBehavior::Bounce => {
                state.position.x = scene.min_x + (scene.min_x - state.position.x);
                state.velocity.x = -state.velocity.x;
            }
        }
    }

    if state.position.x > scene.max_x {
        match flags.boundary(BoundarySide::Right) {
            BoundaryBehavior::Pass => {}
            BoundaryBehavior::Clamp => {
                state.position.x = scene.max_x;
                state.velocity.x = 0.0;
            }
            BoundaryBehavior::Bounce => {
                state.position.x = scene.max_x - (state.position.x - scene.max_x);
                state.velocity.x = -state.velocity.x;
            }
        }
    }

    if state.position.y < scene.min_y {
        match flags.boundary(BoundarySide::Top) {
            BoundaryBehavior::Pass => {}
            BoundaryBehavior::Clamp => {
                state.position.y = scene.min_y;
                state.velocity.y = 0.0;
            }
            BoundaryBehavior::Bounce => {
                state.position.y = scene.min_y + (scene.min_y - state.position.y);
                state.velocity.y = -state.velocity.y;
            }
        }
    }

    if state.position.y > scene.max_y {
        match flags.boundary(BoundarySide::Bottom) {
            BoundaryBehavior::Pass => {}
            BoundaryBehavior::Clamp => {
                state.position.y = scene.max_y;
                state.velocity.y = 0.0;
            }
            BoundaryBehavior::Bounce => {
                state.position.y = scene.max_y - (state.position.y - scene.max_y);
                state.velocity.y = -state.velocity.y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::ActorDesc;
    use glam::Vec2;

    fn scene() -> Scene {
        Scene::new(0.0, 0.0, 100.0, 50.0).unwrap()
    }

    /// One actor that ends the tick one unit past the right edge.
    fn overshooting(behavior: BoundaryBehavior) -> ActorManager<()> {
        let mut actors = ActorManager::new();
        actors
            .create_actor(
                (),
                ActorDesc::at(Vec2::new(99.0, 10.0))
                    .with_velocity(Vec2::new(2.0, 0.0))
                    .with_boundary(BoundarySide::Right, behavior),
            )
            .unwrap();
        actors
    }

    #[test]
    fn integrates_velocity() {
        let mut actors = ActorManager::new();
        actors
            .create_actor((), ActorDesc::at(Vec2::new(1.0, 1.0)).with_velocity(Vec2::new(4.0, 2.0)))
            .unwrap();
        let movement = MovementService::new(scene());

        assert_eq!(movement.update(&mut actors, 0.5), 1);
        let state = actors.move_state(0).unwrap();
        assert_eq!(state.position, Vec2::new(3.0, 2.0));
        assert_eq!(state.previous_position, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn clamp_pins_to_edge_and_zeroes_axis_velocity() {
        let mut actors = overshooting(BoundaryBehavior::Clamp);
        MovementService::new(scene()).update(&mut actors, 1.0);
        let state = actors.move_state(0).unwrap();
        assert_eq!(state.position.x, 100.0);
        assert_eq!(state.velocity.x, 0.0);
    }

    #[test]
    fn bounce_reflects_overshoot_and_negates_velocity() {
        let mut actors = overshooting(BoundaryBehavior::Bounce);
        MovementService::new(scene()).update(&mut actors, 1.0);
        let state = actors.move_state(0).unwrap();
        assert_eq!(state.position.x, 99.0);
        assert_eq!(state.velocity.x, -2.0);
    }

    #[test]
    fn pass_leaves_position_and_velocity_alone() {
        let mut actors = overshooting(BoundaryBehavior::Pass);
        MovementService::new(scene()).update(&mut actors, 1.0);
        let state = actors.move_state(0).unwrap();
        assert_eq!(state.position.x, 101.0);
        assert_eq!(state.velocity.x, 2.0);
    }

    #[test]
    fn sides_are_independent() {
        let mut actors = ActorManager::new();
        actors
            .create_actor(
                (),
                ActorDesc::at(Vec2::new(1.0, 1.0))
                    .with_velocity(Vec2::new(-3.0, -3.0))
                    .with_boundary(BoundarySide::Left, BoundaryBehavior::Bounce)
                    .with_boundary(BoundarySide::Top, BoundaryBehavior::Clamp),
            )
            .unwrap();
        MovementService::new(scene()).update(&mut actors, 1.0);
        let state = actors.move_state(0).unwrap();
        assert_eq!(state.position, Vec2::new(2.0, 0.0));
        assert_eq!(state.velocity, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn heading_is_retained_when_stopped() {
        let mut actors = ActorManager::new();
        actors
            .create_actor((), ActorDesc::at(Vec2::new(10.0, 10.0)).with_velocity(Vec2::new(-1.0, 0.0)))
            .unwrap();
        let movement = MovementService::new(scene());
        movement.update(&mut actors, 1.0);
        let heading = actors.move_state(0).unwrap().velocity_angle;
        assert!((heading - std::f32::consts::PI).abs() < 1e-6);

        actors.set_velocity(0, Vec2::ZERO).unwrap();
        movement.update(&mut actors, 1.0);
        movement.update(&mut actors, 1.0);
        let state = actors.move_state(0).unwrap();
        assert_eq!(state.speed, 0.0);
        assert_eq!(state.velocity_angle, heading);
        assert_eq!(state.position, Vec2::new(9.0, 10.0));
    }

    #[test]
    fn soft_deleted_actors_are_skipped() {
        let mut actors = ActorManager::new();
        for _ in 0..3 {
            actors
                .create_actor((), ActorDesc::at(Vec2::ZERO).with_velocity(Vec2::ONE))
                .unwrap();
        }
        actors.mark_for_destroy(1).unwrap();
        assert_eq!(MovementService::new(scene()).update(&mut actors, 1.0), 2);
        assert_eq!(actors.move_state(1).unwrap().position, Vec2::ZERO);
        assert_eq!(actors.move_state(2).unwrap().position, Vec2::ONE);
    }
}
