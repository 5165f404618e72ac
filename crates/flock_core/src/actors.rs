//! Actor lifecycle over the parallel component arrays.
//!
//! `ActorManager` is the only code that changes the *shape* of the actor,
//! move-state and collider-state arrays, so the three always have the same
//! length and index `i` in each refers to the same entity. Removal comes in
//! two flavours:
//!
//! - **soft delete** ([`mark_for_destroy`](ActorManager::mark_for_destroy))
//!   flips the delete bit in all three records; the slot stays put until
//!   the next [`compact`](ActorManager::compact);
//! - **immediate** ([`destroy_actor`](ActorManager::destroy_actor)) removes
//!   the slot right away and renumbers everything after it.
//!
//! Compaction walks every slot once anything is marked, so callers should
//! batch it and run it periodically (see [`CompactionPolicy`](crate::config::CompactionPolicy))
//! rather than every tick.

use crate::components::{
    Actor, ActorHandle, BoundaryBehavior, BoundarySide, ColliderFlags, ColliderShape,
    ColliderState, LayerMask, MoveFlags, MoveState,
};
use crate::store::{ComponentStore, StoreError};
use glam::Vec2;
use thiserror::Error;
use tracing::debug;

/// Radius given to the single circle created by [`ActorManager::create_actor`]
/// when the descriptor does not specify one.
pub const DEFAULT_RADIUS: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActorError {
    #[error("actor id {id} out of range (total actors: {len})")]
    OutOfRange { id: usize, len: usize },

    #[error("a composite collider needs at least one shape")]
    EmptyShapes,

    #[error("collider radius must be finite and non-negative, got {0}")]
    InvalidRadius(f32),

    #[error("shape array would exceed {limit} entries")]
    ShapeCapacity { limit: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Initial values for a new actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorDesc {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub layer: LayerMask,
    pub boundaries: MoveFlags,
}

impl ActorDesc {
    /// Stationary actor at `position` on every layer with all sides `Pass`.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius: DEFAULT_RADIUS,
            layer: LayerMask::ALL,
            boundaries: MoveFlags::default(),
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub fn with_layer(mut self, layer: LayerMask) -> Self {
        self.layer = layer;
        self
    }

    #[must_use]
    pub fn with_boundary(mut self, side: BoundarySide, behavior: BoundaryBehavior) -> Self {
        self.boundaries.set_boundary(side, behavior);
        self
    }

    #[must_use]
    pub fn with_all_boundaries(mut self, behavior: BoundaryBehavior) -> Self {
        for side in BoundarySide::ALL {
            self.boundaries.set_boundary(side, behavior);
        }
        self
    }
}

/// `compact_all` predicate removing row `i` when actor `i` is marked.
/// Relies on the store visiting each element once, in order.
fn marked_rows<P, T>(actors: &[Actor<P>]) -> impl FnMut(&T) -> bool + '_ {
    let mut slot = 0;
    move |_: &T| {
        let marked = actors[slot].deleted;
        slot += 1;
        marked
    }
}

/// A run of shapes owned by a soft-deleted collider, with the running
/// total of removed shapes up to and including it.
#[derive(Debug, Clone, Copy)]
struct DeadSpan {
    start: u32,
    end: u32,
    removed_through: u32,
}

/// Owner of the parallel actor arrays and the shared shape array.
pub struct ActorManager<P> {
    actors: ComponentStore<Actor<P>>,
    moves: ComponentStore<MoveState>,
    colliders: ComponentStore<ColliderState>,
    shapes: ComponentStore<ColliderShape>,
    pending_destroy: usize,
    next_serial: u64,
    dead_spans: Vec<DeadSpan>,
}

impl<P> ActorManager<P> {
    pub fn new() -> Self {
        Self {
            actors: ComponentStore::new(),
            moves: ComponentStore::new(),
            colliders: ComponentStore::new(),
            shapes: ComponentStore::new(),
            pending_destroy: 0,
            next_serial: 0,
            dead_spans: Vec::new(),
        }
    }

    pub fn with_capacity(actors: usize) -> Self {
        let mut manager = Self::new();
        manager.actors.ensure_capacity(actors);
        manager.moves.ensure_capacity(actors);
        manager.colliders.ensure_capacity(actors);
        manager.shapes.ensure_capacity(actors);
        manager
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create an actor with one circular collider of `desc.radius`.
    pub fn create_actor(&mut self, payload: P, desc: ActorDesc) -> Result<ActorHandle, ActorError> {
        let shape = ColliderShape::circle(desc.radius);
        self.spawn(payload, desc, std::slice::from_ref(&shape))
    }

    /// Create an actor with no collider shapes. It moves like any other
    /// actor but never takes part in collision detection.
    pub fn create_actor_without_collider(
        &mut self,
        payload: P,
        desc: ActorDesc,
    ) -> Result<ActorHandle, ActorError> {
        self.spawn(payload, desc, &[])
    }

    /// Create an actor whose collider is the union of `shapes`.
    pub fn create_actor_with_shapes(
        &mut self,
        payload: P,
        desc: ActorDesc,
        shapes: &[ColliderShape],
    ) -> Result<ActorHandle, ActorError> {
        if shapes.is_empty() {
            return Err(ActorError::EmptyShapes);
        }
        self.spawn(payload, desc, shapes)
    }

    fn spawn(
        &mut self,
        payload: P,
        desc: ActorDesc,
        shapes: &[ColliderShape],
    ) -> Result<ActorHandle, ActorError> {
        if let Some(bad) = shapes
            .iter()
            .map(|s| s.radius)
            .find(|r| !r.is_finite() || *r < 0.0)
        {
            return Err(ActorError::InvalidRadius(bad));
        }
        let limit = u32::MAX as usize;
        if self.shapes.len() + shapes.len() > limit {
            return Err(ActorError::ShapeCapacity { limit });
        }

        let id = self.actors.len();
        let serial = self.next_serial;
        self.next_serial += 1;

        let range = self.shapes.extend_from_slice(shapes);

        let mut state = MoveState::new(desc.position, desc.velocity);
        state.flags = desc.boundaries;
        self.moves.push(state);

        self.colliders.push(ColliderState {
            shape_start: range.start as u32,
            shape_count: range.len() as u32,
            flags: ColliderFlags::new(desc.layer),
        });

        self.actors.push(Actor {
            id,
            move_index: id,
            serial,
            deleted: false,
            payload,
        });

        Ok(ActorHandle::new(id, serial))
    }

    // ------------------------------------------------------------------
    // Soft delete + compaction
    // ------------------------------------------------------------------

    #[inline]
    fn check(&self, id: usize) -> Result<(), ActorError> {
        if id < self.actors.len() {
            Ok(())
        } else {
            Err(ActorError::OutOfRange {
                id,
                len: self.actors.len(),
            })
        }
    }

    fn soft_delete(&mut self, id: usize) {
        self.actors.as_mut_slice()[id].deleted = true;
        self.moves.as_mut_slice()[id].flags.set_deleted(true);
        self.colliders.as_mut_slice()[id].flags.set_deleted(true);
        self.pending_destroy += 1;
    }

    /// Soft-delete the actor in slot `id`. Returns `false` if it was
    /// already marked.
    pub fn mark_for_destroy(&mut self, id: usize) -> Result<bool, ActorError> {
        self.check(id)?;
        if self.actors.as_slice()[id].deleted {
            return Ok(false);
        }
        self.soft_delete(id);
        Ok(true)
    }

    /// Soft-delete every live actor matching `predicate`.
    pub fn mark_for_destroy_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Actor<P>) -> bool,
    {
        let mut marked = 0;
        for id in 0..self.actors.len() {
            let actor = &self.actors.as_slice()[id];
            if !actor.deleted && predicate(actor) {
                self.soft_delete(id);
                marked += 1;
            }
        }
        marked
    }

    /// Physically remove every soft-deleted actor and renumber survivors.
    /// Returns the number of actors removed.
    pub fn compact(&mut self) -> usize {
        if self.pending_destroy == 0 {
            return 0;
        }

        let removed_shapes = self.compact_shapes();

        // The actor array decides which rows go; the packed flags only mirror it.
        let actors = self.actors.as_slice();
        let removed_moves = self.moves.compact_all(marked_rows(actors));
        let removed_colliders = self.colliders.compact_all(marked_rows(actors));
        let removed = self.actors.compact_all(|a| a.deleted);
        debug_assert_eq!(removed, removed_moves);
        debug_assert_eq!(removed, removed_colliders);

        for state in self.moves.iter_mut() {
            state.flags.set_deleted(false);
        }
        for collider in self.colliders.iter_mut() {
            collider.flags.set_deleted(false);
        }
        self.renumber_from(0);
        self.pending_destroy = 0;

        debug!(
            removed,
            removed_shapes,
            live = self.actors.len(),
            "compacted actor stores"
        );
        debug_assert!(self.is_consistent());
        removed
    }

    /// Drop the shape runs of soft-deleted colliders and pull every later
    /// `shape_start` down by the number of shapes removed before it.
    fn compact_shapes(&mut self) -> usize {
        self.dead_spans.clear();
        for (actor, collider) in self.actors.iter().zip(self.colliders.iter()) {
            if actor.deleted && collider.has_shapes() {
                self.dead_spans.push(DeadSpan {
                    start: collider.shape_start,
                    end: collider.shape_start + collider.shape_count,
                    removed_through: 0,
                });
            }
        }
        if self.dead_spans.is_empty() {
            return 0;
        }

        self.dead_spans.sort_unstable_by_key(|span| span.start);
        let mut total = 0;
        for span in &mut self.dead_spans {
            total += span.end - span.start;
            span.removed_through = total;
        }

        // The store calls the predicate once per element, in order, so a
        // running index tells us which shape is being looked at.
        let spans = &self.dead_spans;
        let mut index = 0u32;
        let mut cursor = 0;
        let removed = self.shapes.compact_all(|_| {
            let i = index;
            index += 1;
            while cursor < spans.len() && i >= spans[cursor].end {
                cursor += 1;
            }
            cursor < spans.len() && i >= spans[cursor].start
        });
        debug_assert_eq!(removed, total as usize);

        for collider in self.colliders.iter_mut() {
            let before = spans.partition_point(|span| span.start < collider.shape_start);
            if before > 0 {
                collider.shape_start -= spans[before - 1].removed_through;
            }
        }
        removed
    }

    fn renumber_from(&mut self, start: usize) {
        for (offset, actor) in self.actors.as_mut_slice()[start..].iter_mut().enumerate() {
            actor.id = start + offset;
            actor.move_index = start + offset;
        }
    }

    // ------------------------------------------------------------------
    // Immediate destruction
    // ------------------------------------------------------------------

    /// Remove slot `id` from every store without renumbering.
    fn remove_slot(&mut self, id: usize) -> Result<Actor<P>, ActorError> {
        let collider = self.colliders.as_slice()[id];
        if collider.has_shapes() {
            let start = collider.shape_start;
            let count = collider.shape_count;
            self.shapes.remove_range(start as usize, count as usize)?;
            for other in self.colliders.iter_mut() {
                if other.shape_start >= start + count {
                    other.shape_start -= count;
                }
            }
        }

        self.moves.remove_at(id)?;
        self.colliders.remove_at(id)?;
        let actor = self.actors.remove_at(id)?;
        if actor.deleted {
            self.pending_destroy -= 1;
        }
        Ok(actor)
    }

    /// Remove the actor in slot `id` immediately and return its payload.
    /// Every later actor moves down one slot.
    pub fn destroy_actor(&mut self, id: usize) -> Result<P, ActorError> {
        self.check(id)?;
        let actor = self.remove_slot(id)?;
        self.renumber_from(id);
        debug!(id, serial = actor.serial, "destroyed actor");
        debug_assert!(self.is_consistent());
        Ok(actor.payload)
    }

    /// Immediately remove every actor (soft-deleted or not) matching
    /// `predicate`, highest slot first.
    pub fn destroy_actors_where<F>(&mut self, mut predicate: F) -> Result<usize, ActorError>
    where
        F: FnMut(&Actor<P>) -> bool,
    {
        let mut destroyed = 0;
        let mut lowest = self.actors.len();
        for id in (0..self.actors.len()).rev() {
            if predicate(&self.actors.as_slice()[id]) {
                self.remove_slot(id)?;
                destroyed += 1;
                lowest = id;
            }
        }
        if destroyed > 0 {
            self.renumber_from(lowest);
            debug!(destroyed, live = self.actors.len(), "destroyed actors");
        }
        debug_assert!(self.is_consistent());
        Ok(destroyed)
    }

    /// Release spare capacity in every store.
    pub fn trim_excess(&mut self) {
        self.actors.trim_excess();
        self.moves.trim_excess();
        self.colliders.trim_excess();
        self.shapes.trim_excess();
    }

    // ------------------------------------------------------------------
    // Mutation helpers
    // ------------------------------------------------------------------

    pub fn set_velocity(&mut self, id: usize, velocity: Vec2) -> Result<(), ActorError> {
        self.check(id)?;
        let state = &mut self.moves.as_mut_slice()[id];
        state.velocity = velocity;
        state.refresh_derived();
        Ok(())
    }

    /// Teleport: sets both the position and the previous position.
    pub fn set_position(&mut self, id: usize, position: Vec2) -> Result<(), ActorError> {
        self.check(id)?;
        let state = &mut self.moves.as_mut_slice()[id];
        state.position = position;
        state.previous_position = position;
        Ok(())
    }

    pub fn set_boundary(
        &mut self,
        id: usize,
        side: BoundarySide,
        behavior: BoundaryBehavior,
    ) -> Result<(), ActorError> {
        self.check(id)?;
        self.moves.as_mut_slice()[id].flags.set_boundary(side, behavior);
        Ok(())
    }

    pub fn set_all_boundaries(&mut self, id: usize, behavior: BoundaryBehavior) -> Result<(), ActorError> {
        self.check(id)?;
        let flags = &mut self.moves.as_mut_slice()[id].flags;
        for side in BoundarySide::ALL {
            flags.set_boundary(side, behavior);
        }
        Ok(())
    }

    pub fn set_layer(&mut self, id: usize, layer: LayerMask) -> Result<(), ActorError> {
        self.check(id)?;
        self.colliders.as_mut_slice()[id].flags.set_layer(layer);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Actors not marked for destruction.
    pub fn live_count(&self) -> usize {
        self.actors.len() - self.pending_destroy
    }

    pub fn pending_destroy_count(&self) -> usize {
        self.pending_destroy
    }

    /// All slots, soft-deleted ones included.
    pub fn total_count(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn get(&self, id: usize) -> Result<&Actor<P>, ActorError> {
        self.check(id)?;
        Ok(&self.actors.as_slice()[id])
    }

    pub fn payload_mut(&mut self, id: usize) -> Result<&mut P, ActorError> {
        self.check(id)?;
        Ok(&mut self.actors.as_mut_slice()[id].payload)
    }

    /// Current slot of the actor behind `handle`, or `None` once it has
    /// been physically removed.
    ///
    /// Actors are appended in serial order and every removal preserves
    /// relative order, so the array stays sorted by serial.
    pub fn resolve(&self, handle: ActorHandle) -> Option<usize> {
        let actors = self.actors.as_slice();
        match actors.get(handle.index()) {
            Some(actor) if actor.serial == handle.serial() => Some(handle.index()),
            _ => actors
                .binary_search_by_key(&handle.serial(), |actor| actor.serial)
                .ok(),
        }
    }

    pub fn actors(&self) -> &[Actor<P>] {
        self.actors.as_slice()
    }

    pub fn iter_live(&self) -> impl Iterator<Item = &Actor<P>> + '_ {
        self.actors.iter().filter(|actor| !actor.deleted)
    }

    pub fn move_state(&self, id: usize) -> Result<&MoveState, ActorError> {
        self.check(id)?;
        Ok(&self.moves.as_slice()[id])
    }

    pub fn move_states(&self) -> &[MoveState] {
        self.moves.as_slice()
    }

    pub(crate) fn move_states_mut(&mut self) -> &mut [MoveState] {
        self.moves.as_mut_slice()
    }

    /// Move states as raw bytes, for handing positions to a renderer.
    pub fn move_state_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.moves.as_slice())
    }

    pub fn collider(&self, id: usize) -> Result<&ColliderState, ActorError> {
        self.check(id)?;
        Ok(&self.colliders.as_slice()[id])
    }

    pub fn colliders(&self) -> &[ColliderState] {
        self.colliders.as_slice()
    }

    pub fn shapes(&self) -> &[ColliderShape] {
        self.shapes.as_slice()
    }

    pub fn shapes_of(&self, id: usize) -> Result<&[ColliderShape], ActorError> {
        let range = self.collider(id)?.shape_range();
        Ok(&self.shapes.as_slice()[range])
    }

    /// Parallel-array lengths match, ids equal slots and no two live
    /// shape runs overlap.
    pub fn is_consistent(&self) -> bool {
        let len = self.actors.len();
        if self.moves.len() != len || self.colliders.len() != len {
            return false;
        }
        if self
            .actors
            .iter()
            .enumerate()
            .any(|(i, a)| a.id != i || a.move_index != i)
        {
            return false;
        }

        let mut runs: Vec<(usize, usize)> = self
            .colliders
            .iter()
            .filter(|c| !c.is_deleted() && c.has_shapes())
            .map(|c| (c.shape_start as usize, c.shape_start as usize + c.shape_count as usize))
            .collect();
        runs.sort_unstable();
        runs.iter().all(|&(_, end)| end <= self.shapes.len())
            && runs.windows(2).all(|w| w[0].1 <= w[1].0)
    }
}

impl<P> Default for ActorManager<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with(count: usize) -> ActorManager<u32> {
        let mut manager = ActorManager::new();
        for i in 0..count {
            manager
                .create_actor(i as u32, ActorDesc::at(Vec2::new(i as f32, 0.0)))
                .unwrap();
        }
        manager
    }

    fn payloads(manager: &ActorManager<u32>) -> Vec<u32> {
        manager.actors().iter().map(|a| *a.payload()).collect()
    }

    #[test]
    fn create_initialises_parallel_records() {
        let mut manager = ActorManager::new();
        let handle = manager
            .create_actor(
                "ship",
                ActorDesc::at(Vec2::new(3.0, 4.0))
                    .with_velocity(Vec2::new(0.0, -2.0))
                    .with_radius(5.0)
                    .with_layer(LayerMask::layer(2)),
            )
            .unwrap();
        assert_eq!(handle.index(), 0);

        let state = manager.move_state(0).unwrap();
        assert_eq!(state.previous_position, Vec2::new(3.0, 4.0));
        assert_eq!(state.speed, 2.0);
        assert!((state.velocity_angle + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        for side in BoundarySide::ALL {
            assert_eq!(state.flags.boundary(side), BoundaryBehavior::Pass);
        }

        let collider = manager.collider(0).unwrap();
        assert_eq!(collider.shape_range(), 0..1);
        assert_eq!(collider.layer(), LayerMask::layer(2));
        assert_eq!(manager.shapes_of(0).unwrap()[0].radius, 5.0);
        assert_eq!(manager.move_state_bytes().len(), std::mem::size_of::<MoveState>());
    }

    #[test]
    fn create_variants() {
        let mut manager = ActorManager::new();
        manager.create_actor_without_collider(0u32, ActorDesc::at(Vec2::ZERO)).unwrap();
        let composite = [
            ColliderShape::circle(1.0),
            ColliderShape::circle(2.0).with_offset(Vec2::new(3.0, 0.0)),
        ];
        manager
            .create_actor_with_shapes(1, ActorDesc::at(Vec2::ZERO), &composite)
            .unwrap();

        assert_eq!(manager.collider(0).unwrap().shape_count, 0);
        assert_eq!(manager.collider(1).unwrap().shape_range(), 0..2);
        assert_eq!(manager.shapes_of(1).unwrap(), &composite);

        assert_eq!(
            manager.create_actor_with_shapes(2, ActorDesc::at(Vec2::ZERO), &[]),
            Err(ActorError::EmptyShapes)
        );
        assert!(matches!(
            manager.create_actor(3, ActorDesc::at(Vec2::ZERO).with_radius(-1.0)),
            Err(ActorError::InvalidRadius(_))
        ));
        assert_eq!(manager.total_count(), 2);
    }

    #[test]
    fn mark_for_destroy_is_idempotent_and_checked() {
        let mut manager = manager_with(3);
        assert_eq!(manager.mark_for_destroy(1), Ok(true));
        assert_eq!(manager.mark_for_destroy(1), Ok(false));
        assert_eq!(
            manager.mark_for_destroy(3),
            Err(ActorError::OutOfRange { id: 3, len: 3 })
        );

        assert!(manager.get(1).unwrap().is_deleted());
        assert!(manager.move_state(1).unwrap().is_deleted());
        assert!(manager.collider(1).unwrap().is_deleted());
        assert_eq!(manager.live_count(), 2);
        assert_eq!(manager.pending_destroy_count(), 1);
        assert_eq!(manager.total_count(), 3);
    }

    #[test]
    fn compact_preserves_order_and_shape_accounting() {
        let mut manager = ActorManager::new();
        for i in 0..10u32 {
            let shapes: Vec<ColliderShape> = (0..(i % 3 + 1))
                .map(|k| ColliderShape::circle(i as f32 + k as f32 * 0.1))
                .collect();
            manager
                .create_actor_with_shapes(i, ActorDesc::at(Vec2::ZERO), &shapes)
                .unwrap();
        }
        let shapes_before = manager.shapes().len();

        let marked = manager.mark_for_destroy_where(|a| matches!(*a.payload(), 1 | 2 | 3 | 7));
        assert_eq!(marked, 4);
        let removed_shapes: usize = [1usize, 2, 3, 7]
            .iter()
            .map(|&id| manager.collider(id).unwrap().shape_count as usize)
            .sum();

        assert_eq!(manager.compact(), 4);
        assert_eq!(payloads(&manager), vec![0, 4, 5, 6, 8, 9]);
        assert!(manager.is_consistent());
        assert_eq!(manager.pending_destroy_count(), 0);

        let live_shapes: usize = manager.colliders().iter().map(|c| c.shape_count as usize).sum();
        assert_eq!(live_shapes + removed_shapes, shapes_before);
        assert_eq!(live_shapes, manager.shapes().len());

        // Every survivor still sees its own shapes.
        for actor in manager.actors() {
            let shapes = manager.shapes_of(actor.id()).unwrap();
            assert_eq!(shapes.len() as u32, actor.payload() % 3 + 1);
            assert_eq!(shapes[0].radius, *actor.payload() as f32);
        }
    }

    #[test]
    fn compact_follows_actor_marks_not_packed_flags() {
        let mut manager = manager_with(3);
        manager.mark_for_destroy(0).unwrap();
        // A stray delete bit on a move state must not desync the arrays.
        manager.move_states_mut()[2].flags.set_deleted(true);

        assert_eq!(manager.compact(), 1);
        assert_eq!(manager.total_count(), 2);
        assert_eq!(manager.move_states().len(), 2);
        assert_eq!(manager.colliders().len(), 2);
        assert!(manager.is_consistent());
        assert_eq!(payloads(&manager), vec![1, 2]);
        assert_eq!(manager.move_state(1).unwrap().position, Vec2::new(2.0, 0.0));
        assert!(!manager.move_state(1).unwrap().is_deleted());
    }

    #[test]
    fn compact_without_pending_is_a_no_op() {
        let mut manager = manager_with(4);
        assert_eq!(manager.compact(), 0);
        assert_eq!(payloads(&manager), vec![0, 1, 2, 3]);
    }

    #[test]
    fn destroy_actor_shifts_later_shape_ranges() {
        let mut manager = manager_with(4);
        manager.mark_for_destroy(3).unwrap();

        assert_eq!(manager.destroy_actor(1), Ok(1));
        assert_eq!(payloads(&manager), vec![0, 2, 3]);
        assert_eq!(manager.shapes().len(), 3);
        assert_eq!(manager.collider(1).unwrap().shape_range(), 1..2);
        assert_eq!(manager.shapes_of(1).unwrap()[0].radius, DEFAULT_RADIUS);
        assert_eq!(manager.get(2).unwrap().id(), 2);
        assert_eq!(manager.pending_destroy_count(), 1);

        // Destroying a soft-deleted actor clears its pending mark.
        assert_eq!(manager.destroy_actor(2), Ok(3));
        assert_eq!(manager.pending_destroy_count(), 0);
        assert!(manager.is_consistent());

        assert_eq!(
            manager.destroy_actor(7),
            Err(ActorError::OutOfRange { id: 7, len: 2 })
        );
    }

    #[test]
    fn destroy_where_removes_back_to_front() {
        let mut manager = manager_with(8);
        let destroyed = manager.destroy_actors_where(|a| a.payload() % 2 == 0).unwrap();
        assert_eq!(destroyed, 4);
        assert_eq!(payloads(&manager), vec![1, 3, 5, 7]);
        assert!(manager.is_consistent());
        for (i, state) in manager.move_states().iter().enumerate() {
            assert_eq!(state.position.x, (2 * i + 1) as f32);
        }
    }

    #[test]
    fn handles_follow_actors_through_compaction() {
        let mut manager = ActorManager::new();
        let handles: Vec<ActorHandle> = (0..6u32)
            .map(|i| manager.create_actor(i, ActorDesc::at(Vec2::ZERO)).unwrap())
            .collect();

        manager.mark_for_destroy(0).unwrap();
        manager.mark_for_destroy(2).unwrap();
        manager.compact();

        assert_eq!(manager.resolve(handles[0]), None);
        assert_eq!(manager.resolve(handles[1]), Some(0));
        assert_eq!(manager.resolve(handles[2]), None);
        assert_eq!(manager.resolve(handles[5]), Some(3));

        // A new actor landing in a stale slot is not mistaken for the old one.
        let fresh = manager.create_actor(99, ActorDesc::at(Vec2::ZERO)).unwrap();
        assert_eq!(fresh.index(), 4);
        assert_eq!(manager.resolve(handles[4]), Some(2));
        assert_ne!(manager.resolve(handles[4]), Some(fresh.index()));
    }

    #[test]
    fn setters_validate_ids() {
        let mut manager = manager_with(1);
        manager.set_velocity(0, Vec2::new(3.0, 4.0)).unwrap();
        assert_eq!(manager.move_state(0).unwrap().speed, 5.0);

        manager.set_all_boundaries(0, BoundaryBehavior::Bounce).unwrap();
        manager.set_boundary(0, BoundarySide::Top, BoundaryBehavior::Clamp).unwrap();
        let flags = manager.move_state(0).unwrap().flags;
        assert_eq!(flags.boundary(BoundarySide::Left), BoundaryBehavior::Bounce);
        assert_eq!(flags.boundary(BoundarySide::Top), BoundaryBehavior::Clamp);

        manager.set_position(0, Vec2::new(9.0, 9.0)).unwrap();
        assert_eq!(manager.move_state(0).unwrap().previous_position, Vec2::new(9.0, 9.0));

        manager.set_layer(0, LayerMask::NONE).unwrap();
        assert_eq!(manager.collider(0).unwrap().layer(), LayerMask::NONE);

        assert!(manager.set_velocity(1, Vec2::ZERO).is_err());
        assert!(manager.set_layer(5, LayerMask::ALL).is_err());
    }
}
