//! Plain-data records stored in the parallel actor arrays.
//!
//! Index `i` in the actor, move-state and collider-state arrays always
//! describes the same entity. `MoveState`, `ColliderState` and
//! `ColliderShape` are `#[repr(C)]` + `Pod` so the hot arrays can be handed
//! to an interop or render bridge as raw bytes.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, Range};

// ============================================================================
// Boundary behaviour
// ============================================================================

/// What happens when an entity crosses one side of the scene bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BoundaryBehavior {
    /// No constraint.
    #[default]
    Pass = 0,
    /// Pin the position to the bound and zero that axis's velocity.
    Clamp = 1,
    /// Reflect the overshoot back inside and negate that axis's velocity.
    Bounce = 2,
}

impl BoundaryBehavior {
    /// Decode a 4-bit code. Unknown codes decode as `Pass`.
    #[inline]
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Clamp,
            2 => Self::Bounce,
            _ => Self::Pass,
        }
    }

    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// One side of the scene rectangle. `Top` is the `min_y` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundarySide {
    Left,
    Right,
    Top,
    Bottom,
}

impl BoundarySide {
    pub const ALL: [BoundarySide; 4] = [Self::Left, Self::Right, Self::Top, Self::Bottom];

    #[inline]
    const fn shift(self) -> u32 {
        match self {
            Self::Left => 0,
            Self::Right => 4,
            Self::Top => 8,
            Self::Bottom => 12,
        }
    }
}

/// Packed movement flags.
///
/// Layout: bits 0-3 left, 4-7 right, 8-11 top, 12-15 bottom boundary codes;
/// bit 16 soft-delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct MoveFlags(u32);

impl MoveFlags {
    const NIBBLE: u32 = 0xF;
    const DELETED: u32 = 1 << 16;

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn boundary(self, side: BoundarySide) -> BoundaryBehavior {
        BoundaryBehavior::from_code((self.0 >> side.shift()) & Self::NIBBLE)
    }

    #[inline]
    pub fn set_boundary(&mut self, side: BoundarySide, behavior: BoundaryBehavior) {
        let shift = side.shift();
        self.0 = (self.0 & !(Self::NIBBLE << shift)) | (behavior.code() << shift);
    }

    #[must_use]
    pub fn with_boundary(mut self, side: BoundarySide, behavior: BoundaryBehavior) -> Self {
        self.set_boundary(side, behavior);
        self
    }

    #[inline]
    pub const fn is_deleted(self) -> bool {
        self.0 & Self::DELETED != 0
    }

    #[inline]
    pub fn set_deleted(&mut self, deleted: bool) {
        if deleted {
            self.0 |= Self::DELETED;
        } else {
            self.0 &= !Self::DELETED;
        }
    }
}

// ============================================================================
// Movement
// ============================================================================

/// Kinematic state of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct MoveState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub previous_position: Vec2,
    /// `|velocity|`, derived each tick.
    pub speed: f32,
    /// Heading in radians. Only refreshed while the velocity is non-zero.
    pub velocity_angle: f32,
    pub flags: MoveFlags,
}

impl MoveState {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        let mut state = Self {
            position,
            velocity,
            previous_position: position,
            ..Self::default()
        };
        state.refresh_derived();
        state
    }

    /// Recompute `speed` and `velocity_angle` from `velocity`. A zero
    /// velocity keeps the last heading.
    #[inline]
    pub fn refresh_derived(&mut self) {
        if self.velocity != Vec2::ZERO {
            self.speed = self.velocity.length();
            self.velocity_angle = self.velocity.y.atan2(self.velocity.x);
        } else {
            self.speed = 0.0;
        }
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.flags.is_deleted()
    }
}

// ============================================================================
// Collision
// ============================================================================

/// 16-bit collision layer mask. Two colliders interact only when their
/// masks share a bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
#[repr(transparent)]
pub struct LayerMask(pub u16);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u16::MAX);

    /// Mask with only layer `index` set. `index` is taken modulo 16.
    #[inline]
    pub const fn layer(index: u8) -> Self {
        Self(1 << (index % 16))
    }

    #[inline]
    pub const fn overlaps(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for LayerMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Packed collider flags: bits 0-15 layer mask, bit 16 soft-delete.
///
/// Soft-deletion is independent of having zero shapes; a collider with
/// `shape_count == 0` is alive but never collides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct ColliderFlags(u32);

impl ColliderFlags {
    const LAYER_MASK: u32 = 0xFFFF;
    const DELETED: u32 = 1 << 16;

    #[inline]
    pub const fn new(layer: LayerMask) -> Self {
        Self(layer.0 as u32)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn layer(self) -> LayerMask {
        LayerMask((self.0 & Self::LAYER_MASK) as u16)
    }

    #[inline]
    pub fn set_layer(&mut self, layer: LayerMask) {
        self.0 = (self.0 & !Self::LAYER_MASK) | layer.0 as u32;
    }

    #[inline]
    pub const fn is_deleted(self) -> bool {
        self.0 & Self::DELETED != 0
    }

    #[inline]
    pub fn set_deleted(&mut self, deleted: bool) {
        if deleted {
            self.0 |= Self::DELETED;
        } else {
            self.0 &= !Self::DELETED;
        }
    }
}

/// Per-entity view into the shared shape array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct ColliderState {
    pub shape_start: u32,
    pub shape_count: u32,
    pub flags: ColliderFlags,
}

impl ColliderState {
    #[inline]
    pub fn shape_range(&self) -> Range<usize> {
        let start = self.shape_start as usize;
        start..start + self.shape_count as usize
    }

    #[inline]
    pub fn has_shapes(&self) -> bool {
        self.shape_count > 0
    }

    #[inline]
    pub fn layer(&self) -> LayerMask {
        self.flags.layer()
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.flags.is_deleted()
    }
}

/// A circle relative to its owner's position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct ColliderShape {
    pub offset: Vec2,
    pub radius: f32,
}

impl ColliderShape {
    pub const fn circle(radius: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            radius,
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    pub fn center(&self, owner: Vec2) -> Vec2 {
        owner + self.offset
    }
}

// ============================================================================
// Actors
// ============================================================================

/// Handle to an actor that survives compaction.
///
/// `index` is the slot at the time the handle was issued; `serial` is
/// unique per actor for the lifetime of the manager. Resolve through
/// [`ActorManager::resolve`](crate::actors::ActorManager::resolve).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorHandle {
    index: usize,
    serial: u64,
}

impl ActorHandle {
    pub(crate) const fn new(index: usize, serial: u64) -> Self {
        Self { index, serial }
    }

    /// Slot the actor occupied when the handle was issued.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// Entity record: bookkeeping owned by the manager plus an opaque payload.
#[derive(Debug, Clone)]
pub struct Actor<P> {
    pub(crate) id: usize,
    pub(crate) move_index: usize,
    pub(crate) serial: u64,
    pub(crate) deleted: bool,
    pub(crate) payload: P,
}

impl<P> Actor<P> {
    /// Current slot index.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Slot of this actor's `MoveState` (always equal to `id`).
    #[inline]
    pub fn move_index(&self) -> usize {
        self.move_index
    }

    #[inline]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn handle(&self) -> ActorHandle {
        ActorHandle::new(self.id, self.serial)
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }
}
