//! Exact multi-circle overlap test for one candidate pair.

use super::CollisionEvent;
use crate::components::{ColliderShape, ColliderState, MoveState};
use glam::Vec2;

/// Borrowed view of the arrays the narrow phase reads.
#[derive(Clone, Copy)]
pub(crate) struct NarrowInput<'a> {
    pub moves: &'a [MoveState],
    pub colliders: &'a [ColliderState],
    pub shapes: &'a [ColliderShape],
}

impl NarrowInput<'_> {
    /// Test slots `a` and `b` (`a < b`). Every shape of `a` is tested
    /// against every shape of `b`; the overlapping shape pair with the
    /// smallest penetration is reported.
    pub fn test(&self, a: usize, b: usize) -> Option<CollisionEvent> {
        debug_assert!(a < b);
        let (ca, cb) = (&self.colliders[a], &self.colliders[b]);
        if ca.is_deleted() || cb.is_deleted() || !ca.has_shapes() || !cb.has_shapes() {
            return None;
        }
        if !ca.layer().overlaps(cb.layer()) {
            return None;
        }
        let (ma, mb) = (&self.moves[a], &self.moves[b]);
        if ma.is_deleted() || mb.is_deleted() {
            return None;
        }

        let mut best: Option<(f32, Vec2)> = None;
        for sa in &self.shapes[ca.shape_range()] {
            let center_a = sa.center(ma.position);
            for sb in &self.shapes[cb.shape_range()] {
                let delta = sb.center(mb.position) - center_a;
                let radius_sum = sa.radius + sb.radius;
                let dist_sq = delta.length_squared();
                if dist_sq > radius_sum * radius_sum {
                    continue;
                }
                let dist = dist_sq.sqrt();
                let penetration = radius_sum - dist;
                if best.map_or(true, |(p, _)| penetration < p) {
                    // Coincident centres have no direction; fall back to +X.
                    let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::X };
                    best = Some((penetration, normal));
                }
            }
        }

        best.map(|(penetration, normal)| CollisionEvent {
            a,
            b,
            penetration,
            normal,
        })
    }
}
