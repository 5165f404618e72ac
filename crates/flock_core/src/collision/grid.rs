//! Uniform broad-phase grid rebuilt every tick.
//!
//! Buckets are stored CSR-style: `cell_start[c]..cell_start[c + 1]` indexes
//! into `entries`, which holds actor slots grouped by cell. All buffers are
//! kept between rebuilds, so a warm grid does not allocate.

use super::CollisionError;
use crate::components::{ColliderState, MoveState};
use crate::scene::Scene;
use glam::Vec2;

/// Neighbour offsets visited from each occupied cell: right, down,
/// down-right, down-left. Together with the in-cell pass this touches every
/// unordered pair of adjacent cells exactly once.
pub(crate) const FORWARD_NEIGHBORS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

/// Occupancy figures for the most recent rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    pub bucketed: usize,
    pub occupied_cells: usize,
    /// Live, shaped actors whose position fell outside the grid.
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct CollisionGrid {
    origin: Vec2,
    cell_size: f32,
    inv_cell_size: f32,
    columns: usize,
    rows: usize,
    cell_start: Vec<u32>,
    cursor: Vec<u32>,
    entries: Vec<u32>,
    occupied: Vec<u32>,
    pending: Vec<(u32, u32)>,
    stats: GridStats,
}

impl CollisionGrid {
    /// Grid covering `scene` with square cells of `cell_size`.
    ///
    /// Cells should be at least as large as the biggest collider extent;
    /// only adjacent cells are searched for partners.
    pub fn new(scene: &Scene, cell_size: f32) -> Result<Self, CollisionError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(CollisionError::InvalidCellSize(cell_size));
        }
        scene.validate()?;

        let columns = (scene.width() / cell_size).floor() as usize + 1;
        let rows = (scene.height() / cell_size).floor() as usize + 1;
        let cells = columns
            .checked_mul(rows)
            .filter(|&cells| cells < u32::MAX as usize)
            .ok_or(CollisionError::TooManyCells { columns, rows })?;

        Ok(Self {
            origin: scene.min(),
            cell_size,
            inv_cell_size: cell_size.recip(),
            columns,
            rows,
            cell_start: vec![0; cells + 1],
            cursor: vec![0; cells],
            entries: Vec::new(),
            occupied: Vec::new(),
            pending: Vec::new(),
            stats: GridStats::default(),
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn stats(&self) -> GridStats {
        self.stats
    }

    /// Column and row of the cell containing `position`, or `None` if it
    /// lies outside the grid.
    #[inline]
    pub fn cell_coords(&self, position: Vec2) -> Option<(usize, usize)> {
        let local = ((position - self.origin) * self.inv_cell_size).floor();
        // Written so NaN fails the test.
        if !(local.x >= 0.0 && local.y >= 0.0) {
            return None;
        }
        let (cx, cy) = (local.x as usize, local.y as usize);
        (cx < self.columns && cy < self.rows).then_some((cx, cy))
    }

    #[inline]
    fn cell_index(&self, cx: usize, cy: usize) -> usize {
        cy * self.columns + cx
    }

    /// Bucket every live actor that has at least one shape.
    pub fn rebuild(&mut self, moves: &[MoveState], colliders: &[ColliderState]) {
        debug_assert_eq!(moves.len(), colliders.len());

        self.cell_start.fill(0);
        self.occupied.clear();
        self.pending.clear();
        let mut dropped = 0;

        for (slot, (state, collider)) in moves.iter().zip(colliders).enumerate() {
            if state.is_deleted() || collider.is_deleted() || !collider.has_shapes() {
                continue;
            }
            let Some((cx, cy)) = self.cell_coords(state.position) else {
                dropped += 1;
                continue;
            };
            let cell = self.cell_index(cx, cy);
            // cell_start[c + 1] holds the count for cell c until the prefix sum.
            if self.cell_start[cell + 1] == 0 {
                self.occupied.push(cell as u32);
            }
            self.cell_start[cell + 1] += 1;
            self.pending.push((cell as u32, slot as u32));
        }

        for c in 1..self.cell_start.len() {
            self.cell_start[c] += self.cell_start[c - 1];
        }

        let cells = self.cursor.len();
        self.cursor.copy_from_slice(&self.cell_start[..cells]);
        self.entries.clear();
        self.entries.resize(self.pending.len(), 0);
        for &(cell, slot) in &self.pending {
            let at = &mut self.cursor[cell as usize];
            self.entries[*at as usize] = slot;
            *at += 1;
        }

        self.occupied.sort_unstable();
        self.stats = GridStats {
            bucketed: self.pending.len(),
            occupied_cells: self.occupied.len(),
            dropped,
        };
    }

    /// Actor slots bucketed in cell (`cx`, `cy`), in ascending slot order.
    pub fn bucket(&self, cx: usize, cy: usize) -> &[u32] {
        if cx >= self.columns || cy >= self.rows {
            return &[];
        }
        let cell = self.cell_index(cx, cy);
        let start = self.cell_start[cell] as usize;
        let end = self.cell_start[cell + 1] as usize;
        &self.entries[start..end]
    }

    /// Occupied cells as (column, row), in row-major order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.occupied
            .iter()
            .map(move |&cell| (cell as usize % self.columns, cell as usize / self.columns))
    }

    /// Forward neighbour of (`cx`, `cy`) at offset (`dx`, `dy`), if inside.
    #[inline]
    pub(crate) fn neighbor(&self, cx: usize, cy: usize, dx: isize, dy: isize) -> Option<(usize, usize)> {
        let nx = cx.checked_add_signed(dx)?;
        let ny = cy.checked_add_signed(dy)?;
        (nx < self.columns && ny < self.rows).then_some((nx, ny))
    }
}
