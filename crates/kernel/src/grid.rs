//! Moving grid layer.
//!
//! A single wireframe plane whose depth cycles through one cell, giving the
//! look of endless forward travel without spawning geometry.

use glam::Vec3;
use neonway_common::{Transform, wrap};

/// Spacing between grid lines. The mesh repeats every cell, so shifting it by
/// any amount in `[0, cell)` is indistinguishable from endless travel.
pub const GRID_CELL_SIZE: f32 = 10.0;
/// Depth of the grid origin when the offset is zero.
pub const GRID_BASE_Z: f32 = -100.0;
/// Side length of the square wireframe plane.
pub const GRID_EXTENT: f32 = 200.0;
/// Height of the plane, just under the lane floor.
pub const GRID_HEIGHT: f32 = -0.05;

/// Moving grid layer: one reusable wireframe plane slid along Z by a wrapped
/// accumulator.
///
/// Only the depth transform changes per tick; the line geometry is built once
/// by the render backend.
#[derive(Debug, Clone)]
pub struct MovingGrid {
    cell_size: f32,
    offset: f32,
}

impl Default for MovingGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl MovingGrid {
    /// Grid at rest with [`GRID_CELL_SIZE`] spacing.
    pub fn new() -> Self {
        Self {
            cell_size: GRID_CELL_SIZE,
            offset: 0.0,
        }
    }

    /// Cell size used for wrapping.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Accumulate `speed * dt` and wrap back into `[0, cell_size)`.
    /// `speed` is already the effective speed.
    pub fn advance(&mut self, speed: f32, dt: f32) {
        self.offset = wrap(self.offset + speed * dt, self.cell_size);
    }

    /// Current accumulator, always in `[0, cell_size)`.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Depth of the plane for this tick.
    pub fn z_position(&self) -> f32 {
        GRID_BASE_Z + wrap(self.offset, self.cell_size)
    }

    /// Placement of the plane for this tick.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(Vec3::new(0.0, GRID_HEIGHT, self.z_position()))
    }

    /// Number of lines along each axis for a plane of `GRID_EXTENT`.
    pub fn divisions(&self) -> u32 {
        (GRID_EXTENT / self.cell_size).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_base_depth() {
        let grid = MovingGrid::new();
        assert_eq!(grid.offset(), 0.0);
        assert_eq!(grid.z_position(), -100.0);
        assert_eq!(grid.divisions(), 20);
    }

    #[test]
    fn fallback_speed_second_moves_five_units() {
        let mut grid = MovingGrid::new();
        grid.advance(neonway_common::effective_speed(0.0), 1.0);
        assert_eq!(grid.offset(), 5.0);
        assert_eq!(grid.z_position(), -95.0);
    }

    #[test]
    fn offset_wraps_at_cell_size() {
        let mut grid = MovingGrid::new();
        grid.advance(8.0, 1.0);
        grid.advance(8.0, 0.5);
        assert!((grid.offset() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn offset_stays_bounded_over_irregular_deltas() {
        let mut grid = MovingGrid::new();
        let deltas = [0.0, 0.016, 0.033, 0.1, 0.0007, 1.3, 0.25, 7.77];
        for i in 0..2000 {
            let dt = deltas[i % deltas.len()];
            let speed = 1.0 + (i % 37) as f32 * 3.1;
            grid.advance(speed, dt);
            let offset = grid.offset();
            assert!((0.0..10.0).contains(&offset), "offset={offset}");
            assert_eq!(grid.z_position(), -100.0 + offset);
        }
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut grid = MovingGrid::new();
        grid.advance(5.0, 0.3);
        let before = grid.offset();
        grid.advance(5.0, 0.0);
        assert_eq!(grid.offset(), before);
    }

    #[test]
    fn transform_only_moves_depth() {
        let mut grid = MovingGrid::new();
        grid.advance(5.0, 0.5);
        let t = grid.transform();
        assert_eq!(t.position.x, 0.0);
        assert_eq!(t.position.y, GRID_HEIGHT);
        assert_eq!(t.position.z, -97.5);
    }
}
