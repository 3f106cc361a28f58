use glam::Vec2;

use crate::state::Grid;

/// Field type for boundary condition dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Color, pressure, divergence: plain copy at every wall.
    Scalar,
    /// Horizontal velocity: negated at the left/right walls.
    Vx,
    /// Vertical velocity: negated at the top/bottom walls.
    Vy,
}

/// Per-axis toroidal wrapping. A wrapped axis has no walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Wrap {
    pub x: bool,
    pub y: bool,
}

impl Wrap {
    pub const NONE: Wrap = Wrap { x: false, y: false };

    pub const fn new(x: bool, y: bool) -> Self {
        Self { x, y }
    }
}

/// Rebuild the boundary ring of `x` from its interior.
///
/// Wrapped axes copy from the opposite interior edge. Walled axes copy the
/// adjacent interior cell through `reflect_x` (left/right) or `reflect_y`
/// (top/bottom). Corners average their two edge neighbours.
fn fill_ring<T: Copy>(
    x: &mut [T],
    grid: &Grid,
    wrap: Wrap,
    reflect_x: impl Fn(T) -> T,
    reflect_y: impl Fn(T) -> T,
    average: impl Fn(T, T) -> T,
) {
    let (nx, ny) = (grid.nx, grid.ny);

    for j in 1..=ny {
        let (left, right) = if wrap.x {
            (x[grid.idx(nx, j)], x[grid.idx(1, j)])
        } else {
            (reflect_x(x[grid.idx(1, j)]), reflect_x(x[grid.idx(nx, j)]))
        };
        x[grid.idx(0, j)] = left;
        x[grid.idx(nx + 1, j)] = right;
    }

    for i in 1..=nx {
        let (bottom, top) = if wrap.y {
            (x[grid.idx(i, ny)], x[grid.idx(i, 1)])
        } else {
            (reflect_y(x[grid.idx(i, 1)]), reflect_y(x[grid.idx(i, ny)]))
        };
        x[grid.idx(i, 0)] = bottom;
        x[grid.idx(i, ny + 1)] = top;
    }

    x[grid.idx(0, 0)] = average(x[grid.idx(1, 0)], x[grid.idx(0, 1)]);
    x[grid.idx(0, ny + 1)] = average(x[grid.idx(1, ny + 1)], x[grid.idx(0, ny)]);
    x[grid.idx(nx + 1, 0)] = average(x[grid.idx(nx, 0)], x[grid.idx(nx + 1, 1)]);
    x[grid.idx(nx + 1, ny + 1)] = average(x[grid.idx(nx, ny + 1)], x[grid.idx(nx + 1, ny)]);
}

/// Boundary condition handler for scalar-valued fields.
pub fn set_bnd(field_type: FieldType, x: &mut [f32], grid: &Grid, wrap: Wrap) {
    let keep = |v: f32| v;
    let negate = |v: f32| -v;
    let average = |a: f32, b: f32| 0.5 * (a + b);
    match field_type {
        FieldType::Scalar => fill_ring(x, grid, wrap, keep, keep, average),
        FieldType::Vx => fill_ring(x, grid, wrap, negate, keep, average),
        FieldType::Vy => fill_ring(x, grid, wrap, keep, negate, average),
    }
}

/// Boundary condition handler for the packed velocity field.
/// Equivalent to `Vx` on the x component and `Vy` on the y component.
pub fn set_bnd_velocity(uv: &mut [Vec2], grid: &Grid, wrap: Wrap) {
    fill_ring(
        uv,
        grid,
        wrap,
        |v| Vec2::new(-v.x, v.y),
        |v| Vec2::new(v.x, -v.y),
        |a, b| 0.5 * (a + b),
    );
}
