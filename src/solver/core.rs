use std::ops::{Add, Mul};

use glam::Vec2;

use super::boundary::{set_bnd, set_bnd_velocity, FieldType, Wrap};
use crate::state::Grid;

/// Gauss-Seidel relaxation shared by every field type.
/// Solves: x[i,j] = (x0[i,j] + a * (neighbors)) / c, rebuilding the ring after
/// each sweep with `bnd`.
fn relax<T>(x: &mut [T], x0: &[T], a: f32, c: f32, iter: usize, grid: &Grid, mut bnd: impl FnMut(&mut [T]))
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let c_inv = 1.0 / c;
    let stride = grid.stride();
    for _ in 0..iter {
        for j in 1..=grid.ny {
            for i in 1..=grid.nx {
                let ii = grid.idx(i, j);
                let neighbors = x[ii - 1] + x[ii + 1] + x[ii - stride] + x[ii + stride];
                x[ii] = (x0[ii] + neighbors * a) * c_inv;
            }
        }
        bnd(x);
    }
}

/// Gauss-Seidel iterative linear solver for a scalar field.
pub fn lin_solve(field_type: FieldType, x: &mut [f32], x0: &[f32], a: f32, c: f32, iter: usize, grid: &Grid, wrap: Wrap) {
    relax(x, x0, a, c, iter, grid, |x| set_bnd(field_type, x, grid, wrap));
}

/// Gauss-Seidel iterative linear solver for the packed velocity field.
pub fn lin_solve_velocity(uv: &mut [Vec2], uv0: &[Vec2], a: f32, c: f32, iter: usize, grid: &Grid, wrap: Wrap) {
    relax(uv, uv0, a, c, iter, grid, |uv| set_bnd_velocity(uv, grid, wrap));
}

/// Implicit diffusion weight: a = dt * diff * NX * NY.
fn diffusion_weight(diff: f32, dt: f32, grid: &Grid) -> f32 {
    dt * diff * grid.nx as f32 * grid.ny as f32
}

/// Diffusion step: spreads the field over time.
/// a = dt * diff * NX * NY, c = 1 + 4a
pub fn diffuse(field_type: FieldType, x: &mut [f32], x0: &[f32], diff: f32, dt: f32, iter: usize, grid: &Grid, wrap: Wrap) {
    let a = diffusion_weight(diff, dt, grid);
    x.copy_from_slice(x0);
    lin_solve(field_type, x, x0, a, 1.0 + 4.0 * a, iter, grid, wrap);
}

/// Diffuse both velocity components in one pass.
pub fn diffuse_velocity(uv: &mut [Vec2], uv0: &[Vec2], visc: f32, dt: f32, iter: usize, grid: &Grid, wrap: Wrap) {
    let a = diffusion_weight(visc, dt, grid);
    uv.copy_from_slice(uv0);
    lin_solve_velocity(uv, uv0, a, 1.0 + 4.0 * a, iter, grid, wrap);
}

/// Map a backtraced coordinate onto the sampleable range of one axis.
/// Walled axes clamp to [0.5, n + 0.5]; wrapped axes fold into the same span.
#[inline]
fn trace_coord(pos: f32, n: usize, wrap: bool) -> f32 {
    let n_f = n as f32;
    if wrap {
        (pos - 0.5).rem_euclid(n_f) + 0.5
    } else {
        pos.clamp(0.5, n_f + 0.5)
    }
}

/// Semi-Lagrangian advection: traces each cell backwards through `uv` and
/// bilinearly samples `d0` at the departure point.
fn advect_with<T>(d: &mut [T], d0: &[T], uv: &[Vec2], dt: f32, grid: &Grid, wrap: Wrap)
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let dt0x = dt * grid.nx as f32;
    let dt0y = dt * grid.ny as f32;

    for j in 1..=grid.ny {
        for i in 1..=grid.nx {
            let ii = grid.idx(i, j);
            let x = trace_coord(i as f32 - dt0x * uv[ii].x, grid.nx, wrap.x);
            let y = trace_coord(j as f32 - dt0y * uv[ii].y, grid.ny, wrap.y);

            let i0 = x.floor() as usize;
            let j0 = y.floor() as usize;
            let (i1, j1) = (i0 + 1, j0 + 1);
            let s1 = x - i0 as f32;
            let s0 = 1.0 - s1;
            let t1 = y - j0 as f32;
            let t0 = 1.0 - t1;

            d[ii] = (d0[grid.idx(i0, j0)] * t0 + d0[grid.idx(i0, j1)] * t1) * s0
                + (d0[grid.idx(i1, j0)] * t0 + d0[grid.idx(i1, j1)] * t1) * s1;
        }
    }
}

/// Advect a scalar field along `uv`.
pub fn advect(field_type: FieldType, d: &mut [f32], d0: &[f32], uv: &[Vec2], dt: f32, grid: &Grid, wrap: Wrap) {
    advect_with(d, d0, uv, dt, grid, wrap);
    set_bnd(field_type, d, grid, wrap);
}

/// Self-advection of the velocity field: `uv0` is both the transported
/// quantity and the flow.
pub fn advect_velocity(uv: &mut [Vec2], uv0: &[Vec2], dt: f32, grid: &Grid, wrap: Wrap) {
    advect_with(uv, uv0, uv0, dt, grid, wrap);
    set_bnd_velocity(uv, grid, wrap);
}

/// Pressure projection: enforces incompressibility (divergence-free velocity field).
pub fn project(uv: &mut [Vec2], p: &mut [f32], div: &mut [f32], iter: usize, grid: &Grid, wrap: Wrap) {
    let stride = grid.stride();
    let hx = 1.0 / grid.nx as f32;
    let hy = 1.0 / grid.ny as f32;

    // Calculate divergence
    for j in 1..=grid.ny {
        for i in 1..=grid.nx {
            let ii = grid.idx(i, j);
            div[ii] = -0.5
                * (hx * (uv[ii + 1].x - uv[ii - 1].x)
                    + hy * (uv[ii + stride].y - uv[ii - stride].y));
            p[ii] = 0.0;
        }
    }
    set_bnd(FieldType::Scalar, div, grid, wrap);
    set_bnd(FieldType::Scalar, p, grid, wrap);

    // Solve for pressure
    lin_solve(FieldType::Scalar, p, div, 1.0, 4.0, iter, grid, wrap);

    // Subtract pressure gradient from velocity
    let fx = 0.5 * grid.nx as f32;
    let fy = 0.5 * grid.ny as f32;
    for j in 1..=grid.ny {
        for i in 1..=grid.nx {
            let ii = grid.idx(i, j);
            uv[ii].x -= fx * (p[ii + 1] - p[ii - 1]);
            uv[ii].y -= fy * (p[ii + stride] - p[ii - stride]);
        }
    }
    set_bnd_velocity(uv, grid, wrap);
}

/// Additive source injection: x += x0 over every stored cell.
pub fn add_source<T>(x: &mut [T], x0: &[T])
where
    T: Copy + Add<Output = T>,
{
    for (v, s) in x.iter_mut().zip(x0) {
        *v = *v + *s;
    }
}

/// Multiply every cell by `hold` and clamp at zero.
pub fn fade(x: &mut [f32], hold: f32) {
    for v in x.iter_mut() {
        *v = (*v * hold).max(0.0);
    }
}
