use glam::Vec2;

use super::boundary::{set_bnd_velocity, Wrap};
use crate::state::Grid;

/// Empirical confinement strength (epsilon in f = eps * (N x omega)).
pub const VORTICITY_CONFINEMENT: f32 = 0.2;

/// Discrete curl at (i, j): omega = dv/dx - du/dy, central differences.
#[inline]
pub fn curl_at(uv: &[Vec2], grid: &Grid, i: usize, j: usize) -> f32 {
    let ii = grid.idx(i, j);
    let stride = grid.stride();
    let dvdx = (uv[ii + 1].y - uv[ii - 1].y) * 0.5;
    let dudy = (uv[ii + stride].x - uv[ii - stride].x) * 0.5;
    dvdx - dudy
}

/// Vorticity confinement: push velocity along N x omega, where N is the
/// normalized gradient of |omega|, to counteract numerical dissipation.
///
/// `curl` receives the signed curl and `curl_abs` its magnitude; both are
/// rebuilt from scratch on every call.
pub fn vorticity_confinement(
    uv: &mut [Vec2],
    curl: &mut [f32],
    curl_abs: &mut [f32],
    epsilon: f32,
    dt: f32,
    grid: &Grid,
    wrap: Wrap,
) {
    curl.fill(0.0);
    curl_abs.fill(0.0);

    for j in 1..=grid.ny {
        for i in 1..=grid.nx {
            let w = curl_at(uv, grid, i, j);
            let ii = grid.idx(i, j);
            curl[ii] = w;
            curl_abs[ii] = w.abs();
        }
    }

    // Gradient of |omega| needs interior neighbours on both sides.
    let stride = grid.stride();
    for j in 2..grid.ny {
        for i in 2..grid.nx {
            let ii = grid.idx(i, j);
            let eta_x = (curl_abs[ii + 1] - curl_abs[ii - 1]) * 0.5;
            let eta_y = (curl_abs[ii + stride] - curl_abs[ii - stride]) * 0.5;
            let len = (eta_x * eta_x + eta_y * eta_y).sqrt() + 1e-6;
            let norm_x = eta_x / len;
            let norm_y = eta_y / len;

            let w = curl[ii];
            // 2D cross product: f_x = eps * ny * w, f_y = -eps * nx * w
            uv[ii].x += dt * epsilon * norm_y * w;
            uv[ii].y -= dt * epsilon * norm_x * w;
        }
    }
    set_bnd_velocity(uv, grid, wrap);
}
