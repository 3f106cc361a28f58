use glam::Vec2;

use crate::state::{FluidState, Grid};

/// Summary statistics recomputed after every step, for external display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowStats {
    /// Mean of the R channel over interior cells.
    pub avg_density: f32,
    /// 1 / (1 + variance of R); 1.0 means perfectly uniform.
    pub uniformity: f32,
    /// Mean velocity magnitude in normalized units.
    pub avg_speed: f32,
}

impl FlowStats {
    pub fn measure(state: &FluidState) -> Self {
        let grid = &state.grid;
        let r = state.r.cur();
        let uv = state.uv.cur();
        let scale = Vec2::new(1.0 / grid.nx as f32, 1.0 / grid.ny as f32);

        let mut density_sum = 0.0_f64;
        let mut speed_sum = 0.0_f64;
        for j in 1..=grid.ny {
            for i in 1..=grid.nx {
                let ii = grid.idx(i, j);
                density_sum += r[ii] as f64;
                speed_sum += (uv[ii] * scale).length() as f64;
            }
        }
        let count = (grid.nx * grid.ny) as f64;
        let avg_density = density_sum / count;

        let mut deviation_sum = 0.0_f64;
        for j in 1..=grid.ny {
            for i in 1..=grid.nx {
                let d = r[grid.idx(i, j)] as f64 - avg_density;
                deviation_sum += d * d;
            }
        }

        Self {
            avg_density: avg_density as f32,
            uniformity: (1.0 / (1.0 + deviation_sum / count)) as f32,
            avg_speed: (speed_sum / count) as f32,
        }
    }
}

/// Sum of |divergence| over interior cells, in normalized velocity units.
pub fn divergence_norm(uv: &[Vec2], grid: &Grid) -> f32 {
    let stride = grid.stride();
    let hx = 0.5 / grid.nx as f32;
    let hy = 0.5 / grid.ny as f32;
    let mut sum = 0.0;
    for j in 1..=grid.ny {
        for i in 1..=grid.nx {
            let ii = grid.idx(i, j);
            let d = hx * (uv[ii + 1].x - uv[ii - 1].x) + hy * (uv[ii + stride].y - uv[ii - stride].y);
            sum += d.abs();
        }
    }
    sum
}
