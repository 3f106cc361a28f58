mod boundary;
mod core;
pub mod diagnostics;
mod params;
mod vorticity;

// Re-export public API
pub use boundary::{FieldType, Wrap};
pub use diagnostics::FlowStats;
pub use params::{
    SolverParams, DEFAULT_COLOR_DIFFUSION, DEFAULT_DT, DEFAULT_FADE_SPEED, DEFAULT_NX, DEFAULT_NY,
    DEFAULT_SOLVER_ITERATIONS, DEFAULT_VISC,
};
pub use vorticity::VORTICITY_CONFINEMENT;

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::state::{DoubleBuffer, FluidState, Grid};
use boundary::{set_bnd, set_bnd_velocity};
use self::core::{add_source, advect, advect_velocity, diffuse, diffuse_velocity, fade, project};
use vorticity::vorticity_confinement;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolverError {
    #[error("grid size must be positive in both dimensions, got {nx}x{ny}")]
    InvalidSize { nx: usize, ny: usize },
}

/// Real-time 2D stable-fluids solver over a fixed grid.
///
/// Constructed inert; `setup`/`set_size` allocate the buffers. Forces and
/// color accumulate between steps and are consumed by the next `update()`.
/// Not internally synchronized: forcing, reading and `update()` must happen
/// on the owning thread.
pub struct FluidSolver {
    params: SolverParams,
    state: Option<FluidState>,
    stats: FlowStats,
}

impl Default for FluidSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FluidSolver {
    /// Inert solver with default parameters and no buffers.
    pub fn new() -> Self {
        Self::with_params(SolverParams::default())
    }

    pub fn with_params(params: SolverParams) -> Self {
        Self {
            params,
            state: None,
            stats: FlowStats::default(),
        }
    }

    /// Allocate buffers for an NX x NY interior grid and mark the solver ready.
    pub fn setup(&mut self, nx: usize, ny: usize) -> Result<&mut Self, SolverError> {
        self.set_size(nx, ny)
    }

    /// (Re)allocate every buffer for a new grid size. Simulation state is lost.
    /// A rejected size leaves the solver untouched.
    pub fn set_size(&mut self, nx: usize, ny: usize) -> Result<&mut Self, SolverError> {
        if nx == 0 || ny == 0 {
            log::warn!("rejecting fluid grid size {nx}x{ny}");
            return Err(SolverError::InvalidSize { nx, ny });
        }
        let grid = Grid::new(nx, ny);
        log::debug!("allocating fluid grid {nx}x{ny} ({} cells)", grid.num_cells());
        self.state = Some(FluidState::new(grid));
        self.stats = FlowStats::default();
        Ok(self)
    }

    /// Zero all fields and pending forces without reallocating.
    pub fn reset(&mut self) -> &mut Self {
        if let Some(state) = self.state.as_mut() {
            state.reset();
        }
        self.stats = FlowStats::default();
        self
    }

    pub fn is_inited(&self) -> bool {
        self.state.is_some()
    }

    fn live(&self) -> &FluidState {
        match &self.state {
            Some(state) => state,
            None => panic!("fluid solver used before setup()"),
        }
    }

    fn live_mut(&mut self) -> &mut FluidState {
        match &mut self.state {
            Some(state) => state,
            None => panic!("fluid solver used before setup()"),
        }
    }

    // ---- configuration ----

    pub fn set_visc(&mut self, visc: f32) -> &mut Self {
        self.params.visc = visc;
        self
    }

    pub fn set_color_diffusion(&mut self, diff: f32) -> &mut Self {
        self.params.color_diffusion = diff;
        self
    }

    pub fn set_fade_speed(&mut self, fade_speed: f32) -> &mut Self {
        self.params.fade_speed = fade_speed;
        self
    }

    pub fn set_solver_iterations(&mut self, iterations: usize) -> &mut Self {
        self.params.solver_iterations = iterations;
        self
    }

    pub fn set_delta_t(&mut self, dt: f32) -> &mut Self {
        self.params.dt = dt;
        self
    }

    pub fn enable_rgb(&mut self, rgb: bool) -> &mut Self {
        self.params.rgb = rgb;
        self
    }

    pub fn enable_vorticity_confinement(&mut self, enabled: bool) -> &mut Self {
        self.params.vorticity_confinement = enabled;
        self
    }

    pub fn set_wrap(&mut self, wrap_x: bool, wrap_y: bool) -> &mut Self {
        self.params.wrap = Wrap::new(wrap_x, wrap_y);
        self
    }

    /// Replace every parameter at once. Grid size is unaffected.
    pub fn set_params(&mut self, params: SolverParams) -> &mut Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn visc(&self) -> f32 {
        self.params.visc
    }

    pub fn color_diffusion(&self) -> f32 {
        self.params.color_diffusion
    }

    pub fn fade_speed(&self) -> f32 {
        self.params.fade_speed
    }

    pub fn solver_iterations(&self) -> usize {
        self.params.solver_iterations
    }

    pub fn delta_t(&self) -> f32 {
        self.params.dt
    }

    pub fn rgb_enabled(&self) -> bool {
        self.params.rgb
    }

    pub fn vorticity_confinement_enabled(&self) -> bool {
        self.params.vorticity_confinement
    }

    pub fn wrap(&self) -> Wrap {
        self.params.wrap
    }

    /// Interior width NX (0 before setup).
    pub fn width(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.grid.nx)
    }

    /// Interior height NY (0 before setup).
    pub fn height(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.grid.ny)
    }

    /// Stored cells including the boundary ring (0 before setup).
    pub fn num_cells(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.grid.num_cells())
    }

    /// A zeroed buffer sized for one scalar field, for staging external data.
    pub fn alloc_field(&self) -> Vec<f32> {
        vec![0.0; self.live().grid.num_cells()]
    }

    // ---- statistics from the last update ----

    pub fn stats(&self) -> FlowStats {
        self.stats
    }

    pub fn avg_density(&self) -> f32 {
        self.stats.avg_density
    }

    pub fn uniformity(&self) -> f32 {
        self.stats.uniformity
    }

    pub fn avg_speed(&self) -> f32 {
        self.stats.avg_speed
    }

    // ---- forcing ----

    /// Accumulate a velocity impulse at cell (i, j). No bounds check: the
    /// caller must pass 0 <= i <= NX+1, 0 <= j <= NY+1.
    pub fn add_force_at_cell(&mut self, i: usize, j: usize, vx: f32, vy: f32) {
        let state = self.live_mut();
        let grid = state.grid;
        let ii = grid.idx(i, j);
        state.uv.old_mut()[ii] += Vec2::new(vx * grid.nx as f32, vy * grid.ny as f32);
    }

    /// Accumulate a velocity impulse at normalized (x, y) in [0,1]^2.
    /// Positions that map outside the stored grid are ignored.
    pub fn add_force_at_pos(&mut self, x: f32, y: f32, vx: f32, vy: f32) {
        if let Some((i, j)) = self.cell_for_force(x, y) {
            self.add_force_at_cell(i, j, vx, vy);
        }
    }

    /// Accumulate color at cell (i, j). Only R is touched in monochrome mode.
    pub fn add_color_at_cell(&mut self, i: usize, j: usize, r: f32, g: f32, b: f32) {
        let rgb = self.params.rgb;
        let state = self.live_mut();
        let ii = state.grid.idx(i, j);
        state.r.old_mut()[ii] += r;
        if rgb {
            state.g.old_mut()[ii] += g;
            state.b.old_mut()[ii] += b;
        }
    }

    pub fn add_color_at_cell_rgb(&mut self, i: usize, j: usize, rgb: [f32; 3]) {
        self.add_color_at_cell(i, j, rgb[0], rgb[1], rgb[2]);
    }

    /// Accumulate color at normalized (x, y); out-of-range positions are ignored.
    pub fn add_color_at_pos(&mut self, x: f32, y: f32, r: f32, g: f32, b: f32) {
        if let Some((i, j)) = self.cell_for_force(x, y) {
            self.add_color_at_cell(i, j, r, g, b);
        }
    }

    /// Cell for a normalized forcing position: (x*NX + 1, y*NY + 1),
    /// rejected if it falls outside [0, NX+1] x [0, NY+1].
    fn cell_for_force(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let grid = self.live().grid;
        let i = (x * grid.nx as f32 + 1.0) as i64;
        let j = (y * grid.ny as f32 + 1.0) as i64;
        let in_range = |v: i64, n: usize| v >= 0 && v <= n as i64 + 1;
        if in_range(i, grid.nx) && in_range(j, grid.ny) {
            Some((i as usize, j as usize))
        } else {
            None
        }
    }

    /// Fill the active color channels of every cell with uniform noise in [0, 1).
    pub fn randomize_color(&mut self) {
        self.randomize_color_with(&mut rand::thread_rng());
    }

    pub fn randomize_color_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let rgb = self.params.rgb;
        let state = self.live_mut();
        for v in state.r.cur_mut() {
            *v = rng.gen::<f32>();
        }
        if rgb {
            for v in state.g.cur_mut() {
                *v = rng.gen::<f32>();
            }
            for v in state.b.cur_mut() {
                *v = rng.gen::<f32>();
            }
        }
    }

    // ---- reading ----

    /// Index of interior cell (i, j), clamped to [1, NX] x [1, NY].
    pub fn index_for_cell_position(&self, i: i32, j: i32) -> usize {
        let grid = self.live().grid;
        let i = i.clamp(1, grid.nx as i32) as usize;
        let j = j.clamp(1, grid.ny as i32) as usize;
        grid.idx(i, j)
    }

    /// Index for normalized (x, y), mapped over the stored width NX+2 and
    /// clamped to the interior.
    pub fn index_for_normalized_position(&self, x: f32, y: f32) -> usize {
        let grid = self.live().grid;
        let i = (x * grid.stride() as f32).floor() as i32;
        let j = (y * (grid.ny + 2) as f32).floor() as i32;
        self.index_for_cell_position(i, j)
    }

    /// Velocity at a raw cell index, in normalized units. No bounds clamping.
    pub fn velocity_at_index(&self, index: usize) -> Vec2 {
        let state = self.live();
        let grid = state.grid;
        state.uv.cur()[index] * Vec2::new(1.0 / grid.nx as f32, 1.0 / grid.ny as f32)
    }

    /// Color at a raw cell index. Monochrome mode replicates R.
    pub fn color_at_index(&self, index: usize) -> Vec3 {
        let state = self.live();
        let r = state.r.cur()[index];
        if self.params.rgb {
            Vec3::new(r, state.g.cur()[index], state.b.cur()[index])
        } else {
            Vec3::splat(r)
        }
    }

    /// Cell index with (i, j) clamped to [0, NX+1] x [0, NY+1].
    fn clamped_cell_index(&self, i: i32, j: i32) -> usize {
        let grid = self.live().grid;
        let i = i.clamp(0, grid.nx as i32 + 1) as usize;
        let j = j.clamp(0, grid.ny as i32 + 1) as usize;
        grid.idx(i, j)
    }

    /// Normalized (x, y) scaled over the stored grid, then clamped like a cell query.
    fn pos_index(&self, x: f32, y: f32) -> usize {
        let grid = self.live().grid;
        let i = (x * grid.stride() as f32) as i32;
        let j = (y * (grid.ny + 2) as f32) as i32;
        self.clamped_cell_index(i, j)
    }

    pub fn velocity_at_cell(&self, i: i32, j: i32) -> Vec2 {
        self.velocity_at_index(self.clamped_cell_index(i, j))
    }

    pub fn color_at_cell(&self, i: i32, j: i32) -> Vec3 {
        self.color_at_index(self.clamped_cell_index(i, j))
    }

    pub fn velocity_at_pos(&self, x: f32, y: f32) -> Vec2 {
        self.velocity_at_index(self.pos_index(x, y))
    }

    pub fn color_at_pos(&self, x: f32, y: f32) -> Vec3 {
        self.color_at_index(self.pos_index(x, y))
    }

    // ---- simulation ----

    /// Advance the simulation by one timestep.
    ///
    /// Stages: source injection, vorticity confinement (optional), velocity
    /// diffusion + projection, velocity advection + projection, then color
    /// diffusion, advection and fade. Pending forces are cleared afterwards.
    pub fn update(&mut self) {
        let params = self.params;
        let Some(state) = self.state.as_mut() else {
            log::warn!("fluid update() called before setup(); ignoring");
            return;
        };
        let grid = state.grid;
        let wrap = params.wrap;
        let iter = params.solver_iterations;
        let dt = params.dt;

        // 1. Inject accumulated forces and color
        {
            let (uv, uv0) = state.uv.split_mut();
            add_source(uv, uv0);
            set_bnd_velocity(uv, &grid, wrap);
        }
        add_color_source(&mut state.r, &grid, wrap);
        if params.rgb {
            add_color_source(&mut state.g, &grid, wrap);
            add_color_source(&mut state.b, &grid, wrap);
        }

        // 2. Vorticity confinement
        if params.vorticity_confinement {
            vorticity_confinement(
                state.uv.cur_mut(),
                &mut state.curl,
                &mut state.scratch_a,
                VORTICITY_CONFINEMENT,
                dt,
                &grid,
                wrap,
            );
        }

        // 3. Diffuse velocity, then project
        state.uv.swap();
        {
            let (uv, uv0) = state.uv.split_mut();
            diffuse_velocity(uv, uv0, params.visc, dt, iter, &grid, wrap);
        }
        project(state.uv.cur_mut(), &mut state.scratch_a, &mut state.scratch_b, iter, &grid, wrap);

        // 4. Advect velocity, then project
        state.uv.swap();
        {
            let (uv, uv0) = state.uv.split_mut();
            advect_velocity(uv, uv0, dt, &grid, wrap);
        }
        project(state.uv.cur_mut(), &mut state.scratch_a, &mut state.scratch_b, iter, &grid, wrap);

        // 5. Diffuse, advect and fade color
        let uv = state.uv.cur();
        process_color(&mut state.r, uv, &params, &grid);
        if params.rgb {
            process_color(&mut state.g, uv, &params, &grid);
            process_color(&mut state.b, uv, &params, &grid);
        }

        // Clear the forcing window for the next frame
        state.uv.old_mut().fill(Vec2::ZERO);
        state.r.old_mut().fill(0.0);
        if params.rgb {
            state.g.old_mut().fill(0.0);
            state.b.old_mut().fill(0.0);
        }

        self.stats = FlowStats::measure(state);
    }
}

/// Add the pending color impulses of one channel into its current field.
fn add_color_source(channel: &mut DoubleBuffer<f32>, grid: &Grid, wrap: Wrap) {
    let (x, x0) = channel.split_mut();
    add_source(x, x0);
    set_bnd(FieldType::Scalar, x, grid, wrap);
}

/// Color stage for one channel: optional diffusion, advection along `uv`, fade.
fn process_color(channel: &mut DoubleBuffer<f32>, uv: &[Vec2], params: &SolverParams, grid: &Grid) {
    let wrap = params.wrap;
    channel.swap();
    // Color diffusion is the most expensive stage; skip it when disabled.
    if params.color_diffusion != 0.0 && params.dt != 0.0 {
        let (x, x0) = channel.split_mut();
        diffuse(FieldType::Scalar, x, x0, params.color_diffusion, params.dt, params.solver_iterations, grid, wrap);
        channel.swap();
    }
    let (d, d0) = channel.split_mut();
    advect(FieldType::Scalar, d, d0, uv, params.dt, grid, wrap);
    fade(d, 1.0 - params.fade_speed);
    set_bnd(FieldType::Scalar, d, grid, wrap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn solver(n: usize) -> FluidSolver {
        let mut solver = FluidSolver::new();
        solver.setup(n, n).unwrap();
        solver
    }

    #[test]
    fn test_new_solver_is_inert() {
        let solver = FluidSolver::new();
        assert!(!solver.is_inited());
        assert_eq!(solver.width(), 0);
        assert_eq!(solver.num_cells(), 0);
    }

    #[test]
    fn test_update_before_setup_is_ignored() {
        let mut solver = FluidSolver::new();
        solver.update();
        assert!(!solver.is_inited());
        assert_eq!(solver.stats(), FlowStats::default());
    }

    #[test]
    #[should_panic(expected = "before setup")]
    fn test_forcing_before_setup_panics() {
        let mut solver = FluidSolver::new();
        solver.add_force_at_cell(1, 1, 1.0, 0.0);
    }

    #[test]
    fn test_setup_rejects_empty_grid() {
        let mut solver = FluidSolver::new();
        assert_eq!(solver.setup(0, 10).err(), Some(SolverError::InvalidSize { nx: 0, ny: 10 }));
        assert!(!solver.is_inited());

        solver.setup(8, 8).unwrap();
        assert!(solver.set_size(8, 0).is_err());
        assert_eq!(solver.width(), 8, "rejected resize should keep the old grid");
    }

    #[test]
    fn test_set_size_reallocates_and_resets() {
        let mut solver = solver(8);
        solver.add_color_at_cell(3, 3, 1.0, 1.0, 1.0);
        solver.update();
        solver.set_size(20, 10).unwrap();
        assert_eq!(solver.width(), 20);
        assert_eq!(solver.height(), 10);
        assert_eq!(solver.num_cells(), 22 * 12);
        assert_eq!(solver.alloc_field().len(), 22 * 12);
        assert_eq!(solver.color_at_cell(3, 3), Vec3::ZERO);
    }

    #[test]
    fn test_setters_chain() {
        let mut solver = FluidSolver::new();
        solver
            .setup(16, 16)
            .unwrap()
            .set_visc(0.001)
            .set_color_diffusion(0.0002)
            .set_fade_speed(0.1)
            .set_solver_iterations(5)
            .set_delta_t(0.02)
            .enable_rgb(false)
            .enable_vorticity_confinement(true)
            .set_wrap(true, false);
        assert_eq!(solver.visc(), 0.001);
        assert_eq!(solver.color_diffusion(), 0.0002);
        assert_eq!(solver.fade_speed(), 0.1);
        assert_eq!(solver.solver_iterations(), 5);
        assert_eq!(solver.delta_t(), 0.02);
        assert!(!solver.rgb_enabled());
        assert!(solver.vorticity_confinement_enabled());
        assert_eq!(solver.wrap(), Wrap::new(true, false));
    }

    #[test]
    fn test_force_at_cell_scales_by_resolution() {
        let mut solver = FluidSolver::new();
        solver.setup(10, 20).unwrap();
        solver.add_force_at_cell(4, 5, 0.5, 0.25);
        let state = solver.live();
        let ii = state.grid.idx(4, 5);
        assert_eq!(state.uv.old()[ii], Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_force_at_pos_maps_and_ignores_out_of_range() {
        let mut solver = solver(10);
        solver.add_force_at_pos(0.5, 0.5, 1.0, 0.0);
        let ii = solver.live().grid.idx(6, 6);
        assert_eq!(solver.live().uv.old()[ii], Vec2::new(10.0, 0.0));

        solver.add_force_at_pos(1.5, 0.5, 1.0, 0.0);
        solver.add_force_at_pos(0.5, -0.5, 1.0, 0.0);
        let touched = solver.live().uv.old().iter().filter(|v| **v != Vec2::ZERO).count();
        assert_eq!(touched, 1, "out-of-range positions should be ignored");
    }

    #[test]
    fn test_monochrome_color_touches_only_red() {
        let mut solver = solver(6);
        solver.enable_rgb(false);
        solver.add_color_at_cell(2, 2, 0.7, 0.3, 0.1);
        let state = solver.live();
        let ii = state.grid.idx(2, 2);
        assert_eq!(state.r.old()[ii], 0.7);
        assert_eq!(state.g.old()[ii], 0.0);
        assert_eq!(state.b.old()[ii], 0.0);
    }

    #[test]
    fn test_monochrome_read_replicates_red() {
        let mut solver = solver(6);
        solver.set_fade_speed(0.0).enable_rgb(false);
        solver.add_color_at_cell(2, 2, 0.6, 0.0, 0.0);
        solver.update();
        assert_eq!(solver.color_at_cell(2, 2), Vec3::splat(0.6));
    }

    #[test]
    fn test_monochrome_skips_green_and_blue() {
        let mut solver = solver(6);
        solver.randomize_color_with(&mut StdRng::seed_from_u64(3));
        let g_before = solver.live().g.cur().to_vec();
        solver.enable_rgb(false);
        solver.update();
        assert_eq!(solver.live().g.cur(), g_before.as_slice(), "G must not be updated in monochrome mode");
    }

    #[test]
    fn test_randomize_color_in_unit_range() {
        let mut solver = solver(8);
        solver.randomize_color_with(&mut StdRng::seed_from_u64(7));
        let state = solver.live();
        for ch in [&state.r, &state.g, &state.b] {
            assert!(ch.cur().iter().all(|v| (0.0..1.0).contains(v)));
            assert!(ch.cur().iter().any(|v| *v > 0.0));
        }
    }

    #[test]
    fn test_update_clears_pending_forces() {
        let mut solver = solver(8);
        solver.add_force_at_cell(4, 4, 1.0, 1.0);
        solver.add_color_at_cell(4, 4, 1.0, 1.0, 1.0);
        solver.update();
        let state = solver.live();
        assert!(state.uv.old().iter().all(|v| *v == Vec2::ZERO));
        assert!(state.r.old().iter().all(|v| *v == 0.0));
        assert!(state.g.old().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_vorticity_confinement_changes_flow() {
        let run = |confine: bool| {
            let mut s = solver(24);
            s.enable_vorticity_confinement(confine);
            s.add_force_at_cell(12, 12, 0.2, 0.0);
            s.add_force_at_cell(12, 14, -0.2, 0.0);
            for _ in 0..3 {
                s.update();
            }
            s.velocity_at_cell(12, 13)
        };
        let plain = run(false);
        let confined = run(true);
        assert!((plain - confined).length() > 0.0, "confinement should alter a sheared flow");
        assert!(confined.is_finite());
    }

    #[test]
    fn test_index_helpers_clamp_to_interior() {
        let solver = solver(10);
        let grid = solver.live().grid;
        assert_eq!(solver.index_for_cell_position(-3, 50), grid.idx(1, 10));
        assert_eq!(solver.index_for_cell_position(4, 5), grid.idx(4, 5));
        assert_eq!(solver.index_for_normalized_position(0.5, 0.5), grid.idx(6, 6));
        assert_eq!(solver.index_for_normalized_position(0.0, 1.0), grid.idx(1, 10));
    }

    #[test]
    fn test_cell_reads_clamp_to_ring() {
        let mut solver = solver(4);
        solver.set_fade_speed(0.0);
        solver.add_color_at_cell(4, 4, 0.5, 0.5, 0.5);
        solver.update();
        // Clamped to the ring corner (5, 5), which averages copies of (4, 4).
        assert_eq!(solver.color_at_cell(99, 99), solver.color_at_cell(5, 5));
        assert!((solver.color_at_cell(99, 99).x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_stats_follow_update() {
        let mut solver = solver(8);
        solver.set_fade_speed(0.0);
        solver.add_color_at_cell(4, 4, 1.0, 0.0, 0.0);
        solver.update();
        assert!((solver.avg_density() - 1.0 / 64.0).abs() < 1e-6);
        assert!(solver.uniformity() < 1.0);
        assert_eq!(solver.avg_speed(), 0.0);
    }
}
