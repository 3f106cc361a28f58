use super::boundary::Wrap;

/// Default interior grid width.
pub const DEFAULT_NX: usize = 100;
/// Default interior grid height.
pub const DEFAULT_NY: usize = 100;
/// 25 steps per second.
pub const DEFAULT_DT: f32 = 0.04;
pub const DEFAULT_VISC: f32 = 0.0001;
pub const DEFAULT_COLOR_DIFFUSION: f32 = 0.0;
pub const DEFAULT_FADE_SPEED: f32 = 0.03;
pub const DEFAULT_SOLVER_ITERATIONS: usize = 10;

/// Solver parameters for the fluid simulation.
///
/// Every field is applied on the next `update()`; none of them reallocate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    pub dt: f32,
    pub visc: f32,
    pub color_diffusion: f32,
    pub fade_speed: f32,
    pub solver_iterations: usize,
    /// Update G and B alongside R. When false only R is simulated.
    pub rgb: bool,
    pub vorticity_confinement: bool,
    pub wrap: Wrap,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            visc: DEFAULT_VISC,
            color_diffusion: DEFAULT_COLOR_DIFFUSION,
            fade_speed: DEFAULT_FADE_SPEED,
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
            rgb: true,
            vorticity_confinement: false,
            wrap: Wrap::NONE,
        }
    }
}

impl SolverParams {
    /// Pure transport: no viscosity, no color diffusion, no fade.
    pub fn inviscid() -> Self {
        Self {
            visc: 0.0,
            color_diffusion: 0.0,
            fade_speed: 0.0,
            ..Self::default()
        }
    }
}
