use std::f32::consts::TAU;

use gridfluid::{config, FlowStats, FluidSolver, SolverError, SolverParams};

struct Defaults;

impl Defaults {
    /// Emitter orbit radius in normalized units.
    const EMITTER_RADIUS: f32 = 0.25;
    /// Emitter revolutions per simulated second.
    const EMITTER_SPIN: f32 = 0.2;
    /// Tangential push applied each step, normalized units.
    const EMITTER_FORCE: f32 = 0.002;
    const EMITTER_COLOR: f32 = 0.6;
}

/// Hue wheel in [0, 1) -> RGB, for tinting the injected dye.
fn hue_to_rgb(hue: f32) -> [f32; 3] {
    let channel = |offset: f32| {
        let h = (hue + offset).rem_euclid(1.0) * 6.0;
        ((h - 3.0).abs() - 1.0).clamp(0.0, 1.0)
    };
    [channel(0.0), channel(2.0 / 3.0), channel(1.0 / 3.0)]
}

fn log_stats(step: usize, stats: &FlowStats) {
    log::info!(
        "step {:>5}  density={:.4}  uniformity={:.4}  speed={:.5}",
        step,
        stats.avg_density,
        stats.uniformity,
        stats.avg_speed
    );
}

fn main() -> Result<(), SolverError> {
    env_logger::init();

    let cfg = config::load();
    let params = SolverParams::from(&cfg.physics);
    let mut solver = FluidSolver::with_params(params);
    solver.setup(cfg.grid.width, cfg.grid.height)?;
    log::info!(
        "gridfluid {}x{} dt={} visc={} fade={} iterations={}",
        solver.width(),
        solver.height(),
        params.dt,
        params.visc,
        params.fade_speed,
        params.solver_iterations
    );

    if cfg.run.seed_random_color {
        solver.randomize_color();
    }

    for step in 0..cfg.run.steps {
        let t = step as f32 * params.dt;
        let angle = t * Defaults::EMITTER_SPIN * TAU;
        let (sin, cos) = angle.sin_cos();
        let x = 0.5 + Defaults::EMITTER_RADIUS * cos;
        let y = 0.5 + Defaults::EMITTER_RADIUS * sin;

        solver.add_force_at_pos(x, y, -sin * Defaults::EMITTER_FORCE, cos * Defaults::EMITTER_FORCE);
        let [r, g, b] = hue_to_rgb(angle / TAU);
        let c = Defaults::EMITTER_COLOR;
        solver.add_color_at_pos(x, y, r * c, g * c, b * c);

        solver.update();

        if cfg.run.log_every > 0 && (step + 1) % cfg.run.log_every == 0 {
            log_stats(step + 1, &solver.stats());
        }
    }

    Ok(())
}
