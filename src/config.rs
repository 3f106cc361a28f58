use std::path::Path;

use serde::Deserialize;

use crate::solver::{
    SolverParams, Wrap, DEFAULT_COLOR_DIFFUSION, DEFAULT_DT, DEFAULT_FADE_SPEED, DEFAULT_NX, DEFAULT_NY,
    DEFAULT_SOLVER_ITERATIONS, DEFAULT_VISC,
};

pub const CONFIG_FILE: &str = "gridfluid.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub physics: PhysicsConfig,
    pub run: RunConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub dt: f32,
    pub visc: f32,
    pub color_diffusion: f32,
    pub fade_speed: f32,
    pub solver_iterations: usize,
    pub rgb: bool,
    pub vorticity_confinement: bool,
    pub wrap_x: bool,
    pub wrap_y: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub steps: usize,
    /// Log diagnostics every N steps; 0 disables.
    pub log_every: usize,
    pub seed_random_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            physics: PhysicsConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_NX,
            height: DEFAULT_NY,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            visc: DEFAULT_VISC,
            color_diffusion: DEFAULT_COLOR_DIFFUSION,
            fade_speed: DEFAULT_FADE_SPEED,
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
            rgb: true,
            vorticity_confinement: false,
            wrap_x: false,
            wrap_y: false,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 250,
            log_every: 25,
            seed_random_color: false,
        }
    }
}

impl From<&PhysicsConfig> for SolverParams {
    fn from(p: &PhysicsConfig) -> Self {
        Self {
            dt: p.dt,
            visc: p.visc,
            color_diffusion: p.color_diffusion,
            fade_speed: p.fade_speed,
            solver_iterations: p.solver_iterations,
            rgb: p.rgb,
            vorticity_confinement: p.vorticity_confinement,
            wrap: Wrap::new(p.wrap_x, p.wrap_y),
        }
    }
}

pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Load `gridfluid.yaml` from the working directory, falling back to
/// defaults when it is missing or unreadable.
pub fn load() -> Config {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        return Config::default();
    }
    match load_from(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("{CONFIG_FILE}: {e}; using defaults");
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.grid.width, 100);
        assert_eq!(cfg.grid.height, 100);
        assert_eq!(cfg.physics.dt, 0.04);
        assert_eq!(cfg.physics.visc, 0.0001);
        assert_eq!(cfg.physics.color_diffusion, 0.0);
        assert_eq!(cfg.physics.fade_speed, 0.03);
        assert_eq!(cfg.physics.solver_iterations, 10);
        assert!(cfg.physics.rgb);
        assert!(!cfg.physics.vorticity_confinement);
        assert!(!cfg.physics.wrap_x && !cfg.physics.wrap_y);
        assert_eq!(cfg.run.steps, 250);
        assert_eq!(cfg.run.log_every, 25);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "physics:\n  visc: 0.01\nrun:\n  steps: 10\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.physics.visc, 0.01);
        assert_eq!(cfg.physics.fade_speed, 0.03); // default
        assert_eq!(cfg.run.steps, 10);
        assert_eq!(cfg.grid.width, 100); // default
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
grid:
  width: 64
  height: 48
physics:
  dt: 0.02
  visc: 0.0005
  color_diffusion: 0.0001
  fade_speed: 0.01
  solver_iterations: 20
  rgb: false
  vorticity_confinement: true
  wrap_x: true
  wrap_y: false
run:
  steps: 500
  log_every: 50
  seed_random_color: true
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.grid.width, 64);
        assert_eq!(cfg.grid.height, 48);
        assert_eq!(cfg.run.steps, 500);
        assert_eq!(cfg.run.log_every, 50);
        assert!(cfg.run.seed_random_color);

        let params = SolverParams::from(&cfg.physics);
        assert_eq!(params.dt, 0.02);
        assert_eq!(params.visc, 0.0005);
        assert_eq!(params.color_diffusion, 0.0001);
        assert_eq!(params.fade_speed, 0.01);
        assert_eq!(params.solver_iterations, 20);
        assert!(!params.rgb);
        assert!(params.vorticity_confinement);
        assert_eq!(params.wrap, Wrap::new(true, false));
    }

    #[test]
    fn test_default_physics_matches_solver_defaults() {
        assert_eq!(SolverParams::from(&PhysicsConfig::default()), SolverParams::default());
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let err = load_from(Path::new("definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_malformed_yaml_is_parse_error() {
        let path = std::env::temp_dir().join(format!("gridfluid-bad-{}.yaml", std::process::id()));
        std::fs::write(&path, "grid: [not, a, map").unwrap();
        let err = load_from(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        // When no gridfluid.yaml exists, load() should return defaults
        let cfg = load();
        assert_eq!(cfg.physics.visc, 0.0001);
        assert_eq!(cfg.grid.width, 100);
    }
}
