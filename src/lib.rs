//! Real-time 2D stable-fluids solver: velocity plus up to three color
//! channels advected and diffused over a fixed grid with a boundary ring.

pub mod config;
pub mod solver;
pub mod state;

pub use solver::{FlowStats, FluidSolver, SolverError, SolverParams, Wrap};
