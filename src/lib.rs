//! Exact policy iteration for finite MDPs, with a stochastic delivery grid
//! world as the reference model.

pub mod config;
pub mod envs;
pub mod error;
pub mod mdps;
pub mod render;

pub use config::{EstimationConfig, RunConfig, SolverConfig};
pub use envs::logistics_grid::{Action, GridSpec, LogisticsGrid};
pub use error::{MdpError, Result};
pub use mdps::solvers::policy_iteration::{
    policy_iteration, PolicyIteration, PolicyIterationResult, Termination,
};
pub use mdps::{Discrete, Mdp, MdpSolver, StateKind, TabularMdp};
