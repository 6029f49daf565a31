pub mod estimation;
pub mod mdp;
pub mod mdp_simulator;
pub mod mdp_solver;
pub mod solvers;
pub mod tabular;
pub mod transitions;

pub use mdp::{Discrete, Mdp, StateKind};
pub use mdp_solver::MdpSolver;
pub use tabular::TabularMdp;
pub use transitions::{RowBuilder, Transition, TransitionRow};
