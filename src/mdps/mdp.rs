use super::transitions::TransitionRow;
use serde::{Deserialize, Serialize};

/// Identifier of a state or an action.
pub type Discrete = usize;

/// How a state takes part in control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateKind {
    Normal,
    /// Impassable or otherwise excluded. Absorbing, never visited by control.
    Blocked,
    /// Absorbing goal.
    Terminal,
}

impl StateKind {
    pub fn is_absorbing(self) -> bool {
        !matches!(self, StateKind::Normal)
    }
}

/// Markov Decision Process - Sutton & Barto 2018.
///
/// Transition rows carry the reward of every outcome next to its probability,
/// so `P[s][a]` and `R[s][a]` always share the same key domain.
pub trait Mdp {
    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    /// States that take part in control, in ascending order.
    fn states(&self) -> &[Discrete];

    fn kind(&self, s: Discrete) -> StateKind;

    /// Actions permitted from `s`, in enumeration order. Empty for excluded states.
    fn valid_actions(&self, s: Discrete) -> &[Discrete];

    fn transitions(&self, s: Discrete, a: Discrete) -> &TransitionRow;

    fn gamma(&self) -> f64;

    fn is_terminal(&self, s: Discrete) -> bool {
        self.kind(s) == StateKind::Terminal
    }

    fn terminal_mask(&self) -> Vec<bool> {
        (0..self.n_s()).map(|s| self.is_terminal(s)).collect()
    }
}
