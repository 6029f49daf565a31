use super::mdp::{Discrete, Mdp, StateKind};
use super::transitions::TransitionRow;
use crate::error::{MdpError, Result};

/// Fully materialised finite MDP.
///
/// Every model builder (the exact grid model, the sampled estimate) hands
/// the solver one of these, so shapes are checked once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularMdp {
    n_s: usize,
    n_a: usize,
    gamma: f64,
    kinds: Vec<StateKind>,
    states: Vec<Discrete>,
    valid_actions: Vec<Vec<Discrete>>,
    rows: Vec<Vec<TransitionRow>>,
}

impl TabularMdp {
    /// `rows[s][a]` holds the outcome distribution of action `a` in state `s`.
    pub fn new(
        n_s: usize,
        n_a: usize,
        gamma: f64,
        kinds: Vec<StateKind>,
        valid_actions: Vec<Vec<Discrete>>,
        rows: Vec<Vec<TransitionRow>>,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&gamma) {
            return Err(MdpError::InvalidConfiguration(format!(
                "discount must lie in [0, 1), got {gamma}"
            )));
        }

        check_len("kinds", n_s, kinds.len())?;
        check_len("valid_actions", n_s, valid_actions.len())?;
        check_len("transition rows", n_s, rows.len())?;

        for (s, (acts, row)) in valid_actions.iter().zip(&rows).enumerate() {
            check_len(&format!("transition rows of state {s}"), n_a, row.len())?;

            if let Some(&a) = acts.iter().find(|&&a| a >= n_a) {
                return Err(MdpError::ActionOutOfRange {
                    what: format!("valid actions of state {s}"),
                    action: a,
                    n_a,
                });
            }

            for (a, r) in row.iter().enumerate() {
                if let Some(t) = r.iter().find(|t| t.next_state >= n_s) {
                    return Err(MdpError::StateOutOfRange {
                        what: format!("transitions of ({s}, {a})"),
                        state: t.next_state,
                        n_s,
                    });
                }
            }

            if kinds[s] != StateKind::Blocked {
                if let Some(&a) = acts.iter().find(|&&a| row[a].is_empty()) {
                    return Err(MdpError::EmptyRow { state: s, action: a });
                }
            }
        }

        let states = kinds
            .iter()
            .enumerate()
            .filter(|(_, &k)| k != StateKind::Blocked)
            .map(|(s, _)| s)
            .collect();

        Ok(Self {
            n_s,
            n_a,
            gamma,
            kinds,
            states,
            valid_actions,
            rows,
        })
    }

    pub fn kinds(&self) -> &[StateKind] {
        &self.kinds
    }
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(MdpError::ShapeMismatch {
            what: what.to_string(),
            expected,
            actual,
        });
    }

    Ok(())
}

impl Mdp for TabularMdp {
    fn n_s(&self) -> usize {
        self.n_s
    }

    fn n_a(&self) -> usize {
        self.n_a
    }

    fn states(&self) -> &[Discrete] {
        &self.states
    }

    fn kind(&self, s: Discrete) -> StateKind {
        self.kinds[s]
    }

    fn valid_actions(&self, s: Discrete) -> &[Discrete] {
        &self.valid_actions[s]
    }

    fn transitions(&self, s: Discrete, a: Discrete) -> &TransitionRow {
        &self.rows[s][a]
    }

    fn gamma(&self) -> f64 {
        self.gamma
    }
}
