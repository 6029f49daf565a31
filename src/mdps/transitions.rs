use super::mdp::Discrete;
use crate::error::{MdpError, Result};
use ndarray::Array1;

/// Allowed deviation of a row's total probability from 1.
pub const ROW_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next_state: Discrete,
    pub probability: f64,
    pub reward: f64,
}

/// Sparse outcome distribution of one `(state, action)` pair.
///
/// A non-empty row always sums to 1 within [`ROW_TOLERANCE`] and holds each
/// next state at most once. The empty row stands for a pair that has no
/// known outcomes and contributes nothing to a backup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionRow {
    outcomes: Vec<Transition>,
}

impl TransitionRow {
    /// Self-loop with probability 1 and zero reward.
    pub fn absorbing(s: Discrete) -> Self {
        Self::deterministic(s, 0.)
    }

    pub fn deterministic(next_state: Discrete, reward: f64) -> Self {
        Self {
            outcomes: vec![Transition {
                next_state,
                probability: 1.,
                reward,
            }],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.outcomes.iter()
    }

    pub fn as_slice(&self) -> &[Transition] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, next_state: Discrete) -> Option<&Transition> {
        self.outcomes.iter().find(|t| t.next_state == next_state)
    }

    pub fn probability(&self, next_state: Discrete) -> f64 {
        self.get(next_state).map_or(0., |t| t.probability)
    }

    pub fn total_probability(&self) -> f64 {
        self.outcomes.iter().map(|t| t.probability).sum()
    }

    /// One-step lookahead `Σ p · (r + γ·V(s'))`, summed in insertion order.
    pub fn backup(&self, gamma: f64, v: &Array1<f64>) -> f64 {
        self.outcomes
            .iter()
            .fold(0., |acc, t| acc + t.probability * (t.reward + gamma * v[t.next_state]))
    }
}

/// Accumulates outcomes into a [`TransitionRow`].
///
/// Mass landing on the same next state is summed and the reward is
/// overwritten, as rewards depend only on the `(s, s')` pair. Zero-mass
/// outcomes are dropped.
#[derive(Debug, Clone, Default)]
pub struct RowBuilder {
    outcomes: Vec<Transition>,
}

impl RowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, next_state: Discrete, probability: f64, reward: f64) -> &mut Self {
        if probability == 0. {
            return self;
        }

        match self
            .outcomes
            .iter_mut()
            .find(|t| t.next_state == next_state)
        {
            Some(t) => {
                t.probability += probability;
                t.reward = reward;
            }
            None => self.outcomes.push(Transition {
                next_state,
                probability,
                reward,
            }),
        }

        self
    }

    pub fn build(self) -> Result<TransitionRow> {
        if let Some(t) = self
            .outcomes
            .iter()
            .find(|t| !t.probability.is_finite() || t.probability < 0. || t.probability > 1. + ROW_TOLERANCE)
        {
            return Err(MdpError::InvalidProbability {
                next_state: t.next_state,
                probability: t.probability,
            });
        }

        let sum: f64 = self.outcomes.iter().map(|t| t.probability).sum();
        if (sum - 1.).abs() > ROW_TOLERANCE {
            return Err(MdpError::UnnormalizedRow { sum });
        }

        Ok(TransitionRow {
            outcomes: self.outcomes,
        })
    }
}
