use crate::mdps::Discrete;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MdpError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Shape mismatch: {what} has {actual} entries, expected {expected}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("State {state} in {what} is out of range (n_s = {n_s})")]
    StateOutOfRange {
        what: String,
        state: Discrete,
        n_s: usize,
    },

    #[error("Action {action} in {what} is out of range (n_a = {n_a})")]
    ActionOutOfRange {
        what: String,
        action: Discrete,
        n_a: usize,
    },

    #[error("Invalid probability {probability} for next state {next_state}")]
    InvalidProbability {
        next_state: Discrete,
        probability: f64,
    },

    #[error("Transition probabilities sum to {sum}, expected 1")]
    UnnormalizedRow { sum: f64 },

    #[error("No transitions for valid action {action} in state {state}")]
    EmptyRow { state: Discrete, action: Discrete },
}

pub type Result<T> = std::result::Result<T, MdpError>;
