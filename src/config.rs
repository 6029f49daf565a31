use crate::envs::logistics_grid::GridSpec;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Policy evaluation stops once a sweep changes no value by `theta` or more.
    pub theta: f64,
    /// Cap on policy evaluation sweeps.
    pub max_iter: usize,
    /// Cap on evaluate/improve rounds.
    pub max_outer_iter: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            theta: 1e-8,
            max_iter: 10_000,
            max_outer_iter: 1000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    pub episodes: usize,
    pub max_steps: usize,
    pub seed: u64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            episodes: 200,
            max_steps: 1000,
            seed: 2718,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub grid: GridSpec,
    pub solver: SolverConfig,
    pub estimation: EstimationConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: RunConfig =
            serde_json::from_str(r#"{ "grid": { "slip_prob": 0.2 }, "solver": { "theta": 1e-6 } }"#)
                .unwrap();

        assert_eq!(cfg.grid.slip_prob, 0.2);
        assert_eq!(cfg.grid.rows, 6);
        assert_eq!(cfg.solver.theta, 1e-6);
        assert_eq!(cfg.solver.max_outer_iter, 1000);
        assert_eq!(cfg.estimation, EstimationConfig::default());
    }
}
