use logistics_mdp::*;

#[allow(dead_code)]
pub fn default_grid() -> LogisticsGrid {
    LogisticsGrid::new(GridSpec::default()).unwrap()
}

#[allow(dead_code)]
pub fn solve(grid: &LogisticsGrid) -> PolicyIterationResult {
    policy_iteration(grid.mdp(), &SolverConfig::default())
}

/// `Σ p · (r + γ·V(s'))` for action `a` in `s`.
#[allow(dead_code)]
pub fn lookahead<M: Mdp + ?Sized>(mdp: &M, v: &[f64], s: Discrete, a: Discrete) -> f64 {
    mdp.transitions(s, a)
        .iter()
        .map(|t| t.probability * (t.reward + mdp.gamma() * v[t.next_state]))
        .sum()
}
