use crate::envs::logistics_grid::{Action, LogisticsGrid};
use crate::mdps::Discrete;
use itertools::Itertools;
use ndarray::Array1;

pub const BLOCKED: char = '█';
pub const GOAL: char = 'G';
pub const DEPOT: char = 'D';

/// One glyph per cell: blocked, goal, depot, or the arrow of the chosen action.
/// Cells the policy does not cover show `?`.
pub fn policy_grid(grid: &LogisticsGrid, policy: &[Discrete]) -> Vec<Vec<char>> {
    (0..grid.rows())
        .map(|r| {
            (0..grid.cols())
                .map(|c| {
                    let s = grid.to_state((r, c));
                    if grid.is_blocked(s) {
                        BLOCKED
                    } else if s == grid.customer() {
                        GOAL
                    } else if s == grid.depot() {
                        DEPOT
                    } else {
                        policy
                            .get(s)
                            .and_then(|&a| Action::from_index(a))
                            .map_or('?', Action::glyph)
                    }
                })
                .collect()
        })
        .collect()
}

pub fn render_policy(grid: &LogisticsGrid, policy: &[Discrete]) -> String {
    policy_grid(grid, policy)
        .iter()
        .map(|row| row.iter().join(" "))
        .join("\n")
}

pub fn render_values(grid: &LogisticsGrid, v: &Array1<f64>) -> String {
    (0..grid.rows())
        .map(|r| {
            (0..grid.cols())
                .map(|c| {
                    let s = grid.to_state((r, c));
                    if grid.is_blocked(s) {
                        format!("{:>7}", '#')
                    } else {
                        format!("{:>7.2}", v[s])
                    }
                })
                .join(" ")
        })
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::envs::logistics_grid::GridSpec;
    use crate::mdps::solvers::policy_iteration::policy_iteration;

    fn detour() -> LogisticsGrid {
        LogisticsGrid::new(GridSpec {
            rows: 2,
            cols: 3,
            depot: (0, 0),
            customer: (0, 2),
            blocked: vec![(0, 1)],
            slip_prob: 0.,
            ..GridSpec::default()
        })
        .unwrap()
    }

    #[test]
    fn renders_detour_around_the_wall() {
        let grid = detour();
        let ret = policy_iteration(grid.mdp(), &SolverConfig::default());

        insta::assert_snapshot!(render_policy(&grid, &ret.policy), @r###"
        D █ G
        → → ↑
        "###);
        assert_eq!(ret.policy[grid.depot()], Action::Down.index());
    }

    #[test]
    fn short_policy_renders_unknown_cells() {
        let grid = detour();
        let rows = policy_grid(&grid, &[Action::Down.index(); 4]);

        assert_eq!(rows[0], ['D', BLOCKED, GOAL]);
        assert_eq!(rows[1], ['↓', '?', '?']);
    }

    #[test]
    fn renders_values_with_blocked_cells() {
        let grid = detour();
        let ret = policy_iteration(grid.mdp(), &SolverConfig::default());
        let out = render_values(&grid, &ret.v);
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split_whitespace().collect::<Vec<_>>()[1..], ["#", "0.00"]);
        assert_eq!(
            lines[1].split_whitespace().collect::<Vec<_>>(),
            ["16.10", "18.00", "20.00"]
        );
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
    }
}
