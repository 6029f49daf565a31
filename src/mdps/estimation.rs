use super::mdp_simulator::{rollout, MdpSimulator, RandomPolicy};
use super::{Discrete, RowBuilder, StateKind, TabularMdp, TransitionRow};
use crate::config::EstimationConfig;
use crate::error::Result;
use tracing::info;

#[derive(Debug, Clone, Copy)]
struct Tally {
    next_state: Discrete,
    count: usize,
    reward_sum: f64,
}

/// Estimates a tabular model by running uniformly random episodes.
///
/// `P[s][a][s']` is the observed frequency of `s'` after `(s, a)` and
/// `R[s][a][s']` the mean reward seen on that transition. States reached by a
/// terminating step become absorbing terminals, states never seen are
/// excluded, and a state's valid actions are the ones tried from it.
pub fn estimate_mdp<S: MdpSimulator + ?Sized>(
    sim: &mut S,
    gamma: f64,
    config: &EstimationConfig,
) -> Result<TabularMdp> {
    let (n_s, n_a) = (sim.n_s(), sim.n_a());
    let mut tallies: Vec<Vec<Vec<Tally>>> = vec![vec![vec![]; n_a]; n_s];
    let mut seen = vec![false; n_s];
    let mut terminal = vec![false; n_s];
    let mut policy = RandomPolicy::new(n_a, config.seed);
    let mut samples = 0;

    for _ in 0..config.episodes {
        for e in rollout(sim, &mut policy, config.max_steps) {
            seen[e.s] = true;
            seen[e.s_next] = true;
            terminal[e.s_next] |= e.terminated;
            samples += 1;

            let cell = &mut tallies[e.s][e.a];
            match cell.iter_mut().find(|t| t.next_state == e.s_next) {
                Some(t) => {
                    t.count += 1;
                    t.reward_sum += e.r;
                }
                None => cell.push(Tally {
                    next_state: e.s_next,
                    count: 1,
                    reward_sum: e.r,
                }),
            }
        }
    }

    let mut kinds = Vec::with_capacity(n_s);
    let mut valid_actions = Vec::with_capacity(n_s);
    let mut rows = Vec::with_capacity(n_s);
    for s in 0..n_s {
        let kind = if terminal[s] {
            StateKind::Terminal
        } else if !seen[s] {
            StateKind::Blocked
        } else {
            StateKind::Normal
        };

        let (acts, row) = match kind {
            StateKind::Terminal => ((0..n_a).collect(), vec![TransitionRow::absorbing(s); n_a]),
            StateKind::Blocked => (vec![], vec![TransitionRow::absorbing(s); n_a]),
            StateKind::Normal => {
                let mut acts = vec![];
                let mut row = Vec::with_capacity(n_a);
                for (a, cell) in tallies[s].iter().enumerate() {
                    if cell.is_empty() {
                        row.push(TransitionRow::default());
                        continue;
                    }

                    let total: usize = cell.iter().map(|t| t.count).sum();
                    let mut b = RowBuilder::new();
                    for t in cell {
                        b.add(
                            t.next_state,
                            t.count as f64 / total as f64,
                            t.reward_sum / t.count as f64,
                        );
                    }
                    row.push(b.build()?);
                    acts.push(a);
                }
                (acts, row)
            }
        };

        kinds.push(kind);
        valid_actions.push(acts);
        rows.push(row);
    }

    info!(
        episodes = config.episodes,
        samples,
        states_seen = seen.iter().filter(|&&x| x).count(),
        "Estimated tabular model"
    );

    TabularMdp::new(n_s, n_a, gamma, kinds, valid_actions, rows)
}
