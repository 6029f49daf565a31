use super::super::{Discrete, Mdp, MdpSolver};
use crate::config::SolverConfig;
use ndarray::{Array1, Array2};
use tracing::{debug, info, warn};

/// Action stored for states that have no valid actions. Never exercised.
pub const PLACEHOLDER_ACTION: Discrete = 0;

/// Outcome of iterative policy evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub v: Array1<f64>,
    pub sweeps: usize,
    /// Largest change seen in the last sweep.
    pub delta: f64,
    /// Whether the last sweep changed no value by `theta` or more.
    pub converged: bool,
}

/// Iterative policy evaluation - Sutton & Barto 2018, section 4.1.
///
/// Sweeps update `V` in place, so later states in a sweep already see the
/// values written earlier in it. Terminal states keep their initial 0.
///
/// # Panics
///
/// If `policy` holds fewer than `mdp.n_s()` entries.
pub fn policy_evaluation<M: Mdp + ?Sized>(
    mdp: &M,
    policy: &[Discrete],
    theta: f64,
    max_iter: usize,
) -> Evaluation {
    assert_eq!(
        policy.len(),
        mdp.n_s(),
        "policy must assign an action to every state"
    );

    let gamma = mdp.gamma();
    let mut v = Array1::<f64>::zeros(mdp.n_s());
    let mut delta = f64::INFINITY;
    let mut sweeps = 0;

    while sweeps < max_iter {
        delta = 0.;
        for &s in mdp.states() {
            if mdp.is_terminal(s) {
                continue;
            }

            let v_new = mdp.transitions(s, policy[s]).backup(gamma, &v);
            delta = delta.max((v[s] - v_new).abs());
            v[s] = v_new;
        }

        sweeps += 1;
        if delta < theta {
            break;
        }
    }

    Evaluation {
        v,
        sweeps,
        delta,
        converged: delta < theta,
    }
}

/// `Q[s][a]` for every valid action of every non-terminal state; zero elsewhere.
pub fn q_from_v<M: Mdp + ?Sized>(mdp: &M, v: &Array1<f64>) -> Array2<f64> {
    let gamma = mdp.gamma();
    let mut q = Array2::<f64>::zeros((mdp.n_s(), mdp.n_a()));

    for &s in mdp.states() {
        if mdp.is_terminal(s) {
            continue;
        }

        for &a in mdp.valid_actions(s) {
            q[[s, a]] = mdp.transitions(s, a).backup(gamma, v);
        }
    }

    q
}

/// Greedy policy by one-step lookahead on `v`.
pub fn policy_improvement_from_v<M: Mdp + ?Sized>(mdp: &M, v: &Array1<f64>) -> Vec<Discrete> {
    let gamma = mdp.gamma();
    improve(mdp, |s, a| mdp.transitions(s, a).backup(gamma, v))
}

/// Greedy policy on `q`.
pub fn policy_improvement_from_q<M: Mdp + ?Sized>(mdp: &M, q: &Array2<f64>) -> Vec<Discrete> {
    improve(mdp, |s, a| q[[s, a]])
}

/// Ties go to the action listed first, since only a strictly greater value
/// replaces the incumbent.
fn improve<M, F>(mdp: &M, value: F) -> Vec<Discrete>
where
    M: Mdp + ?Sized,
    F: Fn(Discrete, Discrete) -> f64,
{
    (0..mdp.n_s())
        .map(|s| {
            let acts = mdp.valid_actions(s);
            match acts.first() {
                None => PLACEHOLDER_ACTION,
                Some(&first) if mdp.is_terminal(s) => first,
                Some(&first) => {
                    acts.iter()
                        .fold((first, f64::NEG_INFINITY), |(best_a, best), &a| {
                            let val = value(s, a);
                            if val > best {
                                (a, val)
                            } else {
                                (best_a, best)
                            }
                        })
                        .0
                }
            }
        })
        .collect()
}

fn initial_policy<M: Mdp + ?Sized>(mdp: &M) -> Vec<Discrete> {
    (0..mdp.n_s())
        .map(|s| {
            mdp.valid_actions(s)
                .first()
                .copied()
                .unwrap_or(PLACEHOLDER_ACTION)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Evaluating,
    Improving,
    Converged,
    IterationLimitReached,
}

impl Phase {
    pub fn is_final(self) -> bool {
        matches!(self, Phase::Converged | Phase::IterationLimitReached)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Converged,
    IterationLimitReached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyIterationResult {
    pub termination: Termination,
    pub policy: Vec<Discrete>,
    pub v: Array1<f64>,
    pub q: Array2<f64>,
    /// Greedy policy on `v` from the last improvement. Informational only.
    pub v_greedy: Vec<Discrete>,
    /// Outer evaluate/improve rounds performed.
    pub iterations: usize,
    /// Whether the last policy evaluation met `theta` before its sweep cap.
    pub evaluation_converged: bool,
}

impl PolicyIterationResult {
    pub fn is_converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

impl MdpSolver for PolicyIterationResult {
    fn v_star(&self, s: Discrete) -> f64 {
        self.v[s]
    }

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<f64> {
        self.q.get((s, a)).copied()
    }

    fn pi_star(&self, s: Discrete) -> Option<Discrete> {
        self.policy.get(s).copied()
    }
}

/// Policy iteration - Sutton & Barto 2018, section 4.3.
///
/// Driven as an explicit state machine. Each [`step`](Self::step) performs
/// one transition: Initializing builds the first-valid-action policy,
/// Evaluating computes `V`, Improving derives `Q` and adopts the Q-greedy
/// policy unless it equals the current one.
pub struct PolicyIteration<'a, M: Mdp + ?Sized> {
    mdp: &'a M,
    config: SolverConfig,
    phase: Phase,
    iterations: usize,
    policy: Vec<Discrete>,
    v: Array1<f64>,
    q: Array2<f64>,
    v_greedy: Vec<Discrete>,
    evaluation_converged: bool,
}

impl<'a, M: Mdp + ?Sized> PolicyIteration<'a, M> {
    pub fn new(mdp: &'a M, config: SolverConfig) -> Self {
        Self {
            mdp,
            config,
            phase: Phase::Initializing,
            iterations: 0,
            policy: vec![],
            v: Array1::zeros(mdp.n_s()),
            q: Array2::zeros((mdp.n_s(), mdp.n_a())),
            v_greedy: vec![],
            evaluation_converged: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn policy(&self) -> &[Discrete] {
        &self.policy
    }

    pub fn value(&self) -> &Array1<f64> {
        &self.v
    }

    pub fn q_values(&self) -> &Array2<f64> {
        &self.q
    }

    pub fn v_greedy(&self) -> &[Discrete] {
        &self.v_greedy
    }

    /// Advances one transition. Final phases are left unchanged.
    pub fn step(&mut self) -> Phase {
        self.phase = match self.phase {
            Phase::Initializing => {
                self.policy = initial_policy(self.mdp);
                self.v_greedy = self.policy.clone();
                Phase::Evaluating
            }

            Phase::Evaluating if self.iterations >= self.config.max_outer_iter => {
                warn!(
                    max_outer_iter = self.config.max_outer_iter,
                    "Policy iteration stopped before the policy stabilised"
                );
                Phase::IterationLimitReached
            }

            Phase::Evaluating => {
                let eval = policy_evaluation(
                    self.mdp,
                    &self.policy,
                    self.config.theta,
                    self.config.max_iter,
                );
                if !eval.converged {
                    warn!(
                        sweeps = eval.sweeps,
                        delta = eval.delta,
                        theta = self.config.theta,
                        "Policy evaluation hit its sweep cap"
                    );
                }

                self.iterations += 1;
                debug!(
                    iteration = self.iterations,
                    sweeps = eval.sweeps,
                    delta = eval.delta,
                    "Evaluated policy"
                );
                self.v = eval.v;
                self.evaluation_converged = eval.converged;
                Phase::Improving
            }

            Phase::Improving => {
                self.q = q_from_v(self.mdp, &self.v);
                self.v_greedy = policy_improvement_from_v(self.mdp, &self.v);
                let improved = policy_improvement_from_q(self.mdp, &self.q);

                let changed = improved
                    .iter()
                    .zip(&self.policy)
                    .filter(|(a, b)| a != b)
                    .count();
                debug!(iteration = self.iterations, changed, "Improved policy");

                if changed == 0 {
                    info!(iterations = self.iterations, "Policy iteration converged");
                    Phase::Converged
                } else {
                    self.policy = improved;
                    Phase::Evaluating
                }
            }

            phase => phase,
        };

        self.phase
    }

    pub fn run(mut self) -> PolicyIterationResult {
        while !self.phase.is_final() {
            self.step();
        }

        let termination = if self.phase == Phase::Converged {
            Termination::Converged
        } else {
            Termination::IterationLimitReached
        };

        PolicyIterationResult {
            termination,
            policy: self.policy,
            v: self.v,
            q: self.q,
            v_greedy: self.v_greedy,
            iterations: self.iterations,
            evaluation_converged: self.evaluation_converged,
        }
    }
}

pub fn policy_iteration<M: Mdp + ?Sized>(mdp: &M, config: &SolverConfig) -> PolicyIterationResult {
    PolicyIteration::new(mdp, config.clone()).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::simple_golf::simple_golf;
    use crate::mdps::{StateKind, TabularMdp, TransitionRow};
    use float_eq::*;

    const V_GREEN: f64 = 9. / 0.91;
    const V_FAIRWAY: f64 = 0.81 * V_GREEN / 0.91;

    #[test]
    fn simple_golf_converges_to_putting() {
        let mdp = simple_golf(0.9);
        let ret = policy_iteration(&mdp, &SolverConfig::default());

        assert!(ret.is_converged());
        assert_eq!(ret.iterations, 2);
        assert_eq!(ret.policy, vec![0, 2, 0]);
        assert_eq!(ret.v_greedy, ret.policy);
        assert!(ret.evaluation_converged);
        assert_float_eq!(
            ret.v.to_vec(),
            vec![V_FAIRWAY, V_GREEN, 0.],
            abs_all <= 1e-7
        );
    }

    #[test]
    fn q_values_cover_valid_actions_only() {
        let mdp = simple_golf(0.9);
        let ret = policy_iteration(&mdp, &SolverConfig::default());

        assert_float_eq!(ret.q_star(1, 2).unwrap(), V_GREEN, abs <= 1e-7);
        assert_float_eq!(
            ret.q_star(1, 1).unwrap(),
            0.9 * 0.9 * V_FAIRWAY + 0.1 * 0.9 * V_GREEN,
            abs <= 1e-7
        );
        assert_eq!(ret.q_star(0, 1), Some(0.));
        assert_eq!(ret.q.row(2).to_vec(), vec![0.; 3]);
        assert_eq!(ret.q_star(3, 0), None);
        assert_eq!(ret.pi_star(1), Some(2));
    }

    #[test]
    fn state_machine_walks_through_phases() {
        let mdp = simple_golf(0.9);
        let mut pi = PolicyIteration::new(&mdp, SolverConfig::default());

        assert_eq!(pi.phase(), Phase::Initializing);
        assert_eq!(pi.step(), Phase::Evaluating);
        assert_eq!(pi.policy(), &[0, 1, 0]);
        assert_eq!(pi.step(), Phase::Improving);
        assert_eq!(pi.iterations(), 1);
        assert_eq!(pi.value().to_vec(), vec![0.; 3]);
        assert_eq!(pi.step(), Phase::Evaluating);
        assert_eq!(pi.policy(), &[0, 2, 0]);
        assert_eq!(pi.step(), Phase::Improving);
        assert_eq!(pi.step(), Phase::Converged);
        assert_eq!(pi.step(), Phase::Converged);
        assert_eq!(pi.iterations(), 2);
        assert_eq!(pi.v_greedy(), pi.policy());
    }

    #[test]
    fn iteration_cap_returns_last_policy() {
        let mdp = simple_golf(0.9);
        let config = SolverConfig {
            max_outer_iter: 1,
            ..SolverConfig::default()
        };
        let ret = policy_iteration(&mdp, &config);

        assert_eq!(ret.termination, Termination::IterationLimitReached);
        assert_eq!(ret.iterations, 1);
        assert_eq!(ret.policy, vec![0, 2, 0]);
        assert_eq!(ret.v.to_vec(), vec![0.; 3]);
    }

    #[test]
    #[should_panic(expected = "every state")]
    fn evaluation_rejects_short_policy() {
        let mdp = simple_golf(0.9);
        policy_evaluation(&mdp, &[0, 2], 1e-8, 10);
    }

    #[test]
    fn evaluation_reports_sweep_cap() {
        let mdp = simple_golf(0.9);
        let eval = policy_evaluation(&mdp, &[0, 2, 0], 1e-8, 3);

        assert!(!eval.converged);
        assert_eq!(eval.sweeps, 3);
        assert!(eval.delta >= 1e-8);

        let eval = policy_evaluation(&mdp, &[0, 2, 0], 1e-8, 10_000);
        assert!(eval.converged);
        assert!(eval.sweeps < 10_000);
        assert_eq!(eval.v[2], 0.);
    }

    #[test]
    fn in_place_sweep_sees_fresh_values() {
        // 0 -> 1 -> 2 (terminal), reward 1 on each move.
        let rows = vec![
            vec![TransitionRow::deterministic(1, 1.)],
            vec![TransitionRow::deterministic(2, 1.)],
            vec![TransitionRow::absorbing(2)],
        ];
        let mdp = TabularMdp::new(
            3,
            1,
            0.5,
            vec![StateKind::Normal, StateKind::Normal, StateKind::Terminal],
            vec![vec![0]; 3],
            rows,
        )
        .unwrap();

        let eval = policy_evaluation(&mdp, &[0, 0, 0], 1e-8, 1);
        // State 0 is swept before state 1, so only state 1 is exact after one pass.
        assert_eq!(eval.v.to_vec(), vec![1., 1., 0.]);

        let eval = policy_evaluation(&mdp, &[0, 0, 0], 1e-8, 100);
        assert_eq!(eval.v.to_vec(), vec![1.5, 1., 0.]);
        assert_eq!(eval.sweeps, 3);
    }

    #[test]
    fn ties_keep_the_first_action() {
        let rows = vec![
            vec![TransitionRow::deterministic(1, 5.); 3],
            vec![TransitionRow::absorbing(1); 3],
        ];
        let mdp = TabularMdp::new(
            2,
            3,
            0.9,
            vec![StateKind::Normal, StateKind::Terminal],
            vec![vec![2, 0, 1], vec![1, 2]],
            rows,
        )
        .unwrap();

        let ret = policy_iteration(&mdp, &SolverConfig::default());
        assert_eq!(ret.policy, vec![2, 1]);
        assert_eq!(ret.v_greedy, vec![2, 1]);
        assert_eq!(ret.iterations, 1);
    }

    #[test]
    fn states_without_actions_hold_a_placeholder() {
        let rows = vec![
            vec![TransitionRow::absorbing(0); 2],
            vec![TransitionRow::deterministic(1, -1.), TransitionRow::deterministic(1, -2.)],
        ];
        let mdp = TabularMdp::new(
            2,
            2,
            0.9,
            vec![StateKind::Blocked, StateKind::Normal],
            vec![vec![], vec![1, 0]],
            rows,
        )
        .unwrap();

        let ret = policy_iteration(&mdp, &SolverConfig::default());
        assert_eq!(ret.policy, vec![PLACEHOLDER_ACTION, 0]);
        assert_eq!(ret.v[0], 0.);
        assert_float_eq!(ret.v[1], -10., abs <= 1e-6);
    }
}
