use super::solvers::policy_iteration::PLACEHOLDER_ACTION;
use super::{Discrete, Mdp, MdpSolver, Transition};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub next_state: Discrete,
    pub reward: f64,
    pub terminated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeEvent {
    pub s: Discrete,
    pub a: Discrete,
    pub r: f64,
    pub s_next: Discrete,
    pub terminated: bool,
}

/// Episodic environment with discrete states and actions.
pub trait MdpSimulator {
    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    fn reset(&mut self) -> Discrete;

    fn step(&mut self, a: Discrete) -> Step;
}

pub trait Policy {
    fn action(&mut self, s: Discrete) -> Discrete;
}

pub trait Weighted<S> {
    fn s(&self) -> S;

    fn p(&self) -> f64;
}

impl Weighted<Transition> for Transition {
    fn s(&self) -> Transition {
        *self
    }

    fn p(&self) -> f64 {
        self.probability
    }
}

/// Samples one item in proportion to its weight. `None` if no item has weight.
pub fn pick_next<T, S, R>(rng: &mut R, ts: &[T]) -> Option<S>
where
    T: Weighted<S>,
    R: Rng + ?Sized,
{
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p())).ok()?;
    ts.get(dist.sample(rng)).map(|item| item.s())
}

/// Plays an [`Mdp`] by sampling its transition rows.
pub struct ModelSimulator<'a, M: Mdp + ?Sized> {
    mdp: &'a M,
    start: Discrete,
    state: Discrete,
    rng: StdRng,
}

impl<'a, M: Mdp + ?Sized> ModelSimulator<'a, M> {
    pub fn new(mdp: &'a M, start: Discrete, seed: u64) -> Self {
        Self {
            mdp,
            start,
            state: start,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> Discrete {
        self.state
    }
}

impl<M: Mdp + ?Sized> MdpSimulator for ModelSimulator<'_, M> {
    fn n_s(&self) -> usize {
        self.mdp.n_s()
    }

    fn n_a(&self) -> usize {
        self.mdp.n_a()
    }

    fn reset(&mut self) -> Discrete {
        self.state = self.start;
        self.state
    }

    /// Pairs without known outcomes leave the agent in place with no reward.
    fn step(&mut self, a: Discrete) -> Step {
        let row = self.mdp.transitions(self.state, a);
        let (next_state, reward) = match pick_next(&mut self.rng, row.as_slice()) {
            Some(Transition {
                next_state, reward, ..
            }) => (next_state, reward),
            None => (self.state, 0.),
        };

        self.state = next_state;
        Step {
            next_state,
            reward,
            terminated: self.mdp.is_terminal(next_state),
        }
    }
}

/// Uniformly random actions.
pub struct RandomPolicy {
    n_a: usize,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(n_a: usize, seed: u64) -> Self {
        Self {
            n_a,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn action(&mut self, _s: Discrete) -> Discrete {
        self.rng.gen_range(0..self.n_a)
    }
}

/// Follows the policy of a solved MDP.
pub struct MdpSolverPolicy<'a> {
    pub mdp_solver: &'a dyn MdpSolver,
}

impl Policy for MdpSolverPolicy<'_> {
    fn action(&mut self, s: Discrete) -> Discrete {
        self.mdp_solver.pi_star(s).unwrap_or(PLACEHOLDER_ACTION)
    }
}

/// Runs one episode from `reset` until termination or `max_steps` steps.
pub fn rollout<S, P>(sim: &mut S, policy: &mut P, max_steps: usize) -> Vec<EpisodeEvent>
where
    S: MdpSimulator + ?Sized,
    P: Policy + ?Sized,
{
    let mut ep = vec![];
    let mut s = sim.reset();
    for _ in 0..max_steps {
        let a = policy.action(s);
        let step = sim.step(a);
        ep.push(EpisodeEvent {
            s,
            a,
            r: step.reward,
            s_next: step.next_state,
            terminated: step.terminated,
        });
        if step.terminated {
            break;
        }

        s = step.next_state;
    }

    ep
}
