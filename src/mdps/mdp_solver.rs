use super::mdp::Discrete;

/// Read access to a solved MDP.
pub trait MdpSolver {
    fn v_star(&self, s: Discrete) -> f64;

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<f64>;

    fn pi_star(&self, s: Discrete) -> Option<Discrete>;
}
