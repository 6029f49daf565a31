use crate::error::{MdpError, Result};
use crate::mdps::{Discrete, Mdp, RowBuilder, StateKind, TabularMdp, TransitionRow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `(row, col)` cell of the grid.
pub type Coord = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
    Wait = 4,
}

/// `(d_row, d_col)` per action, indexed by `Action as usize`.
static DELTAS: [(isize, isize); 5] = [(-1, 0), (0, 1), (1, 0), (0, -1), (0, 0)];

/// Directions 90° to the left and to the right of each directional action.
static SLIPS: [Option<[Action; 2]>; 5] = [
    Some([Action::Left, Action::Right]),
    Some([Action::Up, Action::Down]),
    Some([Action::Right, Action::Left]),
    Some([Action::Down, Action::Up]),
    None,
];

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Up,
        Action::Right,
        Action::Down,
        Action::Left,
        Action::Wait,
    ];

    pub const fn index(self) -> Discrete {
        self as Discrete
    }

    pub fn from_index(a: Discrete) -> Option<Self> {
        Self::ALL.get(a).copied()
    }

    pub fn delta(self) -> (isize, isize) {
        DELTAS[self.index()]
    }

    /// The two perpendicular directions a move can slip into. `None` for `Wait`.
    pub fn slips(self) -> Option<[Action; 2]> {
        SLIPS[self.index()]
    }

    pub fn glyph(self) -> char {
        match self {
            Action::Up => '↑',
            Action::Right => '→',
            Action::Down => '↓',
            Action::Left => '←',
            Action::Wait => '•',
        }
    }
}

/// Declarative description of a delivery grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    /// Start cell.
    pub depot: Coord,
    /// Goal cell, absorbing.
    pub customer: Coord,
    pub blocked: Vec<Coord>,
    /// Reward of every move that does not deliver.
    pub step_cost: f64,
    /// Reward of a move landing on the customer.
    pub delivery_bonus: f64,
    pub gamma: f64,
    /// Chance of sliding to each side of the intended direction.
    pub slip_prob: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 6,
            depot: (0, 0),
            customer: (5, 5),
            blocked: vec![(1, 2), (2, 2), (3, 2), (4, 2), (4, 3), (1, 4)],
            step_cost: -1.,
            delivery_bonus: 20.,
            gamma: 0.95,
            slip_prob: 0.1,
        }
    }
}

impl GridSpec {
    /// Checks the layout and returns the number of cells.
    fn validate(&self) -> Result<usize> {
        if self.rows == 0 || self.cols == 0 {
            return Err(invalid(format!(
                "grid must be non-empty, got {}x{}",
                self.rows, self.cols
            )));
        }
        let n_cells = self.rows.checked_mul(self.cols).ok_or_else(|| {
            invalid(format!(
                "grid of {}x{} cells is too large",
                self.rows, self.cols
            ))
        })?;

        let in_bounds = |(r, c): Coord| r < self.rows && c < self.cols;
        for (name, rc) in [("depot", self.depot), ("customer", self.customer)]
            .into_iter()
            .chain(self.blocked.iter().map(|&rc| ("blocked cell", rc)))
        {
            if !in_bounds(rc) {
                return Err(invalid(format!("{name} {rc:?} lies outside the grid")));
            }
        }

        for (name, rc) in [("depot", self.depot), ("customer", self.customer)] {
            if self.blocked.contains(&rc) {
                return Err(invalid(format!("{name} {rc:?} is blocked")));
            }
        }

        // 1 - 2 * slip must stay positive.
        if !(0.0..0.5).contains(&self.slip_prob) {
            return Err(invalid(format!(
                "slip_prob must lie in [0, 0.5), got {}",
                self.slip_prob
            )));
        }

        if !(0.0..1.0).contains(&self.gamma) {
            return Err(invalid(format!(
                "gamma must lie in [0, 1), got {}",
                self.gamma
            )));
        }

        for (name, x) in [("step_cost", self.step_cost), ("delivery_bonus", self.delivery_bonus)] {
            if !x.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {x}")));
            }
        }

        Ok(n_cells)
    }
}

fn invalid(msg: String) -> MdpError {
    MdpError::InvalidConfiguration(msg)
}

/// Stochastic delivery grid with slip noise, materialised as a [`TabularMdp`].
#[derive(Debug, Clone)]
pub struct LogisticsGrid {
    spec: GridSpec,
    depot: Discrete,
    customer: Discrete,
    mdp: TabularMdp,
}

impl LogisticsGrid {
    pub fn new(spec: GridSpec) -> Result<Self> {
        let n_s = spec.validate()?;
        let n_a = Action::ALL.len();
        let to_state = |(r, c): Coord| r * spec.cols + c;
        let depot = to_state(spec.depot);
        let customer = to_state(spec.customer);

        let mut kinds = vec![StateKind::Normal; n_s];
        for &rc in &spec.blocked {
            kinds[to_state(rc)] = StateKind::Blocked;
        }
        kinds[customer] = StateKind::Terminal;

        let main_p = 1. - 2. * spec.slip_prob;
        let reward = |s_next: Discrete| {
            if s_next == customer {
                spec.delivery_bonus
            } else {
                spec.step_cost
            }
        };

        let mut rows = Vec::with_capacity(n_s);
        let mut valid_actions = Vec::with_capacity(n_s);
        for s in 0..n_s {
            let mut row = Vec::with_capacity(n_a);
            for a in Action::ALL {
                let tr = match (kinds[s], a.slips()) {
                    (k, _) if k.is_absorbing() => TransitionRow::absorbing(s),
                    (_, None) => {
                        let s_next = attempt_move(spec.rows, spec.cols, &kinds, s, a);
                        TransitionRow::deterministic(s_next, reward(s_next))
                    }
                    (_, Some([left, right])) => {
                        let mut b = RowBuilder::new();
                        for (a_eff, p) in [(a, main_p), (left, spec.slip_prob), (right, spec.slip_prob)]
                        {
                            let s_next = attempt_move(spec.rows, spec.cols, &kinds, s, a_eff);
                            b.add(s_next, p, reward(s_next));
                        }
                        b.build()?
                    }
                };
                row.push(tr);
            }
            rows.push(row);

            valid_actions.push(if kinds[s] == StateKind::Blocked {
                vec![]
            } else {
                Action::ALL.iter().map(|a| a.index()).collect()
            });
        }

        debug!(
            rows = spec.rows,
            cols = spec.cols,
            blocked = spec.blocked.len(),
            slip_prob = spec.slip_prob,
            "Built logistics grid model"
        );

        let mdp = TabularMdp::new(n_s, n_a, spec.gamma, kinds, valid_actions, rows)?;

        Ok(Self {
            spec,
            depot,
            customer,
            mdp,
        })
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn rows(&self) -> usize {
        self.spec.rows
    }

    pub fn cols(&self) -> usize {
        self.spec.cols
    }

    pub fn mdp(&self) -> &TabularMdp {
        &self.mdp
    }

    pub fn to_state(&self, (r, c): Coord) -> Discrete {
        r * self.spec.cols + c
    }

    pub fn to_rc(&self, s: Discrete) -> Coord {
        (s / self.spec.cols, s % self.spec.cols)
    }

    pub fn depot(&self) -> Discrete {
        self.depot
    }

    pub fn customer(&self) -> Discrete {
        self.customer
    }

    pub fn is_blocked(&self, s: Discrete) -> bool {
        self.mdp.kind(s) == StateKind::Blocked
    }

    /// Cell `a` points at from `s`, if it lies inside the grid. Ignores blocking.
    pub fn target(&self, s: Discrete, a: Action) -> Option<Coord> {
        offset(self.spec.rows, self.spec.cols, self.to_rc(s), a)
    }

    /// Where `a` takes the agent from `s` without slipping.
    pub fn move_deterministic(&self, s: Discrete, a: Action) -> Discrete {
        attempt_move(self.spec.rows, self.spec.cols, self.mdp.kinds(), s, a)
    }
}

fn offset(rows: usize, cols: usize, (r, c): Coord, a: Action) -> Option<Coord> {
    let (dr, dc) = a.delta();
    let r2 = r.checked_add_signed(dr).filter(|&r2| r2 < rows)?;
    let c2 = c.checked_add_signed(dc).filter(|&c2| c2 < cols)?;
    Some((r2, c2))
}

/// Moving off the grid or into a blocked cell leaves the agent where it is.
fn attempt_move(rows: usize, cols: usize, kinds: &[StateKind], s: Discrete, a: Action) -> Discrete {
    if kinds[s] == StateKind::Blocked {
        return s;
    }

    match offset(rows, cols, (s / cols, s % cols), a) {
        Some((r2, c2)) if kinds[r2 * cols + c2] != StateKind::Blocked => r2 * cols + c2,
        _ => s,
    }
}
