#[cfg(test)]
use crate::mdps::{RowBuilder, StateKind, TabularMdp, TransitionRow};

/// https://towardsdatascience.com/reinforcement-learning-an-easy-introduction-to-value-iteration-e4cfe0731fd5
///
/// Three states: fairway (0), green (1), hole (2, terminal). Actions: hit to
/// green (0), hit to fairway (1), hit in hole (2).
#[cfg(test)]
pub fn simple_golf(gamma: f64) -> TabularMdp {
    let row = |outcomes: &[(usize, f64, f64)]| {
        let mut b = RowBuilder::new();
        for &(s_next, p, r) in outcomes {
            b.add(s_next, p, r);
        }
        b.build().unwrap()
    };

    let rows = vec![
        vec![
            row(&[(1, 0.9, 0.), (0, 0.1, 0.)]),
            TransitionRow::default(),
            TransitionRow::default(),
        ],
        vec![
            TransitionRow::default(),
            row(&[(0, 0.9, 0.), (1, 0.1, 0.)]),
            row(&[(2, 0.9, 10.), (1, 0.1, 0.)]),
        ],
        vec![TransitionRow::absorbing(2); 3],
    ];

    TabularMdp::new(
        3,
        3,
        gamma,
        vec![StateKind::Normal, StateKind::Normal, StateKind::Terminal],
        vec![vec![0], vec![1, 2], vec![0, 1, 2]],
        rows,
    )
    .unwrap()
}
