mod common;

use assertor::*;
use common::*;
use float_eq::*;
use itertools::Itertools;
use logistics_mdp::mdps::TransitionRow;
use logistics_mdp::*;
use rstest::rstest;

#[test]
fn directional_rows_are_normalised() {
    let grid = default_grid();
    let mdp = grid.mdp();

    for &s in mdp.states() {
        if mdp.is_terminal(s) {
            continue;
        }
        for a in Action::ALL {
            assert_float_eq!(
                mdp.transitions(s, a.index()).total_probability(),
                1.,
                abs <= 1e-9
            );
        }
    }
}

#[test]
fn blocked_and_terminal_states_absorb() {
    let grid = default_grid();
    let mdp = grid.mdp();

    let absorbing = (0..mdp.n_s())
        .filter(|&s| mdp.kind(s) != StateKind::Normal)
        .collect::<Vec<_>>();
    assert_eq!(absorbing.len(), 7);

    for s in absorbing {
        for a in 0..mdp.n_a() {
            assert_eq!(mdp.transitions(s, a), &TransitionRow::absorbing(s));
        }
    }
}

#[test]
fn exposes_the_solver_boundary() {
    let grid = default_grid();
    let mdp = grid.mdp();

    assert_that!(mdp.n_s()).is_equal_to(36);
    assert_that!(mdp.n_a()).is_equal_to(5);
    assert_that!(mdp.states().len()).is_equal_to(30);
    assert_eq!(
        mdp.terminal_mask()
            .iter()
            .positions(|&t| t)
            .collect::<Vec<_>>(),
        vec![35]
    );
    assert_eq!(grid.depot(), 0);
    assert_eq!(grid.to_rc(grid.customer()), (5, 5));
}

#[rstest]
#[case(0.)]
#[case(0.1)]
#[case(0.25)]
#[case(0.5 - 1e-9)]
fn slip_below_half_builds(#[case] slip_prob: f64) {
    let grid = LogisticsGrid::new(GridSpec {
        slip_prob,
        ..GridSpec::default()
    })
    .unwrap();

    let row = grid.mdp().transitions(grid.to_state((3, 3)), Action::Down.index());
    assert_float_eq!(row.total_probability(), 1., abs <= 1e-9);
}

#[rstest]
#[case(0.5)]
#[case(0.6)]
#[case(1.)]
fn slip_of_half_or_more_is_rejected(#[case] slip_prob: f64) {
    let err = LogisticsGrid::new(GridSpec {
        slip_prob,
        ..GridSpec::default()
    })
    .unwrap_err();

    assert!(matches!(err, MdpError::InvalidConfiguration(_)));
}

#[test]
fn delivery_scenario() {
    let grid = default_grid();
    let ret = solve(&grid);

    assert!(ret.is_converged());
    assert!(ret.iterations < 50);
    assert_eq!(ret.v[grid.customer()], 0.);

    let v_depot = ret.v[grid.depot()];
    assert!(v_depot.is_finite());
    assert!(v_depot > 0. && v_depot < 20.);
}

#[test]
fn policy_never_walks_into_a_blocked_cell() {
    let grid = default_grid();
    let ret = solve(&grid);
    let mdp = grid.mdp();

    for &s in mdp.states() {
        if mdp.is_terminal(s) {
            continue;
        }
        let a = Action::from_index(ret.policy[s]).unwrap();
        if let Some(target) = grid.target(s, a) {
            assert!(
                !grid.spec().blocked.contains(&target),
                "state {:?} heads into blocked {target:?}",
                grid.to_rc(s)
            );
        }
    }
}
