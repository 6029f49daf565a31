use anyhow::Result;
use clap::{Parser, Subcommand};
use logistics_mdp::mdps::estimation::estimate_mdp;
use logistics_mdp::mdps::mdp_simulator::{rollout, MdpSolverPolicy, ModelSimulator};
use logistics_mdp::render::{render_policy, render_values};
use logistics_mdp::{policy_iteration, Action, LogisticsGrid, Mdp, RunConfig, StateKind};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "logistics_mdp")]
#[command(about = "Policy iteration on a stochastic delivery grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON run configuration. Missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "outputs")]
    out: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the grid exactly and save policy, values and action values.
    Solve,
    /// Estimate the model from random episodes and compare with the exact solution.
    Estimate {
        #[arg(long)]
        episodes: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Follow the optimal policy from the depot.
    Rollout {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 200)]
        max_steps: usize,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        Some(p) => {
            let content = fs::read_to_string(p)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(RunConfig::default()),
    }
}

fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    let grid = LogisticsGrid::new(config.grid.clone())?;
    info!(rows = grid.rows(), cols = grid.cols(), "Grid model ready");

    match cli.command {
        Commands::Solve => {
            let ret = policy_iteration(grid.mdp(), &config.solver);

            println!(
                "Policy Iteration completed in {} iterations ({:?}).",
                ret.iterations, ret.termination
            );
            println!("Value at depot: {}", ret.v[grid.depot()]);
            println!("Value at customer: {}", ret.v[grid.customer()]);
            println!("{}", render_policy(&grid, &ret.policy));
            println!("{}", render_values(&grid, &ret.v));

            let q = ret
                .q
                .outer_iter()
                .map(|row| row.to_vec())
                .collect::<Vec<_>>();
            save_json(&cli.out.join("policies/best_policy.json"), &ret.policy)?;
            save_json(&cli.out.join("values/V.json"), &ret.v.to_vec())?;
            save_json(&cli.out.join("qvalues/Q.json"), &q)?;
            println!("Saved outputs to {}.", cli.out.display());
        }

        Commands::Estimate { episodes, seed } => {
            if let Some(episodes) = episodes {
                config.estimation.episodes = episodes;
            }
            if let Some(seed) = seed {
                config.estimation.seed = seed;
            }

            let mut sim = ModelSimulator::new(grid.mdp(), grid.depot(), config.estimation.seed);
            let estimated = estimate_mdp(&mut sim, grid.spec().gamma, &config.estimation)?;
            let exact = policy_iteration(grid.mdp(), &config.solver);
            let approx = policy_iteration(&estimated, &config.solver);

            let compared = grid
                .mdp()
                .states()
                .iter()
                .filter(|&&s| {
                    grid.mdp().kind(s) == StateKind::Normal && estimated.kind(s) == StateKind::Normal
                })
                .collect::<Vec<_>>();
            let agree = compared
                .iter()
                .filter(|&&&s| exact.policy[s] == approx.policy[s])
                .count();

            println!(
                "Estimated model from {} episodes: policy agrees on {}/{} states.",
                config.estimation.episodes,
                agree,
                compared.len()
            );
            println!(
                "Value at depot: exact {:.4}, estimated {:.4}",
                exact.v[grid.depot()],
                approx.v[grid.depot()]
            );
            println!("{}", render_policy(&grid, &approx.policy));
        }

        Commands::Rollout { seed, max_steps } => {
            let ret = policy_iteration(grid.mdp(), &config.solver);
            let mut sim = ModelSimulator::new(grid.mdp(), grid.depot(), seed);
            let mut policy = MdpSolverPolicy { mdp_solver: &ret };
            let ep = rollout(&mut sim, &mut policy, max_steps);

            let gamma = grid.spec().gamma;
            let mut discounted = 0.;
            for (t, e) in ep.iter().enumerate() {
                discounted += gamma.powi(t as i32) * e.r;
                let a = Action::from_index(e.a).map_or('?', Action::glyph);
                println!(
                    "{t:>4}: {:?} {a} -> {:?} (r = {})",
                    grid.to_rc(e.s),
                    grid.to_rc(e.s_next),
                    e.r
                );
            }

            let delivered = ep.last().is_some_and(|e| e.terminated);
            println!(
                "Delivered: {delivered}, steps: {}, discounted return: {discounted:.4}",
                ep.len()
            );
        }
    }

    Ok(())
}
