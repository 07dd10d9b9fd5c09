//! Command-line front end: load a typed input bundle, run the planner,
//! persist the solve; or re-validate an existing solve file.

use anyhow::Context;
use bnp_core::{PlanInputs, PlanInputsFile};
use bnp_plan::{
    input_hashes, load_solve, plan_horizon, save_solve, PlannerConfig, SolveFile, SolveMetadata,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bnp", about = "Bread network production and distribution planner", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan the horizon and write a solve file.
    Plan {
        /// Typed JSON input bundle (locations, legs, forecast, labor,
        /// trucks, costs, initial inventory).
        #[arg(long)]
        inputs: PathBuf,
        /// Planner configuration JSON; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory receiving the solves/ tree.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Solver backend override: highs | cbc.
        #[arg(long)]
        solver: Option<String>,
        /// Planning length override, weeks.
        #[arg(long)]
        horizon_weeks: Option<u32>,
        /// Print the solution summary as JSON to stdout.
        #[arg(long)]
        json: bool,
    },
    /// Round-trip a persisted solve file through the schema validator.
    Validate {
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Commands::Plan {
            inputs,
            config,
            output_dir,
            solver,
            horizon_weeks,
            json,
        } => {
            let text = std::fs::read_to_string(&inputs)
                .with_context(|| format!("reading {}", inputs.display()))?;
            let file: PlanInputsFile = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", inputs.display()))?;
            let inputs = PlanInputs::from_file(file)?;

            let mut planner_config: PlannerConfig = match config {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str(&text)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => PlannerConfig::default(),
            };
            if let Some(solver) = solver {
                planner_config.solver = bnp_solve::SolverBackend::from_str(&solver)?;
            }
            if let Some(weeks) = horizon_weeks {
                planner_config.horizon_weeks = weeks;
            }

            let solution = plan_horizon(&inputs, &planner_config)?;

            let stamp = chrono::Utc::now().naive_utc();
            let file = SolveFile {
                metadata: SolveMetadata {
                    git_commit: std::env::var("GIT_COMMIT").ok(),
                    solver_name: planner_config.solver.name().to_string(),
                    solver_version: None,
                    wall_time_seconds: solution
                        .windows
                        .iter()
                        .map(|w| w.wall_time_seconds)
                        .sum(),
                    mip_gap: Some(planner_config.mip_gap),
                    input_hashes: input_hashes(&inputs)?,
                    saved_at: stamp,
                },
                solution,
            };
            let path = save_solve(&output_dir, &file, stamp)?;
            info!(path = %path.display(), "solve saved");

            if json {
                println!("{}", serde_json::to_string_pretty(&file.solution)?);
            } else {
                println!(
                    "status: {:?}  total cost: ${:.2}  fill rate: {:.1}%  windows: {}",
                    file.solution.status,
                    file.solution.total_cost,
                    file.solution.fill_rate() * 100.0,
                    file.solution.windows.len()
                );
                println!("saved: {}", path.display());
            }
        }
        Commands::Validate { file } => {
            let solve = load_solve(&file)?;
            println!(
                "valid: {} ({:?}, ${:.2}, {} shipments)",
                file.display(),
                solve.solution.status,
                solve.solution.total_cost,
                solve.solution.shipments.len()
            );
        }
    }
    Ok(())
}
