use clap::Args;
use serde_json::Value;

use stocker_core::monte_carlo::{run_monte_carlo_projection, MonteCarloInput, OutlierPolicy};

use crate::input;

/// Arguments for a Monte Carlo batch
#[derive(Args)]
pub struct MonteCarloArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Number of trials (overrides the input file)
    #[arg(long)]
    pub trials: Option<u32>,

    /// Inflation-adjusted goal value (overrides the input file)
    #[arg(long)]
    pub goal: Option<f64>,

    /// Base seed (overrides the input file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep outliers in the summary statistics
    #[arg(long)]
    pub no_trim: bool,
}

pub fn run_monte_carlo(args: MonteCarloArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut mc_input: MonteCarloInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file> or stdin required for Monte Carlo projection".into());
    };
    apply_overrides(&mut mc_input, &args);
    let result = run_monte_carlo_projection(&mc_input)?;
    Ok(serde_json::to_value(result)?)
}

fn apply_overrides(mc_input: &mut MonteCarloInput, args: &MonteCarloArgs) {
    if let Some(trials) = args.trials {
        mc_input.num_trials = trials;
    }
    if args.goal.is_some() {
        mc_input.goal = args.goal;
    }
    if args.seed.is_some() {
        mc_input.config.seed = args.seed;
    }
    if args.no_trim {
        mc_input.config.outlier_policy = OutlierPolicy::None;
    }
}
