use clap::Args;
use serde_json::Value;

use stocker_core::scenario::projection::{run_scenario_projection, ScenarioRunInput};

use crate::input;

/// Arguments for a single scenario path
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Seed for the return sampler (overrides the input file)
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run_scenario(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut run_input: ScenarioRunInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file> or stdin required for a scenario run".into());
    };
    if args.seed.is_some() {
        run_input.seed = args.seed;
    }
    let result = run_scenario_projection(&run_input)?;
    Ok(serde_json::to_value(result)?)
}
