use clap::Args;
use serde_json::{json, Value};

use stocker_core::presets::{PORTFOLIOS, POSITIONS};

/// Arguments for listing built-in presets
#[derive(Args)]
pub struct PresetsArgs {
    /// Only list portfolios
    #[arg(long, conflicts_with = "positions")]
    pub portfolios: bool,

    /// Only list positions
    #[arg(long)]
    pub positions: bool,
}

pub fn run_presets(args: PresetsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.positions {
        return Ok(serde_json::to_value(POSITIONS)?);
    }
    if args.portfolios {
        return Ok(serde_json::to_value(PORTFOLIOS)?);
    }
    Ok(json!({
        "positions": POSITIONS,
        "portfolios": PORTFOLIOS,
    }))
}
