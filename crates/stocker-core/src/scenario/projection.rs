use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{PiecewiseScenario, Plan, Scenario, ScenarioConfig, ScenarioMetrics, ScenarioState};
use super::{Simulation, YearRecord};
use crate::error::StockerError;
use crate::portfolio::{Portfolio, PortfolioSpec};
use crate::sampling::NormalReturns;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::StockerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One scenario as written in an input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub name: String,
    pub portfolio: PortfolioSpec,
    #[serde(flatten)]
    pub config: ScenarioConfig,
}

/// A single scenario, or named stages run back to back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanInput {
    Piecewise {
        name: String,
        stages: Vec<ScenarioInput>,
    },
    Single(ScenarioInput),
}

/// Input for a single simulated path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRunInput {
    pub plan: PlanInput,
    /// Optional seed for reproducibility.
    pub seed: Option<u64>,
}

/// Output of a single simulated path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRunOutput {
    pub name: String,
    pub state: ScenarioState,
    pub num_years: u32,
    pub start_value: Money,
    pub history: Vec<YearRecord>,
    pub metrics: Option<ScenarioMetrics>,
}

impl ScenarioInput {
    pub fn build(&self) -> StockerResult<Scenario> {
        let portfolio = Portfolio::from_spec(self.portfolio.clone())?;
        Scenario::new(self.name.clone(), portfolio, self.config.clone())
    }
}

impl PlanInput {
    pub fn build(&self) -> StockerResult<Plan> {
        match self {
            PlanInput::Single(input) => Ok(Plan::Single(input.build()?)),
            PlanInput::Piecewise { name, stages } => {
                let stages = stages
                    .iter()
                    .map(ScenarioInput::build)
                    .collect::<StockerResult<Vec<_>>>()?;
                Ok(Plan::Piecewise(PiecewiseScenario::new(name.clone(), stages)?))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate one random path of a plan.
///
/// A plan that runs out of money is still reported: the output carries the
/// `failed` state and the history up to the failing year, plus a warning.
pub fn run_scenario_projection(
    input: &ScenarioRunInput,
) -> StockerResult<ComputationOutput<ScenarioRunOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut plan = input.plan.build()?;
    let mut sampler = match input.seed {
        Some(s) => NormalReturns::seeded(s),
        None => NormalReturns::from_entropy(),
    };

    match plan.run_with(&mut sampler) {
        Ok(()) => {}
        Err(StockerError::Simulation(reason)) => {
            warnings.push(format!("Plan did not complete: {reason}"));
        }
        Err(e) => return Err(e),
    }

    let output = ScenarioRunOutput {
        name: plan.name().to_string(),
        state: plan.state().clone(),
        num_years: plan.num_years(),
        start_value: plan.start_value(),
        history: plan.history().to_vec(),
        metrics: plan.metrics().cloned(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio Scenario Simulation",
        &serde_json::json!({
            "plan": input.plan,
            "seed": input.seed,
            "return_model": "independent normal annual returns per position",
        }),
        warnings,
        elapsed,
        output,
    ))
}
