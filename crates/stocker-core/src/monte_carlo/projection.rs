use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::outliers::OutlierPolicy;
use super::simulation::{MonteCarlo, MonteCarloConfig, MonteCarloSummary, TrialResult};
use super::statistics::HistogramBin;
use crate::scenario::projection::PlanInput;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::StockerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_num_trials() -> u32 {
    400
}

fn default_histogram_bins() -> usize {
    30
}

/// Top-level input for a Monte Carlo projection of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloInput {
    pub plan: PlanInput,
    /// Number of trials (minimum 1).
    #[serde(default = "default_num_trials")]
    pub num_trials: u32,
    /// Inflation-adjusted terminal value to test against.
    pub goal: Option<Money>,
    #[serde(flatten)]
    pub config: MonteCarloConfig,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

/// A representative trial, for plotting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepresentativePath {
    pub trial: u32,
    pub terminal_real_value: Money,
    pub real_path: Vec<Money>,
}

/// Output of a Monte Carlo projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloOutput {
    pub summary: MonteCarloSummary,
    pub histogram: Vec<HistogramBin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_path: Option<RepresentativePath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenth_percentile_path: Option<RepresentativePath>,
}

fn representative(trial: &TrialResult) -> Option<RepresentativePath> {
    trial.real_path.as_ref().map(|path| RepresentativePath {
        trial: trial.trial,
        terminal_real_value: trial.terminal_real_value,
        real_path: path.clone(),
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run a plan `num_trials` times and summarise the inflation-adjusted
/// terminal values.
pub fn run_monte_carlo_projection(
    input: &MonteCarloInput,
) -> StockerResult<ComputationOutput<MonteCarloOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let plan = input.plan.build()?;
    let mut mc = MonteCarlo::with_config(plan, input.config.clone())?;
    mc.run(input.num_trials)?;

    let summary = mc.results(input.goal)?;
    if summary.failed_trials > 0 {
        warnings.push(format!(
            "{} of {} trials depleted the portfolio and count as missing any goal",
            summary.failed_trials, summary.num_trials
        ));
    }
    if summary.outliers_removed > 0 && input.config.outlier_policy != OutlierPolicy::None {
        warnings.push(format!(
            "{} high-end outliers excluded from the statistics",
            summary.outliers_removed
        ));
    }

    let output = MonteCarloOutput {
        histogram: mc.histogram(input.histogram_bins)?,
        median_path: representative(mc.median_trial()?),
        tenth_percentile_path: representative(mc.tenth_percentile_trial()?),
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo Portfolio Projection",
        &serde_json::json!({
            "plan": input.plan,
            "num_trials": input.num_trials,
            "goal": input.goal,
            "seed": input.config.seed,
            "outlier_policy": input.config.outlier_policy,
            "max_outliers": input.config.max_outliers,
            "max_failure_fraction": input.config.max_failure_fraction,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(goal: f64) -> MonteCarloInput {
        serde_json::from_value(serde_json::json!({
            "plan": {
                "name": "Retirement Accumulation",
                "portfolio": {
                    "name": "Retirement Savings",
                    "value": 250000,
                    "allocations": [
                        {"position": {"preset": "us_stocks"}, "weight": 6},
                        {"position": {"preset": "us_bonds"}, "weight": 4}
                    ]
                },
                "num_years": 30,
                "annual_contribution": 20000,
                "annual_contribution_increase_perc": 2.0
            },
            "num_trials": 200,
            "goal": goal,
            "seed": 42
        }))
        .unwrap()
    }

    #[test]
    fn test_projection_runs() {
        let out = run_monte_carlo_projection(&input(1_000_000.0)).unwrap();
        let s = &out.result.summary;
        assert_eq!(s.num_trials, 200);
        assert_eq!(s.failed_trials, 0);
        assert!(s.outliers_removed <= 200);
        let goal = s.goal.as_ref().unwrap();
        assert!((0.0..=100.0).contains(&goal.likelihood_pct));
        assert_eq!(out.result.histogram.len(), 30);
        assert_eq!(out.result.median_path.as_ref().unwrap().real_path.len(), 31);
    }

    #[test]
    fn test_defaults() {
        let mut json = serde_json::to_value(input(0.0)).unwrap();
        json.as_object_mut().unwrap().remove("num_trials");
        let parsed: MonteCarloInput = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.num_trials, 400);
        assert_eq!(parsed.config.max_failure_fraction, 0.10);
        assert_eq!(parsed.config.outlier_policy, OutlierPolicy::default());
    }

    #[test]
    fn test_zero_trials_rejected() {
        let mut i = input(0.0);
        i.num_trials = 0;
        assert!(run_monte_carlo_projection(&i).is_err());
    }
}
