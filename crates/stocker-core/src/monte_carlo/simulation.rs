use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::outliers::{count_high_outliers, OutlierPolicy};
use super::statistics::{build_histogram, describe_sorted, DistributionStats, HistogramBin};
use crate::error::StockerError;
use crate::sampling::{trial_seed, NormalReturns};
use crate::scenario::{ScenarioState, Simulation};
use crate::types::{Money, Percent};
use crate::StockerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_max_failure_fraction() -> f64 {
    0.10
}

fn default_keep_paths() -> bool {
    true
}

/// Batch settings for a Monte Carlo driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Base seed; each trial derives its own seed from it. Drawn from
    /// entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub outlier_policy: OutlierPolicy,
    /// Upper bound on the number of outliers removed.
    #[serde(default)]
    pub max_outliers: Option<usize>,
    /// Largest tolerated share of failed (depleted) trials.
    #[serde(default = "default_max_failure_fraction")]
    pub max_failure_fraction: f64,
    /// Keep each trial's inflation-adjusted value path.
    #[serde(default = "default_keep_paths")]
    pub keep_paths: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            seed: None,
            outlier_policy: OutlierPolicy::default(),
            max_outliers: None,
            max_failure_fraction: default_max_failure_fraction(),
            keep_paths: default_keep_paths(),
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> StockerResult<()> {
        if !(0.0..=1.0).contains(&self.max_failure_fraction) {
            return Err(StockerError::config(
                "max_failure_fraction",
                "Must be between 0 and 1",
            ));
        }
        self.outlier_policy.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrialStatus {
    Completed,
    Failed { year: u32, reason: String },
}

/// Outcome of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: u32,
    pub seed: u64,
    pub status: TrialStatus,
    /// Zero for failed trials.
    pub terminal_nominal_value: Money,
    /// Zero for failed trials.
    pub terminal_real_value: Money,
    /// Starting value followed by each year's inflation-adjusted value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_path: Option<Vec<Money>>,
}

impl TrialResult {
    pub fn is_completed(&self) -> bool {
        self.status == TrialStatus::Completed
    }
}

/// Probability of ending at or above a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalLikelihood {
    pub goal: Money,
    pub likelihood_pct: Percent,
}

/// Aggregate view of a completed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub scenario: String,
    pub num_trials: u32,
    pub completed_trials: u32,
    pub failed_trials: u32,
    pub outliers_removed: usize,
    /// Inflation-adjusted terminal values, after outlier trimming.
    pub terminal_values: DistributionStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<GoalLikelihood>,
}

/// Repeats a simulation template with independent random paths and
/// aggregates the terminal values.
#[derive(Debug, Clone)]
pub struct MonteCarlo<S: Simulation> {
    template: S,
    config: MonteCarloConfig,
    trials: Vec<TrialResult>,
}

// ---------------------------------------------------------------------------
// Trial execution
// ---------------------------------------------------------------------------

fn run_trial<S: Simulation>(
    template: &S,
    trial: u32,
    seed: u64,
    keep_paths: bool,
) -> StockerResult<TrialResult> {
    let mut sim = template.clone();
    let mut sampler = NormalReturns::seeded(seed);
    let outcome = sim.run_with(&mut sampler);

    let status = match outcome {
        Ok(()) => TrialStatus::Completed,
        Err(StockerError::Simulation(reason)) => match sim.state() {
            ScenarioState::Failed { year, .. } => TrialStatus::Failed {
                year: *year,
                reason,
            },
            _ => TrialStatus::Failed { year: 0, reason },
        },
        Err(e) => return Err(e),
    };

    let (terminal_nominal_value, terminal_real_value) = match (&status, sim.history().last()) {
        (TrialStatus::Completed, Some(last)) => (last.nominal_value, last.real_value),
        (TrialStatus::Completed, None) => (sim.start_value(), sim.start_value()),
        (TrialStatus::Failed { .. }, _) => (0.0, 0.0),
    };
    let real_path = keep_paths.then(|| {
        std::iter::once(sim.start_value())
            .chain(sim.history().iter().map(|r| r.real_value))
            .collect()
    });

    debug!(trial, seed, terminal_real_value, "trial finished");
    Ok(TrialResult {
        trial,
        seed,
        status,
        terminal_nominal_value,
        terminal_real_value,
        real_path,
    })
}

#[cfg(not(feature = "parallel"))]
fn run_trials<S: Simulation>(
    template: &S,
    n: u32,
    base_seed: u64,
    keep_paths: bool,
) -> StockerResult<Vec<TrialResult>> {
    (0..n)
        .map(|t| run_trial(template, t, trial_seed(base_seed, u64::from(t)), keep_paths))
        .collect()
}

#[cfg(feature = "parallel")]
fn run_trials<S: Simulation>(
    template: &S,
    n: u32,
    base_seed: u64,
    keep_paths: bool,
) -> StockerResult<Vec<TrialResult>> {
    use rayon::prelude::*;

    (0..n)
        .into_par_iter()
        .map(|t| run_trial(template, t, trial_seed(base_seed, u64::from(t)), keep_paths))
        .collect()
}

/// Terminal real values of the ranked trials below the `removed` highest.
/// The ranking is already sorted ascending.
fn kept_values(ranked: &[&TrialResult], removed: usize) -> Vec<f64> {
    ranked[..ranked.len() - removed]
        .iter()
        .map(|t| t.terminal_real_value)
        .collect()
}

// ---------------------------------------------------------------------------
// MonteCarlo
// ---------------------------------------------------------------------------

impl<S: Simulation> MonteCarlo<S> {
    pub fn new(template: S) -> Self {
        Self {
            template,
            config: MonteCarloConfig::default(),
            trials: Vec::new(),
        }
    }

    pub fn with_config(template: S, config: MonteCarloConfig) -> StockerResult<Self> {
        config.validate()?;
        Ok(Self {
            template,
            config,
            trials: Vec::new(),
        })
    }

    pub fn template(&self) -> &S {
        &self.template
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Every stored trial, in trial order.
    pub fn trials(&self) -> &[TrialResult] {
        &self.trials
    }

    pub fn failed_trials(&self) -> u32 {
        self.trials.iter().filter(|t| !t.is_completed()).count() as u32
    }

    /// Run `n` independent trials, replacing any previous results.
    ///
    /// Fails with `TrialFailures` when the share of depleted trials exceeds
    /// the configured tolerance; the trials are still stored for inspection.
    pub fn run(&mut self, n: u32) -> StockerResult<()> {
        if n < 1 {
            return Err(StockerError::config("n", "At least one trial is required"));
        }
        self.trials.clear();

        let base_seed = self.config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!(
            scenario = %self.template.name(),
            trials = n,
            seed = base_seed,
            "starting Monte Carlo batch"
        );

        self.trials = run_trials(&self.template, n, base_seed, self.config.keep_paths)?;

        let failed = self.failed_trials();
        info!(
            scenario = %self.template.name(),
            trials = n,
            failed,
            "Monte Carlo batch finished"
        );
        self.check_failures()
    }

    fn check_failures(&self) -> StockerResult<()> {
        let total = self.trials.len() as u32;
        let failed = self.failed_trials();
        if f64::from(failed) / f64::from(total) > self.config.max_failure_fraction {
            warn!(failed, total, "failure tolerance exceeded");
            return Err(StockerError::TrialFailures {
                failed,
                total,
                max_fraction: self.config.max_failure_fraction,
            });
        }
        Ok(())
    }

    fn ensure_ran(&self) -> StockerResult<()> {
        if self.trials.is_empty() {
            return Err(StockerError::config(
                "results",
                "run() must complete before results are available",
            ));
        }
        Ok(())
    }

    /// Completed trials sorted by terminal real value, and how many of the
    /// highest are outliers.
    fn ranked(&self) -> (Vec<&TrialResult>, usize) {
        let mut ranked: Vec<&TrialResult> =
            self.trials.iter().filter(|t| t.is_completed()).collect();
        ranked.sort_by(|a, b| {
            a.terminal_real_value
                .partial_cmp(&b.terminal_real_value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let values: Vec<f64> = ranked.iter().map(|t| t.terminal_real_value).collect();
        let removed =
            count_high_outliers(&values, &self.config.outlier_policy, self.config.max_outliers);
        (ranked, removed)
    }

    /// Sorted terminal real values with the high outliers removed.
    pub fn trimmed_values(&self) -> StockerResult<Vec<f64>> {
        self.ensure_ran()?;
        let (ranked, removed) = self.ranked();
        Ok(kept_values(&ranked, removed))
    }

    /// Percentage of all trials, failed ones included, whose terminal real
    /// value is at least `goal`. Failed trials never meet a goal.
    pub fn likelihood_of_goal(&self, goal: Money) -> StockerResult<Percent> {
        self.ensure_ran()?;
        let met = self
            .trials
            .iter()
            .filter(|t| t.is_completed() && t.terminal_real_value >= goal)
            .count();
        Ok(met as f64 / self.trials.len() as f64 * 100.0)
    }

    pub fn results(&self, goal: Option<Money>) -> StockerResult<MonteCarloSummary> {
        self.ensure_ran()?;
        self.check_failures()?;

        let (ranked, removed) = self.ranked();
        let values = kept_values(&ranked, removed);
        let goal = goal
            .map(|g| {
                self.likelihood_of_goal(g)
                    .map(|likelihood_pct| GoalLikelihood {
                        goal: g,
                        likelihood_pct,
                    })
            })
            .transpose()?;

        Ok(MonteCarloSummary {
            scenario: self.template.name().to_string(),
            num_trials: self.trials.len() as u32,
            completed_trials: ranked.len() as u32,
            failed_trials: self.failed_trials(),
            outliers_removed: removed,
            terminal_values: describe_sorted(&values)?,
            goal,
        })
    }

    pub fn histogram(&self, num_bins: usize) -> StockerResult<Vec<HistogramBin>> {
        Ok(build_histogram(&self.trimmed_values()?, num_bins))
    }

    /// The trial at the `percentile` nearest rank among the trimmed,
    /// completed trials.
    pub fn percentile_trial(&self, percentile: f64) -> StockerResult<&TrialResult> {
        self.ensure_ran()?;
        if !(0.0..=100.0).contains(&percentile) {
            return Err(StockerError::config("percentile", "Must be in [0, 100]"));
        }
        let (ranked, removed) = self.ranked();
        let kept = ranked.len() - removed;
        if kept == 0 {
            return Err(StockerError::InsufficientData(
                "No completed trials to select from".into(),
            ));
        }
        let rank = ((percentile / 100.0) * kept as f64).ceil() as usize;
        Ok(ranked[rank.clamp(1, kept) - 1])
    }

    pub fn median_trial(&self) -> StockerResult<&TrialResult> {
        self.percentile_trial(50.0)
    }

    pub fn tenth_percentile_trial(&self) -> StockerResult<&TrialResult> {
        self.percentile_trial(10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::Portfolio;
    use crate::position::Position;
    use crate::scenario::{Scenario, ScenarioConfig};
    use pretty_assertions::assert_eq;

    fn scenario(std_dev: f64, distribution: Money) -> Scenario {
        let stocks = Position::new("Stocks", 8.0, std_dev).unwrap();
        let portfolio = Portfolio::new("p", vec![(stocks, 1.0)], 100_000.0).unwrap();
        let mut c = ScenarioConfig::new(10);
        c.annual_distribution = distribution;
        Scenario::new("s", portfolio, c).unwrap()
    }

    fn seeded() -> MonteCarloConfig {
        MonteCarloConfig {
            seed: Some(42),
            ..MonteCarloConfig::default()
        }
    }

    #[test]
    fn test_zero_trials_rejected() {
        let mut mc = MonteCarlo::new(scenario(15.0, 0.0));
        assert!(matches!(mc.run(0), Err(StockerError::Configuration { .. })));
    }

    #[test]
    fn test_results_before_run() {
        let mc = MonteCarlo::new(scenario(15.0, 0.0));
        assert!(matches!(
            mc.results(None),
            Err(StockerError::Configuration { .. })
        ));
        assert!(mc.median_trial().is_err());
    }

    #[test]
    fn test_rerun_replaces_trials() {
        let mut mc = MonteCarlo::with_config(scenario(15.0, 0.0), seeded()).unwrap();
        mc.run(20).unwrap();
        mc.run(5).unwrap();
        assert_eq!(mc.trials().len(), 5);
    }

    #[test]
    fn test_seeded_batches_match() {
        let mut a = MonteCarlo::with_config(scenario(15.0, 0.0), seeded()).unwrap();
        let mut b = MonteCarlo::with_config(scenario(15.0, 0.0), seeded()).unwrap();
        a.run(25).unwrap();
        b.run(25).unwrap();
        assert_eq!(a.trials(), b.trials());
    }

    #[test]
    fn test_deterministic_scenario_has_no_spread() {
        let mut mc = MonteCarlo::with_config(scenario(0.0, 0.0), seeded()).unwrap();
        mc.run(10).unwrap();
        let s = mc.results(None).unwrap();
        assert_eq!(s.outliers_removed, 0);
        assert!(s.terminal_values.std_dev.abs() < 1e-6);
        assert_eq!(s.terminal_values.min, s.terminal_values.max);
    }

    #[test]
    fn test_paths_include_start() {
        let mut mc = MonteCarlo::with_config(scenario(15.0, 0.0), seeded()).unwrap();
        mc.run(3).unwrap();
        let path = mc.trials()[0].real_path.as_ref().unwrap();
        assert_eq!(path.len(), 11);
        assert_eq!(path[0], 100_000.0);
        assert_eq!(path[10], mc.trials()[0].terminal_real_value);
    }

    #[test]
    fn test_paths_can_be_dropped() {
        let config = MonteCarloConfig {
            keep_paths: false,
            ..seeded()
        };
        let mut mc = MonteCarlo::with_config(scenario(15.0, 0.0), config).unwrap();
        mc.run(3).unwrap();
        assert!(mc.trials().iter().all(|t| t.real_path.is_none()));
    }

    #[test]
    fn test_too_many_failures_is_error() {
        let mut mc = MonteCarlo::with_config(scenario(5.0, 50_000.0), seeded()).unwrap();
        let r = mc.run(20);
        assert!(matches!(r, Err(StockerError::TrialFailures { .. })));
        assert_eq!(mc.trials().len(), 20);
        assert!(mc.results(Some(0.0)).is_err());
    }

    #[test]
    fn test_failed_trials_count_as_misses() {
        let config = MonteCarloConfig {
            max_failure_fraction: 1.0,
            ..seeded()
        };
        let mut mc = MonteCarlo::with_config(scenario(5.0, 50_000.0), config).unwrap();
        mc.run(20).unwrap();
        assert_eq!(mc.failed_trials(), 20);
        assert_eq!(mc.likelihood_of_goal(0.0).unwrap(), 0.0);
        assert!(mc.results(None).is_err());
    }

    #[test]
    fn test_median_trial_is_middle_rank() {
        let config = MonteCarloConfig {
            outlier_policy: OutlierPolicy::None,
            ..seeded()
        };
        let mut mc = MonteCarlo::with_config(scenario(15.0, 0.0), config).unwrap();
        mc.run(11).unwrap();
        let median = mc.median_trial().unwrap().terminal_real_value;
        let below = mc
            .trials()
            .iter()
            .filter(|t| t.terminal_real_value < median)
            .count();
        assert_eq!(below, 5);
        let tenth = mc.tenth_percentile_trial().unwrap().terminal_real_value;
        assert!(tenth <= median);
    }

    #[test]
    fn test_results_report_goal_and_trimmed_stats() {
        let mut mc = MonteCarlo::with_config(scenario(15.0, 0.0), seeded()).unwrap();
        mc.run(60).unwrap();
        let s = mc.results(Some(150_000.0)).unwrap();
        let goal = s.goal.unwrap();
        assert_eq!(goal.goal, 150_000.0);
        assert_eq!(goal.likelihood_pct, mc.likelihood_of_goal(150_000.0).unwrap());

        let values = mc.trimmed_values().unwrap();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values.len() + s.outliers_removed, 60);
        assert_eq!(s.terminal_values, describe_sorted(&values).unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MonteCarloConfig {
            max_failure_fraction: 1.5,
            ..MonteCarloConfig::default()
        };
        assert!(MonteCarlo::with_config(scenario(1.0, 0.0), config).is_err());
    }
}
