use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::ScenarioConfig;
use super::metrics::ScenarioMetrics;
use crate::error::StockerError;
use crate::portfolio::Portfolio;
use crate::sampling::{NormalReturns, ReturnSampler};
use crate::time_value::present_value;
use crate::types::{Money, Percent, Rate};
use crate::StockerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioState {
    Configured,
    Running,
    Completed,
    /// The run stopped in `year`; history up to the previous year is kept.
    Failed { year: u32, reason: String },
}

/// Sampled return for one position in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReturn {
    pub name: String,
    pub return_pct: Percent,
}

/// One simulated year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    /// Year index, counted from the start of the whole plan (1-based).
    pub year: u32,
    pub start_value: Money,
    /// Net contribution (positive) or distribution (negative) applied.
    pub cash_flow: Money,
    pub nominal_value: Money,
    /// `nominal_value` discounted to today's money.
    pub real_value: Money,
    pub position_returns: Vec<PositionReturn>,
    /// Market return of the whole portfolio, excluding the cash flow.
    pub blended_return: Rate,
    pub real_return: Rate,
}

/// One configured multi-year simulation over a portfolio.
///
/// Every run works on a fresh clone of the initial portfolio, so runs are
/// independent and the template is never modified.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    config: ScenarioConfig,
    initial: Portfolio,
    portfolio: Portfolio,
    start_value: Money,
    history: Vec<YearRecord>,
    state: ScenarioState,
    metrics: Option<ScenarioMetrics>,
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        portfolio: Portfolio,
        config: ScenarioConfig,
    ) -> StockerResult<Self> {
        config.validate(&portfolio)?;
        Ok(Self {
            name: name.into(),
            config,
            start_value: portfolio.total_value(),
            portfolio: portfolio.clone(),
            initial: portfolio,
            history: Vec::new(),
            state: ScenarioState::Configured,
            metrics: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn num_years(&self) -> u32 {
        self.config.num_years
    }

    pub fn initial_portfolio(&self) -> &Portfolio {
        &self.initial
    }

    /// Working portfolio as left by the latest run.
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn start_value(&self) -> Money {
        self.start_value
    }

    pub fn history(&self) -> &[YearRecord] {
        &self.history
    }

    pub fn state(&self) -> &ScenarioState {
        &self.state
    }

    /// Present only after a completed run.
    pub fn metrics(&self) -> Option<&ScenarioMetrics> {
        self.metrics.as_ref()
    }

    pub fn run<S: ReturnSampler + ?Sized>(&mut self, sampler: &mut S) -> StockerResult<()> {
        self.run_from(sampler, 0, None)
    }

    pub fn run_seeded(&mut self, seed: u64) -> StockerResult<()> {
        self.run(&mut NormalReturns::seeded(seed))
    }

    /// Run starting at global year `year_offset + 1`, optionally replacing
    /// the initial portfolio value with `starting_value`.
    pub(crate) fn run_from<S: ReturnSampler + ?Sized>(
        &mut self,
        sampler: &mut S,
        year_offset: u32,
        starting_value: Option<Money>,
    ) -> StockerResult<()> {
        self.portfolio = self.initial.clone();
        if let Some(value) = starting_value {
            self.portfolio.set_total_value(value)?;
        }
        self.start_value = self.portfolio.total_value();
        self.history.clear();
        self.metrics = None;
        self.state = ScenarioState::Running;

        let start_fractions = self.initial.target_fractions();
        for t in 1..=self.config.num_years {
            match self.step(sampler, &start_fractions, t, year_offset + t) {
                Ok(record) => self.history.push(record),
                Err(e) => {
                    let year = year_offset + t;
                    if matches!(e, StockerError::Simulation(_)) {
                        warn!(scenario = %self.name, year, "portfolio depleted: {e}");
                    }
                    self.state = ScenarioState::Failed {
                        year,
                        reason: e.to_string(),
                    };
                    return Err(e);
                }
            }
        }

        self.metrics = ScenarioMetrics::from_history(self.start_value, &self.history);
        self.state = ScenarioState::Completed;
        debug!(
            scenario = %self.name,
            years = self.config.num_years,
            end_value = self.portfolio.total_value(),
            "scenario completed"
        );
        Ok(())
    }

    fn step<S: ReturnSampler + ?Sized>(
        &mut self,
        sampler: &mut S,
        start_fractions: &[f64],
        t: u32,
        global_year: u32,
    ) -> StockerResult<YearRecord> {
        let start_value = self.portfolio.total_value();

        let position_returns = self
            .portfolio
            .positions()
            .map(|p| {
                Ok(PositionReturn {
                    name: p.name().to_string(),
                    return_pct: sampler.sample_return(p)?,
                })
            })
            .collect::<StockerResult<Vec<_>>>()?;
        let returns: Vec<Percent> = position_returns.iter().map(|r| r.return_pct).collect();
        self.portfolio.apply_return(&returns)?;
        let grown_value = self.portfolio.total_value();

        let cash_flow = self.config.cash_flow_for_year(t);
        self.portfolio.apply_cash_flow(cash_flow)?;

        let scheduled = self.config.allocation_schedule.as_ref().and_then(|s| {
            s.target_weights(start_fractions, t, self.config.num_years)
        });
        match scheduled {
            Some(weights) => self.portfolio.rebalance_to(&weights)?,
            None if self.config.rebalance_annually => self.portfolio.rebalance(),
            None => {}
        }

        let nominal_value = self.portfolio.total_value();
        let inflation = self.config.inflation_rate_pct;
        let blended_return = if start_value > 0.0 {
            grown_value / start_value - 1.0
        } else {
            0.0
        };
        Ok(YearRecord {
            year: global_year,
            start_value,
            cash_flow,
            nominal_value,
            real_value: present_value(nominal_value, global_year, inflation)?,
            position_returns,
            blended_return,
            real_return: (1.0 + blended_return) / (1.0 + inflation / 100.0) - 1.0,
        })
    }
}
