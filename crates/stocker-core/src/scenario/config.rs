use serde::{Deserialize, Serialize};

use super::schedule::AllocationSchedule;
use crate::error::StockerError;
use crate::portfolio::Portfolio;
use crate::time_value::{check_rate, growth_factor};
use crate::types::{Money, Percent};
use crate::StockerResult;

pub const DEFAULT_INFLATION_RATE_PCT: Percent = 3.5;

fn default_rebalance() -> bool {
    true
}

fn default_inflation_rate_pct() -> Percent {
    DEFAULT_INFLATION_RATE_PCT
}

/// Settings for one multi-year scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Length of the simulation in years (at least 1).
    pub num_years: u32,
    /// Amount added at the end of year 1. Negative values withdraw.
    #[serde(default)]
    pub annual_contribution: Money,
    #[serde(default, alias = "annual_contribution_increase_perc")]
    pub annual_contribution_increase_pct: Percent,
    /// Amount withdrawn at the end of year 1.
    #[serde(default)]
    pub annual_distribution: Money,
    #[serde(default, alias = "annual_distribution_increase_perc")]
    pub annual_distribution_increase_pct: Percent,
    #[serde(default = "default_rebalance")]
    pub rebalance_annually: bool,
    #[serde(default = "default_inflation_rate_pct")]
    pub inflation_rate_pct: Percent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation_schedule: Option<AllocationSchedule>,
}

impl ScenarioConfig {
    pub fn new(num_years: u32) -> Self {
        Self {
            num_years,
            annual_contribution: 0.0,
            annual_contribution_increase_pct: 0.0,
            annual_distribution: 0.0,
            annual_distribution_increase_pct: 0.0,
            rebalance_annually: true,
            inflation_rate_pct: DEFAULT_INFLATION_RATE_PCT,
            allocation_schedule: None,
        }
    }

    pub fn validate(&self, portfolio: &Portfolio) -> StockerResult<()> {
        if self.num_years < 1 {
            return Err(StockerError::config("num_years", "Must be at least 1"));
        }
        if !self.annual_contribution.is_finite() {
            return Err(StockerError::config(
                "annual_contribution",
                "Must be finite",
            ));
        }
        if !self.annual_distribution.is_finite() || self.annual_distribution < 0.0 {
            return Err(StockerError::config(
                "annual_distribution",
                "Must be finite and >= 0",
            ));
        }
        for (field, rate) in [
            (
                "annual_contribution_increase_pct",
                self.annual_contribution_increase_pct,
            ),
            (
                "annual_distribution_increase_pct",
                self.annual_distribution_increase_pct,
            ),
            ("inflation_rate_pct", self.inflation_rate_pct),
        ] {
            check_rate(rate).map_err(|_| {
                StockerError::config(field, "Must be finite and greater than -100%")
            })?;
        }
        if let Some(schedule) = &self.allocation_schedule {
            schedule.validate(portfolio.len(), self.num_years)?;
        }
        Ok(())
    }

    /// Net cash flow at the end of year `year` (1-based): the grown
    /// contribution minus the grown distribution.
    pub fn cash_flow_for_year(&self, year: u32) -> Money {
        let elapsed = year.saturating_sub(1);
        self.annual_contribution * growth_factor(self.annual_contribution_increase_pct, elapsed)
            - self.annual_distribution
                * growth_factor(self.annual_distribution_increase_pct, elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn portfolio() -> Portfolio {
        let p = Position::new("Stocks", 10.0, 20.0).unwrap();
        Portfolio::new("p", vec![(p, 1.0)], 100.0).unwrap()
    }

    #[test]
    fn test_defaults_from_json() {
        let c: ScenarioConfig = serde_json::from_str(r#"{"num_years": 30}"#).unwrap();
        assert!(c.rebalance_annually);
        assert_eq!(c.inflation_rate_pct, 3.5);
        assert_eq!(c.annual_contribution, 0.0);
        assert!(c.allocation_schedule.is_none());
    }

    #[test]
    fn test_perc_alias() {
        let c: ScenarioConfig = serde_json::from_str(
            r#"{"num_years": 5, "annual_contribution": 100, "annual_contribution_increase_perc": 2.0}"#,
        )
        .unwrap();
        assert_eq!(c.annual_contribution_increase_pct, 2.0);
    }

    #[test]
    fn test_cash_flow_growth() {
        let mut c = ScenarioConfig::new(10);
        c.annual_contribution = 20_000.0;
        c.annual_contribution_increase_pct = 2.0;
        assert_eq!(c.cash_flow_for_year(1), 20_000.0);
        assert!((c.cash_flow_for_year(3) - 20_000.0 * 1.02 * 1.02).abs() < 1e-9);
    }

    #[test]
    fn test_contribution_and_distribution_net() {
        let mut c = ScenarioConfig::new(10);
        c.annual_contribution = 1_000.0;
        c.annual_distribution = 400.0;
        c.annual_distribution_increase_pct = 10.0;
        assert!((c.cash_flow_for_year(2) - (1_000.0 - 440.0)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_years_rejected() {
        let c = ScenarioConfig::new(0);
        assert!(matches!(
            c.validate(&portfolio()),
            Err(StockerError::Configuration { .. })
        ));
    }

    #[test]
    fn test_negative_distribution_rejected() {
        let mut c = ScenarioConfig::new(3);
        c.annual_distribution = -1.0;
        assert!(c.validate(&portfolio()).is_err());
    }

    #[test]
    fn test_bad_inflation_rejected() {
        let mut c = ScenarioConfig::new(3);
        c.inflation_rate_pct = -100.0;
        assert!(c.validate(&portfolio()).is_err());
    }
}
