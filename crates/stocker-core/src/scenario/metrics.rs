use serde::{Deserialize, Serialize};

use super::engine::YearRecord;
use crate::types::{Money, Rate};

/// Average, best and worst yearly return of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    pub average: Rate,
    pub best: Rate,
    pub best_year: u32,
    pub worst: Rate,
    pub worst_year: u32,
}

impl ReturnMetrics {
    /// Metrics over `(year, return)` pairs. Ties keep the earliest year.
    pub fn from_series(series: impl IntoIterator<Item = (u32, Rate)>) -> Option<Self> {
        let mut iter = series.into_iter();
        let (first_year, first) = iter.next()?;
        let mut metrics = ReturnMetrics {
            average: first,
            best: first,
            best_year: first_year,
            worst: first,
            worst_year: first_year,
        };
        let mut sum = first;
        let mut count = 1u32;
        for (year, r) in iter {
            sum += r;
            count += 1;
            if r > metrics.best {
                metrics.best = r;
                metrics.best_year = year;
            }
            if r < metrics.worst {
                metrics.worst = r;
                metrics.worst_year = year;
            }
        }
        metrics.average = sum / f64::from(count);
        Some(metrics)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub years: u32,
    pub start_value: Money,
    pub end_nominal_value: Money,
    pub end_real_value: Money,
    pub total_cash_flow: Money,
    pub nominal_returns: ReturnMetrics,
    pub real_returns: ReturnMetrics,
}

impl ScenarioMetrics {
    pub fn from_history(start_value: Money, history: &[YearRecord]) -> Option<Self> {
        let last = history.last()?;
        Some(ScenarioMetrics {
            years: history.len() as u32,
            start_value,
            end_nominal_value: last.nominal_value,
            end_real_value: last.real_value,
            total_cash_flow: history.iter().map(|r| r.cash_flow).sum(),
            nominal_returns: ReturnMetrics::from_series(
                history.iter().map(|r| (r.year, r.blended_return)),
            )?,
            real_returns: ReturnMetrics::from_series(
                history.iter().map(|r| (r.year, r.real_return)),
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series() {
        assert!(ReturnMetrics::from_series(Vec::new()).is_none());
    }

    #[test]
    fn test_best_worst_and_average() {
        let m = ReturnMetrics::from_series(vec![(1, 0.10), (2, -0.20), (3, 0.25), (4, 0.05)])
            .unwrap();
        assert!((m.average - 0.05).abs() < 1e-12);
        assert_eq!((m.best, m.best_year), (0.25, 3));
        assert_eq!((m.worst, m.worst_year), (-0.20, 2));
    }

    #[test]
    fn test_ties_keep_first_year() {
        let m = ReturnMetrics::from_series(vec![(1, 0.1), (2, 0.1)]).unwrap();
        assert_eq!(m.best_year, 1);
        assert_eq!(m.worst_year, 1);
    }
}
