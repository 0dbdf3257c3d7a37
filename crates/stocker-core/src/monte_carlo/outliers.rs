use serde::{Deserialize, Serialize};

use super::statistics::{median_abs_deviation, percentile_sorted};
use crate::error::StockerError;
use crate::StockerResult;

/// Rule for dropping the high tail of terminal values before summary
/// statistics are computed. Only the statistics view is trimmed; stored
/// trials are never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierPolicy {
    /// Keep everything.
    None,
    /// Up to `passes` times, drop values at or above
    /// `median + multiplier * median_abs_deviation`. Stops early once the
    /// deviation is zero or nothing is dropped.
    MedianAbsoluteDeviation { multiplier: f64, passes: u32 },
    /// Drop values above the given percentile of the sample.
    Percentile { upper_percentile: f64 },
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        OutlierPolicy::MedianAbsoluteDeviation {
            multiplier: 4.0,
            passes: 3,
        }
    }
}

impl OutlierPolicy {
    pub fn validate(&self) -> StockerResult<()> {
        match self {
            OutlierPolicy::None => Ok(()),
            OutlierPolicy::MedianAbsoluteDeviation { multiplier, .. } => {
                if !multiplier.is_finite() || *multiplier <= 0.0 {
                    return Err(StockerError::config(
                        "outlier_policy.multiplier",
                        "Must be finite and > 0",
                    ));
                }
                Ok(())
            }
            OutlierPolicy::Percentile { upper_percentile } => {
                if !(0.0..=100.0).contains(upper_percentile) || *upper_percentile == 0.0 {
                    return Err(StockerError::config(
                        "outlier_policy.upper_percentile",
                        "Must be in (0, 100]",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Number of values to keep from the bottom of a **sorted** sample.
    fn keep_count(&self, sorted: &[f64]) -> usize {
        match self {
            OutlierPolicy::None => sorted.len(),
            OutlierPolicy::MedianAbsoluteDeviation { multiplier, passes } => {
                let mut kept = sorted.len();
                for _ in 0..*passes {
                    let view = &sorted[..kept];
                    let mad = median_abs_deviation(view);
                    if view.is_empty() || mad <= 0.0 {
                        break;
                    }
                    let cutoff = percentile_sorted(view, 50.0) + multiplier * mad;
                    let next = view.partition_point(|v| *v < cutoff);
                    if next == kept {
                        break;
                    }
                    kept = next;
                }
                kept
            }
            OutlierPolicy::Percentile { upper_percentile } => {
                let cutoff = percentile_sorted(sorted, *upper_percentile);
                sorted.partition_point(|v| *v <= cutoff)
            }
        }
    }
}

/// Number of high-end values `policy` removes from a **sorted** sample,
/// capped at `max_removed` when given.
pub fn count_high_outliers(
    sorted: &[f64],
    policy: &OutlierPolicy,
    max_removed: Option<usize>,
) -> usize {
    let removed = sorted.len() - policy.keep_count(sorted);
    match max_removed {
        Some(cap) => removed.min(cap),
        None => removed,
    }
}
