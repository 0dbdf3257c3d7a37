use serde::{Deserialize, Serialize};

use crate::error::StockerError;
use crate::StockerResult;

/// Target weights adopted in `from_year` (1-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStep {
    pub from_year: u32,
    pub weights: Vec<f64>,
}

/// A time-varying target allocation (glide path).
///
/// Targets depend only on the year index, so the schedule itself never
/// changes during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationSchedule {
    /// Move linearly from the starting shares in year 1 to `end_weights`'
    /// shares in the final year.
    Linear { end_weights: Vec<f64> },
    /// Switch to each step's weights in its `from_year`; the weights are
    /// then kept until the next step.
    Steps { steps: Vec<ScheduleStep> },
}

fn check_vector(weights: &[f64], expected: usize, field: &str) -> StockerResult<f64> {
    if weights.len() != expected {
        return Err(StockerError::config(
            field,
            format!("Expected {expected} weights, got {}", weights.len()),
        ));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(StockerError::config(field, "Weights must be finite and >= 0"));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(StockerError::config(field, "Weights must sum to a positive number"));
    }
    Ok(total)
}

impl AllocationSchedule {
    pub fn validate(&self, num_positions: usize, num_years: u32) -> StockerResult<()> {
        match self {
            AllocationSchedule::Linear { end_weights } => {
                check_vector(end_weights, num_positions, "end_weights")?;
            }
            AllocationSchedule::Steps { steps } => {
                if steps.is_empty() {
                    return Err(StockerError::config("steps", "At least one step is required"));
                }
                for pair in steps.windows(2) {
                    if pair[1].from_year <= pair[0].from_year {
                        return Err(StockerError::config(
                            "steps",
                            "Steps must be in strictly increasing from_year order",
                        ));
                    }
                }
                for step in steps {
                    if step.from_year < 1 || step.from_year > num_years {
                        return Err(StockerError::config(
                            "steps",
                            format!("from_year {} is outside 1..={num_years}", step.from_year),
                        ));
                    }
                    check_vector(&step.weights, num_positions, "steps")?;
                }
            }
        }
        Ok(())
    }

    /// Target weights for `year` (1-based) of a `num_years` run, given the
    /// portfolio's starting fractions. `None` means no scheduled change in
    /// that year: a linear path changes every year, steps only in their
    /// `from_year`.
    pub fn target_weights(
        &self,
        start_fractions: &[f64],
        year: u32,
        num_years: u32,
    ) -> Option<Vec<f64>> {
        match self {
            AllocationSchedule::Linear { end_weights } => {
                let end_total: f64 = end_weights.iter().sum();
                let progress = if num_years <= 1 {
                    1.0
                } else {
                    f64::from(year.clamp(1, num_years) - 1) / f64::from(num_years - 1)
                };
                Some(
                    start_fractions
                        .iter()
                        .zip(end_weights)
                        .map(|(start, end)| start + (end / end_total - start) * progress)
                        .collect(),
                )
            }
            AllocationSchedule::Steps { steps } => steps
                .iter()
                .find(|s| s.from_year == year)
                .map(|s| s.weights.clone()),
        }
    }
}
