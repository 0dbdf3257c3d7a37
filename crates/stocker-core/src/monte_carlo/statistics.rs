use serde::{Deserialize, Serialize};

use crate::error::StockerError;
use crate::StockerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Summary of a sample of terminal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    pub median: f64,
    /// Mean absolute deviation about the median.
    pub mad: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p90: f64,
}

/// A single histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
    pub frequency: f64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn sort_values(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
}

/// Compute the percentile value from a **sorted** slice using linear interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Median of |x - median| over a **sorted** slice.
pub fn median_abs_deviation(sorted: &[f64]) -> f64 {
    let median = percentile_sorted(sorted, 50.0);
    let mut deviations: Vec<f64> = sorted.iter().map(|v| (v - median).abs()).collect();
    sort_values(&mut deviations);
    percentile_sorted(&deviations, 50.0)
}

/// Describe a **sorted**, non-empty sample.
pub fn describe_sorted(sorted: &[f64]) -> StockerResult<DistributionStats> {
    if sorted.is_empty() {
        return Err(StockerError::InsufficientData(
            "Statistics need at least one value".into(),
        ));
    }
    let median = percentile_sorted(sorted, 50.0);
    Ok(DistributionStats {
        count: sorted.len(),
        mean: mean(sorted),
        std_dev: sample_std_dev(sorted),
        median,
        mad: sorted.iter().map(|v| (v - median).abs()).sum::<f64>() / sorted.len() as f64,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p10: percentile_sorted(sorted, 10.0),
        p90: percentile_sorted(sorted, 90.0),
    })
}

/// Describe an unsorted sample.
pub fn describe(values: &[f64]) -> StockerResult<DistributionStats> {
    let mut sorted = values.to_vec();
    sort_values(&mut sorted);
    describe_sorted(&sorted)
}

/// Build a histogram with `num_bins` equal-width bins over a **sorted** slice.
pub fn build_histogram(sorted: &[f64], num_bins: usize) -> Vec<HistogramBin> {
    if sorted.is_empty() || num_bins == 0 {
        return Vec::new();
    }
    let min_val = sorted[0];
    let max_val = sorted[sorted.len() - 1];

    if (max_val - min_val).abs() < f64::EPSILON {
        return vec![HistogramBin {
            lower: min_val,
            upper: max_val,
            count: sorted.len() as u32,
            frequency: 1.0,
        }];
    }

    let bin_width = (max_val - min_val) / num_bins as f64;
    let n = sorted.len() as f64;

    let mut bins: Vec<HistogramBin> = (0..num_bins)
        .map(|i| {
            let lower = min_val + i as f64 * bin_width;
            let upper = if i == num_bins - 1 {
                max_val
            } else {
                min_val + (i + 1) as f64 * bin_width
            };
            HistogramBin {
                lower,
                upper,
                count: 0,
                frequency: 0.0,
            }
        })
        .collect();

    for &val in sorted {
        let idx = (((val - min_val) / bin_width).floor() as usize).min(num_bins - 1);
        bins[idx].count += 1;
    }

    for bin in &mut bins {
        bin.frequency = bin.count as f64 / n;
    }

    bins
}
