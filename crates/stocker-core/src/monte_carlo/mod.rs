pub mod outliers;
pub mod projection;
pub mod simulation;
pub mod statistics;

pub use outliers::{count_high_outliers, OutlierPolicy};
pub use projection::{run_monte_carlo_projection, MonteCarloInput, MonteCarloOutput};
pub use simulation::{
    GoalLikelihood, MonteCarlo, MonteCarloConfig, MonteCarloSummary, TrialResult, TrialStatus,
};
pub use statistics::{DistributionStats, HistogramBin};
