pub mod error;
pub mod portfolio;
pub mod position;
pub mod presets;
pub mod sampling;
pub mod scenario;
pub mod time_value;
pub mod types;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

pub use error::StockerError;
pub use types::*;

/// Standard result type for all stocker operations
pub type StockerResult<T> = Result<T, StockerError>;
