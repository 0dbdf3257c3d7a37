use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

use crate::error::StockerError;
use crate::position::Position;
use crate::types::Percent;
use crate::StockerResult;

/// Source of annual returns for a simulation.
///
/// Each call yields one year's return for one position, in percent.
/// Positions are sampled independently of one another.
pub trait ReturnSampler {
    fn sample_return(&mut self, position: &Position) -> StockerResult<Percent>;
}

impl<T: ReturnSampler + ?Sized> ReturnSampler for &mut T {
    fn sample_return(&mut self, position: &Position) -> StockerResult<Percent> {
        (**self).sample_return(position)
    }
}

/// Draws each return from `Normal(average_return, std_dev)`.
#[derive(Debug, Clone)]
pub struct NormalReturns<R = StdRng> {
    rng: R,
}

impl NormalReturns<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> NormalReturns<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ReturnSampler for NormalReturns<R> {
    fn sample_return(&mut self, position: &Position) -> StockerResult<Percent> {
        // A zero-width distribution is just its mean.
        if position.std_dev() == 0.0 {
            return Ok(position.average_return());
        }
        let dist = Normal::new(position.average_return(), position.std_dev()).map_err(|e| {
            StockerError::config(
                "std_dev",
                format!("Invalid Normal parameters for '{}': {e}", position.name()),
            )
        })?;
        Ok(self.rng.sample(dist))
    }
}

/// Always returns the position's average return. Gives the expected-value
/// path of a scenario.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectedReturns;

impl ReturnSampler for ExpectedReturns {
    fn sample_return(&mut self, position: &Position) -> StockerResult<Percent> {
        Ok(position.average_return())
    }
}

/// Seed for trial `trial` of a batch seeded with `base` (splitmix64).
pub fn trial_seed(base: u64, trial: u64) -> u64 {
    let mut z = base.wrapping_add(trial.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
