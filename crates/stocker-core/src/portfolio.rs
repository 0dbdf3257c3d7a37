use serde::{Deserialize, Serialize};

use crate::error::StockerError;
use crate::position::Position;
use crate::presets;
use crate::types::{Money, Percent};
use crate::StockerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One allocation inside a portfolio: the position, its target weight and
/// the money currently held in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub position: Position,
    pub weight: f64,
    pub value: Money,
}

/// A named, weighted collection of positions holding a total value.
///
/// The total value is always the sum of the holdings' values. Weights are
/// targets: their normalised shares are what `rebalance` restores, while
/// returns and cash flows move the current shares independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    name: String,
    holdings: Vec<Holding>,
}

/// How a portfolio is written in an input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortfolioSpec {
    Preset {
        preset: String,
        #[serde(default)]
        value: Money,
    },
    Custom {
        name: String,
        #[serde(default)]
        value: Money,
        allocations: Vec<AllocationSpec>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSpec {
    pub position: Position,
    pub weight: f64,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn check_weights(weights: &[f64], strictly_positive: bool) -> StockerResult<f64> {
    if weights.is_empty() {
        return Err(StockerError::config(
            "weights",
            "At least one weight is required",
        ));
    }
    for (i, w) in weights.iter().enumerate() {
        let ok = if strictly_positive { *w > 0.0 } else { *w >= 0.0 };
        if !w.is_finite() || !ok {
            let bound = if strictly_positive { "> 0" } else { ">= 0" };
            return Err(StockerError::config(
                "weights",
                format!("Weight {i} is {w}; weights must be finite and {bound}"),
            ));
        }
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(StockerError::config(
            "weights",
            "Weights must sum to a positive number",
        ));
    }
    Ok(total)
}

fn check_value(value: Money) -> StockerResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(StockerError::config(
            "value",
            format!("Portfolio value must be finite and >= 0, got {value}"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

impl Portfolio {
    /// Create a portfolio and spread `value` over the allocations by weight.
    pub fn new(
        name: impl Into<String>,
        allocations: Vec<(Position, f64)>,
        value: Money,
    ) -> StockerResult<Self> {
        let weights: Vec<f64> = allocations.iter().map(|(_, w)| *w).collect();
        check_weights(&weights, true)?;
        check_value(value)?;

        let mut portfolio = Self {
            name: name.into(),
            holdings: allocations
                .into_iter()
                .map(|(position, weight)| Holding {
                    position,
                    weight,
                    value: 0.0,
                })
                .collect(),
        };
        portfolio.distribute(value);
        Ok(portfolio)
    }

    pub fn from_spec(spec: PortfolioSpec) -> StockerResult<Self> {
        match spec {
            PortfolioSpec::Preset { preset, value } => presets::portfolio(&preset, value),
            PortfolioSpec::Custom {
                name,
                value,
                allocations,
            } => Portfolio::new(
                name,
                allocations
                    .into_iter()
                    .map(|a| (a.position, a.weight))
                    .collect(),
                value,
            ),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.holdings.iter().map(|h| &h.position)
    }

    pub fn weights(&self) -> Vec<f64> {
        self.holdings.iter().map(|h| h.weight).collect()
    }

    pub fn total_value(&self) -> Money {
        self.holdings.iter().map(|h| h.value).sum()
    }

    /// Normalised target shares, `weight / sum(weights)`.
    pub fn target_fractions(&self) -> Vec<f64> {
        let total: f64 = self.holdings.iter().map(|h| h.weight).sum();
        self.holdings.iter().map(|h| h.weight / total).collect()
    }

    /// Current share of the total value held in each position. An empty
    /// portfolio reports its target shares.
    pub fn fractions(&self) -> Vec<f64> {
        let total = self.total_value();
        if total <= 0.0 {
            return self.target_fractions();
        }
        self.holdings.iter().map(|h| h.value / total).collect()
    }

    fn index_of(&self, position: &Position) -> StockerResult<usize> {
        self.holdings
            .iter()
            .position(|h| &h.position == position)
            .ok_or_else(|| {
                StockerError::NotFound(format!(
                    "Position '{}' is not part of portfolio '{}'",
                    position.name(),
                    self.name
                ))
            })
    }

    pub fn fraction_of(&self, position: &Position) -> StockerResult<f64> {
        let i = self.index_of(position)?;
        Ok(self.fractions()[i])
    }

    /// Money held in `position`, i.e. its current fraction times the total.
    pub fn value_of(&self, position: &Position) -> StockerResult<Money> {
        let i = self.index_of(position)?;
        Ok(self.holdings[i].value)
    }

    /// Spread `total` over the holdings by target fraction.
    fn distribute(&mut self, total: Money) {
        let weight_sum: f64 = self.holdings.iter().map(|h| h.weight).sum();
        for h in &mut self.holdings {
            h.value = total * h.weight / weight_sum;
        }
    }

    /// Restore the current target weights without changing the total.
    pub fn rebalance(&mut self) {
        let total = self.total_value();
        self.distribute(total);
    }

    /// Adopt new target weights (one per existing position) and rebalance.
    ///
    /// Individual weights may be zero so a glide path can move a position
    /// out entirely, but they must still sum to a positive number.
    pub fn rebalance_to(&mut self, weights: &[f64]) -> StockerResult<()> {
        if weights.len() != self.holdings.len() {
            return Err(StockerError::config(
                "weights",
                format!(
                    "Expected {} weights for portfolio '{}', got {}",
                    self.holdings.len(),
                    self.name,
                    weights.len()
                ),
            ));
        }
        check_weights(weights, false)?;
        for (h, w) in self.holdings.iter_mut().zip(weights) {
            h.weight = *w;
        }
        self.rebalance();
        Ok(())
    }

    /// Reset the total to `value`, spread by target weights.
    pub fn set_total_value(&mut self, value: Money) -> StockerResult<()> {
        check_value(value)?;
        self.distribute(value);
        Ok(())
    }

    /// Grow each holding by `(1 + r/100)` for its return `r` (percent).
    /// A holding cannot fall below zero. Does not rebalance.
    pub fn apply_return(&mut self, returns: &[Percent]) -> StockerResult<()> {
        if returns.len() != self.holdings.len() {
            return Err(StockerError::config(
                "returns",
                format!(
                    "Expected {} returns for portfolio '{}', got {}",
                    self.holdings.len(),
                    self.name,
                    returns.len()
                ),
            ));
        }
        if let Some(r) = returns.iter().find(|r| !r.is_finite()) {
            return Err(StockerError::config(
                "returns",
                format!("Return must be finite, got {r}"),
            ));
        }
        for (h, r) in self.holdings.iter_mut().zip(returns) {
            h.value = (h.value * (1.0 + r / 100.0)).max(0.0);
        }
        Ok(())
    }

    /// Add (or, when negative, withdraw) `amount` in proportion to the
    /// current shares, so the allocation itself does not move.
    ///
    /// Fails with `Simulation` and leaves the portfolio untouched when the
    /// withdrawal exceeds the total value.
    pub fn apply_cash_flow(&mut self, amount: Money) -> StockerResult<()> {
        if !amount.is_finite() {
            return Err(StockerError::config(
                "amount",
                format!("Cash flow must be finite, got {amount}"),
            ));
        }
        let total = self.total_value();
        if total + amount < 0.0 {
            return Err(StockerError::Simulation(format!(
                "Withdrawal of {:.2} exceeds portfolio '{}' value of {:.2}",
                -amount, self.name, total
            )));
        }
        let shares = self.fractions();
        for (h, share) in self.holdings.iter_mut().zip(shares) {
            h.value = (h.value + amount * share).max(0.0);
        }
        Ok(())
    }
}
