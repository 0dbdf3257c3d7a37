//! Built-in asset classes and portfolios.
//!
//! Long-term historical averages (Ibbotson Associates, MSCI, S&P, Shiller
//! and the Bogleheads returns table). These are input data for the engine,
//! not predictions.

use serde::Serialize;

use crate::error::StockerError;
use crate::portfolio::Portfolio;
use crate::position::Position;
use crate::types::{Money, Percent};
use crate::StockerResult;

/// Built-in asset class: lookup key, display name, average return, std dev.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PresetPosition {
    pub key: &'static str,
    pub name: &'static str,
    pub average_return: Percent,
    pub std_dev: Percent,
}

/// Built-in portfolio: lookup key, display name and (position key, weight) pairs.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PresetPortfolio {
    pub key: &'static str,
    pub name: &'static str,
    pub allocations: &'static [(&'static str, f64)],
}

const fn asset(
    key: &'static str,
    name: &'static str,
    average_return: Percent,
    std_dev: Percent,
) -> PresetPosition {
    PresetPosition {
        key,
        name,
        average_return,
        std_dev,
    }
}

pub const POSITIONS: &[PresetPosition] = &[
    asset("us_stocks", "Domestic Equities", 10.2, 19.8),
    asset("international_stocks", "International Equities", 9.2, 22.1),
    asset("us_bonds", "Domestic Fixed Income", 5.3, 5.8),
    asset("international_bonds", "International Fixed Income", 5.5, 9.1),
    asset("alternatives", "Alternatives", 6.1, 16.1),
    asset("cash", "Cash", 3.4, 3.1),
    asset("large_cap_stocks", "Large Company Stocks", 10.4, 20.2),
    asset("small_cap_stocks", "Small Company Stocks", 12.6, 32.9),
    asset("long_term_corp_bonds", "Long-term Corporate Bonds", 5.9, 8.5),
    asset("long_term_gov_bonds", "Long-term Government Bonds", 5.3, 5.7),
    asset("us_treasury_bills", "U.S. Treasury Bills", 3.8, 3.1),
];

// 70% US / 30% international within each asset class.
pub const PORTFOLIOS: &[PresetPortfolio] = &[
    PresetPortfolio {
        key: "all_stocks",
        name: "All Stocks",
        allocations: &[("us_stocks", 7.0), ("international_stocks", 3.0)],
    },
    PresetPortfolio {
        key: "all_bonds",
        name: "All Bonds",
        allocations: &[("us_bonds", 7.0), ("international_bonds", 3.0)],
    },
    PresetPortfolio {
        key: "all_us_stocks",
        name: "All US Stocks",
        allocations: &[("us_stocks", 1.0)],
    },
    PresetPortfolio {
        key: "all_us_bonds",
        name: "All US Bonds",
        allocations: &[("us_bonds", 1.0)],
    },
    PresetPortfolio {
        key: "fifty_fifty",
        name: "Fifty Fifty",
        allocations: &[
            ("us_stocks", 7.0),
            ("international_stocks", 3.0),
            ("us_bonds", 7.0),
            ("international_bonds", 3.0),
        ],
    },
    PresetPortfolio {
        key: "sixty_forty",
        name: "Sixty Forty",
        allocations: &[
            ("us_stocks", 42.0),
            ("international_stocks", 18.0),
            ("us_bonds", 28.0),
            ("international_bonds", 12.0),
        ],
    },
];

/// Look up a built-in position by key.
pub fn position(key: &str) -> StockerResult<Position> {
    POSITIONS
        .iter()
        .find(|p| p.key == key)
        .map(|p| Position::from_static(p.name.to_string(), p.average_return, p.std_dev))
        .ok_or_else(|| StockerError::NotFound(format!("No built-in position named '{key}'")))
}

/// Build a built-in portfolio holding `value`.
pub fn portfolio(key: &str, value: Money) -> StockerResult<Portfolio> {
    let preset = PORTFOLIOS
        .iter()
        .find(|p| p.key == key)
        .ok_or_else(|| StockerError::NotFound(format!("No built-in portfolio named '{key}'")))?;
    let allocations = preset
        .allocations
        .iter()
        .map(|(k, w)| Ok((position(k)?, *w)))
        .collect::<StockerResult<Vec<_>>>()?;
    Portfolio::new(preset.name, allocations, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_portfolio_builds() {
        for preset in PORTFOLIOS {
            let p = portfolio(preset.key, 1000.0).unwrap();
            assert!((p.total_value() - 1000.0).abs() < 1e-9, "{}", preset.key);
        }
    }

    #[test]
    fn test_every_preset_position_is_valid() {
        for preset in POSITIONS {
            let p = position(preset.key).unwrap();
            assert!(Position::new(p.name(), p.average_return(), p.std_dev()).is_ok());
        }
    }

    #[test]
    fn test_sixty_forty_split() {
        let p = portfolio("sixty_forty", 100.0).unwrap();
        let stocks: f64 = p.fractions()[..2].iter().sum();
        assert!((stocks - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_keys() {
        assert!(matches!(position("bitcoin"), Err(StockerError::NotFound(_))));
        assert!(matches!(portfolio("yolo", 1.0), Err(StockerError::NotFound(_))));
    }
}
