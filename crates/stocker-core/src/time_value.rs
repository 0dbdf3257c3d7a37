use crate::error::StockerError;
use crate::types::{Money, Percent};
use crate::StockerResult;

/// `(1 + rate_pct/100)^years`
pub fn growth_factor(rate_pct: Percent, years: u32) -> f64 {
    (1.0 + rate_pct / 100.0).powi(years as i32)
}

/// Value of `value` received `years` from now, expressed in today's money.
pub fn present_value(value: Money, years: u32, rate_pct: Percent) -> StockerResult<Money> {
    check_rate(rate_pct)?;
    Ok(value / growth_factor(rate_pct, years))
}

/// Value of `value` today, grown for `years` at `rate_pct`.
pub fn future_value(value: Money, years: u32, rate_pct: Percent) -> StockerResult<Money> {
    check_rate(rate_pct)?;
    Ok(value * growth_factor(rate_pct, years))
}

pub(crate) fn check_rate(rate_pct: Percent) -> StockerResult<()> {
    if !rate_pct.is_finite() || rate_pct <= -100.0 {
        return Err(StockerError::config(
            "rate_pct",
            "Rate must be finite and greater than -100%",
        ));
    }
    Ok(())
}
