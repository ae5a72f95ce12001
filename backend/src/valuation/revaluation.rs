//! End-of-day revaluation and parallel yield shocks

use super::ValuationError;
use crate::models::bond::Bond;
use serde::{Deserialize, Serialize};

/// How the end-of-day yield change is turned into a new price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevaluationMode {
    /// Solve the implied yield of the starting price, add the change, reprice
    #[default]
    Exact,
    /// `price × (1 − D_mod × Δy)` with `D_mod` taken at the implied yield;
    /// first order only
    Duration,
}

/// Revalue `bond` from `start_price` for a yield change of `ytm_delta`
///
/// The bond's yield and price are both updated; the new price is returned.
/// A failed root solve is returned as an error and leaves the bond untouched.
pub fn revalue_end_of_day(
    bond: &mut Bond,
    start_price: f64,
    ytm_delta: f64,
    mode: RevaluationMode,
) -> Result<f64, ValuationError> {
    let implied = bond.implied_yield(start_price)?;
    let ytm = implied + ytm_delta;
    let price = match mode {
        RevaluationMode::Exact => bond.price_at(ytm)?,
        RevaluationMode::Duration => start_price * (1.0 - bond.duration_at(implied)? * ytm_delta),
    };
    if !price.is_finite() || price <= 0.0 {
        return Err(ValuationError::InvalidInput {
            field: "price".to_string(),
            reason: format!("revaluation of {} produced {}", bond.name(), price),
        });
    }
    bond.set_market_state(ytm, price);
    Ok(price)
}

/// Parallel shift of the yield followed by a closed-form reprice
pub fn shock(bond: &mut Bond, parallel_shift: f64) -> Result<f64, ValuationError> {
    let ytm = bond.ytm() + parallel_shift;
    let price = bond.price_at(ytm)?;
    bond.set_market_state(ytm, price);
    Ok(price)
}
