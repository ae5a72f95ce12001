//! Bond valuation
//!
//! Closed-form level-coupon pricing, modified duration, implied-yield
//! root-finding, and the two end-of-day revaluation policies.
//!
//! Prices are quoted per `nominal` face; the market registry quotes every
//! bond per 100 face.

mod pricing;
mod revaluation;

pub use pricing::{coupon_periods, duration, implied_yield, price, MAX_NEWTON_ITERATIONS};
pub use revaluation::{revalue_end_of_day, shock, RevaluationMode};

use thiserror::Error;

/// Errors raised by the bond math
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("implied yield did not converge after {iterations} iterations (residual {residual:e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },
}
