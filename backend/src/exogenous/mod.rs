//! Exogenous market inputs
//!
//! The simulation is driven by two external series, both indexed by step:
//!
//! - `yield_changes[step][i]`: end-of-day yield change of the i-th
//!   registered bond
//! - `equity_returns[step]`: daily equity return; the insurance company
//!   applies `equity_returns[step - 1]` when deciding on `step`
//!
//! Historical series are loaded by the embedding runner and handed over as
//! [`MarketData`] (directly or as JSON). [`SyntheticMarketConfig`] generates
//! a seeded stand-in for tests and experiments.

use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketDataError {
    #[error("market data is not valid JSON: {0}")]
    Parse(String),

    #[error("{series} covers {available} steps, the run needs {required}")]
    TooShort {
        series: &'static str,
        available: usize,
        required: usize,
    },

    #[error("yield change row {step} has {found} columns, expected {expected}")]
    RaggedRow {
        step: usize,
        expected: usize,
        found: usize,
    },

    #[error("non-finite value in {series} at step {step}")]
    NonFinite { series: &'static str, step: usize },
}

/// Step-indexed yield-curve changes and equity returns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub yield_changes: Vec<Vec<f64>>,
    #[serde(default)]
    pub equity_returns: Vec<f64>,
}

impl MarketData {
    pub fn new(yield_changes: Vec<Vec<f64>>, equity_returns: Vec<f64>) -> Self {
        Self {
            yield_changes,
            equity_returns,
        }
    }

    /// Flat curve and zero equity returns for `num_steps` steps
    pub fn flat(num_steps: usize, num_bonds: usize) -> Self {
        Self {
            yield_changes: vec![vec![0.0; num_bonds]; num_steps],
            equity_returns: vec![0.0; num_steps],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, MarketDataError> {
        serde_json::from_str(json).map_err(|e| MarketDataError::Parse(e.to_string()))
    }

    pub fn yield_changes(&self, step: usize) -> Option<&[f64]> {
        self.yield_changes.get(step).map(Vec::as_slice)
    }

    pub fn equity_return(&self, step: usize) -> Option<f64> {
        self.equity_returns.get(step).copied()
    }

    /// Check coverage for a run whose last trading step is `last_step`
    pub fn validate(
        &self,
        num_bonds: usize,
        last_step: usize,
        needs_equity: bool,
    ) -> Result<(), MarketDataError> {
        if self.yield_changes.len() <= last_step {
            return Err(MarketDataError::TooShort {
                series: "yield_changes",
                available: self.yield_changes.len(),
                required: last_step + 1,
            });
        }
        for (step, row) in self.yield_changes.iter().enumerate() {
            if row.len() != num_bonds {
                return Err(MarketDataError::RaggedRow {
                    step,
                    expected: num_bonds,
                    found: row.len(),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(MarketDataError::NonFinite {
                    series: "yield_changes",
                    step,
                });
            }
        }
        if needs_equity {
            if self.equity_returns.len() < last_step {
                return Err(MarketDataError::TooShort {
                    series: "equity_returns",
                    available: self.equity_returns.len(),
                    required: last_step,
                });
            }
            if let Some(step) = self.equity_returns.iter().position(|v| !v.is_finite()) {
                return Err(MarketDataError::NonFinite {
                    series: "equity_returns",
                    step,
                });
            }
        }
        Ok(())
    }
}

/// Gaussian random-walk generator for [`MarketData`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticMarketConfig {
    /// Mean daily yield change
    pub yield_drift: f64,
    /// Standard deviation of daily yield changes
    pub yield_volatility: f64,
    /// Mean daily equity return
    pub equity_drift: f64,
    /// Standard deviation of daily equity returns
    pub equity_volatility: f64,
}

impl Default for SyntheticMarketConfig {
    fn default() -> Self {
        Self {
            yield_drift: 0.0,
            yield_volatility: 0.0005,
            equity_drift: 0.0003,
            equity_volatility: 0.01,
        }
    }
}

impl SyntheticMarketConfig {
    /// Draw `num_steps` rows of yield changes and equity returns
    ///
    /// Each row draws its bond columns in order, then the equity return.
    pub fn generate(&self, num_steps: usize, num_bonds: usize, rng: &mut RngManager) -> MarketData {
        let mut yield_changes = Vec::with_capacity(num_steps);
        let mut equity_returns = Vec::with_capacity(num_steps);
        for _ in 0..num_steps {
            let row = (0..num_bonds)
                .map(|_| self.yield_drift + self.yield_volatility * sample_standard_normal(rng))
                .collect();
            yield_changes.push(row);
            equity_returns.push(self.equity_drift + self.equity_volatility * sample_standard_normal(rng));
        }
        MarketData {
            yield_changes,
            equity_returns,
        }
    }
}

/// Box-Muller standard normal draw
fn sample_standard_normal(rng: &mut RngManager) -> f64 {
    // (0, 1] keeps ln finite
    let u1 = 1.0 - rng.next_f64();
    let u2 = rng.next_f64();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
