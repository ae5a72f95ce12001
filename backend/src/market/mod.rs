//! Bond market: registry, last-price table, trade ledger and RFQ matching
//!
//! The market is the only component that owns [`Bond`](crate::models::Bond)
//! state. Agents keep their own cached prices and refresh them from
//! [`BondMarket::last_prices`] at the end of each step.
//!
//! # Ordering
//!
//! `match_trade` records the trade and moves the last price before it
//! returns, so the next RFQ in the same step is quoted against the fresh
//! price.

mod bond_market;

pub use bond_market::BondMarket;

use crate::valuation::ValuationError;
use thiserror::Error;

/// Market-level failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketError {
    #[error("bond {0} is already registered")]
    DuplicateBond(String),

    #[error("unknown bond {0}")]
    UnknownBond(String),

    #[error("cannot price bond {bond}: {source}")]
    InvalidBond {
        bond: String,
        #[source]
        source: ValuationError,
    },

    #[error("no quotes to match for order {order_id}")]
    NoQuotes { order_id: String },

    #[error("quotes for order {order_id} disagree on order, bond or side")]
    MismatchedQuotes { order_id: String },

    #[error("no yield changes for step {step}: expected {expected} columns, found {found}")]
    MissingYieldChanges {
        step: usize,
        expected: usize,
        found: usize,
    },

    #[error("revaluation of {bond} failed on step {step}: {source}")]
    Revaluation {
        bond: String,
        step: usize,
        #[source]
        source: ValuationError,
    },
}
