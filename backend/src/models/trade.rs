//! Trade ledger entries and price snapshots

use super::order::{OrderId, Side};
use serde::{Deserialize, Serialize};

/// One executed trade
///
/// Written once by the market; `sequence` is global and strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub sequence: u64,
    pub step: usize,
    pub dealer_id: String,
    pub order_id: OrderId,
    pub bond: String,
    pub side: Side,
    pub size: f64,
    pub price: f64,
}

/// The last-price table as it stood at the end of `step`
///
/// Prices are listed in bond registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub step: usize,
    pub prices: Vec<(String, f64)>,
}

impl PriceSnapshot {
    pub fn price(&self, bond: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|(name, _)| name == bond)
            .map(|(_, price)| *price)
    }
}
