//! RFQs, quotes and trade confirmations
//!
//! These are the value objects exchanged within one matching round. An RFQ
//! is created by a buy-side agent, every dealer answers it with
//! `Option<Quote>` (`None` is a refusal), and the market turns the winning
//! quote into a pair of confirmations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction of an RFQ, from the requester's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Requester buys; dealers compete to offer lower
    Buy,
    /// Requester sells; dealers compete to bid higher
    Sell,
}

impl Side {
    /// Signed change to a dealer's inventory when filling `amount`
    ///
    /// # Example
    /// ```
    /// use bond_market_simulator_core_rs::Side;
    ///
    /// assert_eq!(Side::Sell.dealer_inventory_change(5.0), 5.0);
    /// assert_eq!(Side::Buy.dealer_inventory_change(5.0), -5.0);
    /// ```
    pub fn dealer_inventory_change(self, amount: f64) -> f64 {
        match self {
            Side::Sell => amount,
            Side::Buy => -amount,
        }
    }

    /// Signed change to the requester's holding when filling `amount`
    pub fn requester_holding_change(self, amount: f64) -> f64 {
        -self.dealer_inventory_change(amount)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order id: requester id plus that requester's RFQ sequence number
///
/// Rendered as `"<agent_id>_<sequence>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId {
    agent_id: String,
    sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed order id: {0}")]
pub struct OrderIdParseError(pub String);

impl OrderId {
    pub fn new(agent_id: impl Into<String>, sequence: u64) -> Self {
        Self {
            agent_id: agent_id.into(),
            sequence,
        }
    }

    /// Requester that issued the RFQ
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.agent_id, self.sequence)
    }
}

impl FromStr for OrderId {
    type Err = OrderIdParseError;

    /// Splits on the last `_`, so agent ids may themselves contain `_`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (agent_id, sequence) = s
            .rsplit_once('_')
            .ok_or_else(|| OrderIdParseError(s.to_string()))?;
        if agent_id.is_empty() {
            return Err(OrderIdParseError(s.to_string()));
        }
        let sequence = sequence
            .parse()
            .map_err(|_| OrderIdParseError(s.to_string()))?;
        Ok(Self::new(agent_id, sequence))
    }
}

/// Request for quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rfq {
    pub order_id: OrderId,
    pub bond: String,
    pub side: Side,
    /// Positive size in face units
    pub amount: f64,
}

/// A dealer's priced answer to an RFQ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub dealer_id: String,
    pub order_id: OrderId,
    pub bond: String,
    pub amount: f64,
    pub side: Side,
    pub price: f64,
}

/// Fill notice addressed to the winning dealer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerConfirm {
    pub dealer_id: String,
    pub order_id: OrderId,
    pub bond: String,
    pub side: Side,
    pub size: f64,
    pub price: f64,
}

/// Fill notice addressed to the requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuySideConfirm {
    pub agent_id: String,
    pub order_id: OrderId,
    pub bond: String,
    pub side: Side,
    pub size: f64,
    pub price: f64,
}
