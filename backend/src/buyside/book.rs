//! Holdings shared by every buy-side variant

use super::AgentError;
use crate::models::{BuySideConfirm, OrderId, Rfq, Side, PRICE_BASIS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Holding in one bond
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Face amount held
    pub nominal: f64,
    /// Last price this agent has seen (per 100 face)
    pub price: f64,
}

impl Position {
    pub fn new(nominal: f64, price: f64) -> Self {
        Self { nominal, price }
    }

    pub fn value(&self) -> f64 {
        self.nominal * self.price / PRICE_BASIS
    }
}

/// An agent's bond positions plus its RFQ counter
///
/// # Example
/// ```
/// use bond_market_simulator_core_rs::buyside::{Book, Position};
/// use bond_market_simulator_core_rs::Side;
///
/// let mut book = Book::new("b1", vec![("MM101".to_string(), Position::new(75.0, 100.0))]);
/// let rfq = book.make_rfq("MM101", Side::Sell, 10.0);
/// assert_eq!(rfq.order_id.to_string(), "b1_1");
/// assert_eq!(book.compute_portfolio_value(), 75.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    agent_id: String,
    bond_list: Vec<String>,
    positions: BTreeMap<String, Position>,
    rfq_sequence: u64,
}

impl Book {
    /// Positions keep the order given; that order is the agent's bond list
    pub fn new(agent_id: impl Into<String>, positions: Vec<(String, Position)>) -> Self {
        let bond_list = positions.iter().map(|(bond, _)| bond.clone()).collect();
        Self {
            agent_id: agent_id.into(),
            bond_list,
            positions: positions.into_iter().collect(),
            rfq_sequence: 0,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn bond_list(&self) -> &[String] {
        &self.bond_list
    }

    pub fn position(&self, bond: &str) -> Option<&Position> {
        self.positions.get(bond)
    }

    pub fn rfq_sequence(&self) -> u64 {
        self.rfq_sequence
    }

    /// Next RFQ with a fresh order id
    pub fn make_rfq(&mut self, bond: &str, side: Side, amount: f64) -> Rfq {
        self.rfq_sequence += 1;
        Rfq {
            order_id: OrderId::new(self.agent_id.clone(), self.rfq_sequence),
            bond: bond.to_string(),
            side,
            amount,
        }
    }

    pub fn update_prices(&mut self, prices: &BTreeMap<String, f64>) -> Result<(), AgentError> {
        for bond in &self.bond_list {
            let price = prices.get(bond).ok_or_else(|| AgentError::MissingPrice {
                agent: self.agent_id.clone(),
                bond: bond.clone(),
            })?;
            if let Some(position) = self.positions.get_mut(bond) {
                position.price = *price;
            }
        }
        Ok(())
    }

    /// Σ nominal × price / 100 at cached prices
    pub fn compute_portfolio_value(&self) -> f64 {
        self.bond_list
            .iter()
            .filter_map(|bond| self.positions.get(bond))
            .map(Position::value)
            .sum()
    }

    /// Apply a fill and return the resulting change in cash
    pub fn apply_fill(&mut self, confirm: &BuySideConfirm) -> Result<f64, AgentError> {
        let position = self
            .positions
            .get_mut(&confirm.bond)
            .ok_or_else(|| AgentError::UnknownBond {
                agent: self.agent_id.clone(),
                bond: confirm.bond.clone(),
            })?;
        let change = confirm.side.requester_holding_change(confirm.size);
        position.nominal += change;
        position.price = confirm.price;
        Ok(-change * confirm.price / PRICE_BASIS)
    }
}
