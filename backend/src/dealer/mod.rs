//! Dealer quoting engine
//!
//! Dealers answer every RFQ with an inventory-skewed price in the manner of
//! Treynor's market-maker model:
//!
//! ```text
//! outside = (upper_bound + lower_bound) × P
//! inside  = spread_factor × outside / (UpperLimit − LowerLimit)
//! e       = Quantity ± amount              (sell RFQ: +, buy RFQ: −)
//! f       = 1 − Specialization / 10
//!
//! e < 0 (short):  ask = (1 + (e / LowerLimit) × f × upper_bound) × P,  bid = ask − inside
//! e > 0 (long):   bid = (1 − (e / UpperLimit) × f × lower_bound) × P,  ask = bid + inside
//! e = 0 (flat):   bid = P − inside / 2,  ask = P + inside / 2
//! ```
//!
//! A seller is quoted the bid, a buyer the ask. On either side of flat the
//! anchored price falls as post-trade inventory rises. An RFQ that would take
//! inventory outside `[LowerLimit, UpperLimit]` gets no quote at all.

use crate::models::{DealerConfirm, Quote, Rfq, Side};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Dealer failures (misconfiguration, not inventory refusals)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DealerError {
    #[error("dealer {dealer} does not make markets in {bond}")]
    UnknownBond { dealer: String, bond: String },

    #[error("dealer {dealer} received no price for {bond}")]
    MissingPrice { dealer: String, bond: String },

    #[error("dealer {dealer} specialization for {bond} must be in [0, 1], got {value}")]
    InvalidSpecialization {
        dealer: String,
        bond: String,
        value: f64,
    },

    #[error("fill of {size} {bond} would take dealer {dealer} to {quantity}, outside [{lower}, {upper}]")]
    LimitBreach {
        dealer: String,
        bond: String,
        size: f64,
        quantity: f64,
        lower: f64,
        upper: f64,
    },
}

/// Yield-shock band used to size the outside spread
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutsideBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for OutsideBounds {
    fn default() -> Self {
        Self {
            lower: 0.01,
            upper: 0.0125,
        }
    }
}

impl OutsideBounds {
    pub fn scaled(self, multiplier: f64) -> Self {
        Self {
            lower: self.lower * multiplier,
            upper: self.upper * multiplier,
        }
    }
}

/// One bond in a dealer's book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerPosition {
    /// Issue size the limits are scaled from
    pub nominal: f64,
    /// Reference price (per 100 face)
    pub price: f64,
    /// 0 = generalist, 1 = specialist
    pub specialization: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
    /// Net inventory since the last limit reset
    pub quantity: f64,
}

impl DealerPosition {
    pub fn new(nominal: f64, price: f64, specialization: f64) -> Self {
        Self {
            nominal,
            price,
            specialization,
            lower_limit: 0.0,
            upper_limit: 0.0,
            quantity: 0.0,
        }
    }
}

/// A market maker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dealer {
    id: String,
    bond_list: Vec<String>,
    positions: BTreeMap<String, DealerPosition>,
    base_bounds: OutsideBounds,
    bounds: OutsideBounds,
    spread_factor: f64,
}

impl Dealer {
    /// Build a dealer and set its limits from `long_limit`/`short_limit`
    ///
    /// Positions keep the order given; that order is the dealer's bond list.
    pub fn new(
        id: impl Into<String>,
        positions: Vec<(String, DealerPosition)>,
        long_limit: f64,
        short_limit: f64,
        bounds: OutsideBounds,
        spread_factor: f64,
    ) -> Result<Self, DealerError> {
        let id = id.into();
        for (bond, position) in &positions {
            if !(0.0..=1.0).contains(&position.specialization) {
                return Err(DealerError::InvalidSpecialization {
                    dealer: id,
                    bond: bond.clone(),
                    value: position.specialization,
                });
            }
        }
        let bond_list = positions.iter().map(|(bond, _)| bond.clone()).collect();
        let mut dealer = Self {
            id,
            bond_list,
            positions: positions.into_iter().collect(),
            base_bounds: bounds,
            bounds,
            spread_factor,
        };
        dealer.update_limits(long_limit, short_limit);
        Ok(dealer)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bond_list(&self) -> &[String] {
        &self.bond_list
    }

    pub fn position(&self, bond: &str) -> Option<&DealerPosition> {
        self.positions.get(bond)
    }

    /// Outside bounds currently in force
    pub fn bounds(&self) -> OutsideBounds {
        self.bounds
    }

    pub fn base_bounds(&self) -> OutsideBounds {
        self.base_bounds
    }

    pub fn spread_factor(&self) -> f64 {
        self.spread_factor
    }

    /// Reset limits to `[-nominal × short, nominal × long]` and flatten
    /// inventory
    pub fn update_limits(&mut self, long_limit: f64, short_limit: f64) {
        for position in self.positions.values_mut() {
            position.lower_limit = -position.nominal * short_limit;
            position.upper_limit = position.nominal * long_limit;
            position.quantity = 0.0;
        }
    }

    /// Refresh reference prices from the market's last-price table
    pub fn update_prices(&mut self, prices: &BTreeMap<String, f64>) -> Result<(), DealerError> {
        for bond in &self.bond_list {
            let price = prices.get(bond).ok_or_else(|| DealerError::MissingPrice {
                dealer: self.id.clone(),
                bond: bond.clone(),
            })?;
            if let Some(position) = self.positions.get_mut(bond) {
                position.price = *price;
            }
        }
        Ok(())
    }

    /// Rescale the outside bounds from their configured base
    pub fn set_bound_multiplier(&mut self, multiplier: f64) {
        self.bounds = self.base_bounds.scaled(multiplier);
    }

    /// Price an RFQ, or `None` if filling it would breach inventory limits
    pub fn make_quote(&self, rfq: &Rfq) -> Result<Option<Quote>, DealerError> {
        let position = self.positions.get(&rfq.bond).ok_or_else(|| DealerError::UnknownBond {
            dealer: self.id.clone(),
            bond: rfq.bond.clone(),
        })?;

        let expected = position.quantity + rfq.side.dealer_inventory_change(rfq.amount);
        let inventory_range = position.upper_limit - position.lower_limit;
        if inventory_range <= 0.0
            || expected < position.lower_limit
            || expected > position.upper_limit
        {
            return Ok(None);
        }

        let outside_spread = (self.bounds.upper + self.bounds.lower) * position.price;
        let inside_spread = self.spread_factor * outside_spread / inventory_range;
        let damping = 1.0 - position.specialization / 10.0;

        // Short after the trade: the ask is anchored, long: the bid is
        let (bid, ask) = if expected < 0.0 {
            let scale = (expected / position.lower_limit) * damping;
            let ask = (1.0 + scale * self.bounds.upper) * position.price;
            (ask - inside_spread, ask)
        } else if expected > 0.0 {
            let scale = (expected / position.upper_limit) * damping;
            let bid = (1.0 - scale * self.bounds.lower) * position.price;
            (bid, bid + inside_spread)
        } else {
            let half = inside_spread / 2.0;
            (position.price - half, position.price + half)
        };
        let price = match rfq.side {
            Side::Sell => bid,
            Side::Buy => ask,
        };

        Ok(Some(Quote {
            dealer_id: self.id.clone(),
            order_id: rfq.order_id.clone(),
            bond: rfq.bond.clone(),
            amount: rfq.amount,
            side: rfq.side,
            price,
        }))
    }

    /// Book a confirmed fill: move inventory and the reference price
    pub fn modify_portfolio(&mut self, confirm: &DealerConfirm) -> Result<(), DealerError> {
        let position = self
            .positions
            .get_mut(&confirm.bond)
            .ok_or_else(|| DealerError::UnknownBond {
                dealer: self.id.clone(),
                bond: confirm.bond.clone(),
            })?;
        let quantity = position.quantity + confirm.side.dealer_inventory_change(confirm.size);
        if quantity < position.lower_limit || quantity > position.upper_limit {
            return Err(DealerError::LimitBreach {
                dealer: self.id.clone(),
                bond: confirm.bond.clone(),
                size: confirm.size,
                quantity,
                lower: position.lower_limit,
                upper: position.upper_limit,
            });
        }
        position.quantity = quantity;
        position.price = confirm.price;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderId;

    const P: f64 = 100.24721536368058;

    fn dealer() -> Dealer {
        Dealer::new(
            "d1",
            vec![("MM101".to_string(), DealerPosition::new(500.0, P, 0.9))],
            0.1,
            0.075,
            OutsideBounds::default(),
            10.0,
        )
        .unwrap()
    }

    fn rfq(side: Side, amount: f64) -> Rfq {
        Rfq {
            order_id: OrderId::new("m1", 1),
            bond: "MM101".to_string(),
            side,
            amount,
        }
    }

    #[test]
    fn test_limits_from_nominal() {
        let dealer = dealer();
        let position = dealer.position("MM101").unwrap();
        assert_eq!(position.lower_limit, -37.5);
        assert_eq!(position.upper_limit, 50.0);
        assert_eq!(position.quantity, 0.0);
    }

    #[test]
    fn test_flat_after_trade_quotes_symmetric_spread() {
        let mut dealer = dealer();
        dealer.positions.get_mut("MM101").unwrap().quantity = 5.0;
        let ask = dealer.make_quote(&rfq(Side::Buy, 5.0)).unwrap().unwrap();
        // inside spread = 10 × 0.0225 × P / 87.5
        let half = 10.0 * 0.0225 * P / 87.5 / 2.0;
        assert!((ask.price - (P + half)).abs() < 1e-12);
    }

    #[test]
    fn test_breach_is_refusal() {
        let mut dealer = dealer();
        dealer.positions.get_mut("MM101").unwrap().quantity = 48.0;
        assert_eq!(dealer.make_quote(&rfq(Side::Sell, 5.0)).unwrap(), None);
    }

    #[test]
    fn test_unknown_bond_is_error() {
        let dealer = dealer();
        let mut request = rfq(Side::Buy, 1.0);
        request.bond = "XX".to_string();
        assert!(matches!(
            dealer.make_quote(&request),
            Err(DealerError::UnknownBond { .. })
        ));
    }

    #[test]
    fn test_bound_multiplier_uses_base() {
        let mut dealer = dealer();
        dealer.set_bound_multiplier(1.25);
        dealer.set_bound_multiplier(1.25);
        assert!((dealer.bounds().upper - 0.0125 * 1.25).abs() < 1e-15);
        dealer.set_bound_multiplier(1.0);
        assert_eq!(dealer.bounds(), OutsideBounds::default());
    }

    #[test]
    fn test_invalid_specialization_rejected() {
        let err = Dealer::new(
            "d9",
            vec![("MM101".to_string(), DealerPosition::new(500.0, P, 1.5))],
            0.1,
            0.075,
            OutsideBounds::default(),
            10.0,
        )
        .unwrap_err();
        assert!(matches!(err, DealerError::InvalidSpecialization { .. }));
    }
}
