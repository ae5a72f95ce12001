//! BondMarket implementation

use super::MarketError;
use crate::models::{
    Bond, BondSpec, BuySideConfirm, DealerConfirm, PriceSnapshot, Quote, Side, TradeRecord,
};
use crate::rng::RngManager;
use crate::valuation::{self, RevaluationMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry of bonds plus the market's trading record
///
/// # Example
/// ```
/// use bond_market_simulator_core_rs::{BondMarket, BondSpec};
///
/// let mut market = BondMarket::new("bondmarket1");
/// market.add_bond(BondSpec::new("MM101", 500_000.0, 1.0, 0.0175, 0.015, 2)).unwrap();
/// market.add_bond(BondSpec::new("MM102", 500_000.0, 2.0, 0.025, 0.0175, 2)).unwrap();
///
/// let weights = market.compute_weights_from_nominal();
/// assert_eq!(weights[0], ("MM101".to_string(), 0.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondMarket {
    name: String,
    bonds: Vec<Bond>,
    last_prices: BTreeMap<String, f64>,
    trades: Vec<TradeRecord>,
    price_history: Vec<PriceSnapshot>,
    trade_sequence: u64,
}

impl BondMarket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bonds: Vec::new(),
            last_prices: BTreeMap::new(),
            trades: Vec::new(),
            price_history: Vec::new(),
            trade_sequence: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price and register a bond; its price also seeds the last-price table
    pub fn add_bond(&mut self, spec: BondSpec) -> Result<&Bond, MarketError> {
        if self.bond_index(&spec.name).is_some() {
            return Err(MarketError::DuplicateBond(spec.name));
        }
        let name = spec.name.clone();
        let bond = Bond::new(spec).map_err(|source| MarketError::InvalidBond {
            bond: name.clone(),
            source,
        })?;
        self.last_prices.insert(name, bond.price());
        self.bonds.push(bond);
        let idx = self.bonds.len() - 1;
        Ok(&self.bonds[idx])
    }

    /// Bonds in registration order
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond(&self, name: &str) -> Option<&Bond> {
        self.bond_index(name).map(|i| &self.bonds[i])
    }

    pub fn bond_names(&self) -> Vec<String> {
        self.bonds.iter().map(|b| b.name().to_string()).collect()
    }

    pub fn last_prices(&self) -> &BTreeMap<String, f64> {
        &self.last_prices
    }

    pub fn last_price(&self, bond: &str) -> Option<f64> {
        self.last_prices.get(bond).copied()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn price_history(&self) -> &[PriceSnapshot] {
        &self.price_history
    }

    /// Share of total face value outstanding, per bond
    pub fn compute_weights_from_nominal(&self) -> Vec<(String, f64)> {
        let total: f64 = self.bonds.iter().map(|b| b.nominal()).sum();
        self.bonds
            .iter()
            .map(|b| (b.name().to_string(), b.nominal() / total))
            .collect()
    }

    /// Share of total market value (`price × nominal / 100`), per bond
    pub fn compute_weights_from_price(&self) -> Vec<(String, f64)> {
        let values: Vec<f64> = self
            .bonds
            .iter()
            .map(|b| b.price() * b.nominal() / crate::models::PRICE_BASIS)
            .collect();
        let total: f64 = values.iter().sum();
        self.bonds
            .iter()
            .zip(values)
            .map(|(b, v)| (b.name().to_string(), v / total))
            .collect()
    }

    /// Append the matched quote to the ledger and move its bond's last price
    pub fn report_trade(&mut self, quote: &Quote, step: usize) -> &TradeRecord {
        self.trade_sequence += 1;
        self.trades.push(TradeRecord {
            sequence: self.trade_sequence,
            step,
            dealer_id: quote.dealer_id.clone(),
            order_id: quote.order_id.clone(),
            bond: quote.bond.clone(),
            side: quote.side,
            size: quote.amount,
            price: quote.price,
        });
        self.last_prices.insert(quote.bond.clone(), quote.price);
        let idx = self.trades.len() - 1;
        &self.trades[idx]
    }

    pub fn make_dealer_confirm(quote: &Quote) -> DealerConfirm {
        DealerConfirm {
            dealer_id: quote.dealer_id.clone(),
            order_id: quote.order_id.clone(),
            bond: quote.bond.clone(),
            side: quote.side,
            size: quote.amount,
            price: quote.price,
        }
    }

    pub fn make_buyside_confirm(quote: &Quote) -> BuySideConfirm {
        BuySideConfirm {
            agent_id: quote.order_id.agent_id().to_string(),
            order_id: quote.order_id.clone(),
            bond: quote.bond.clone(),
            side: quote.side,
            size: quote.amount,
            price: quote.price,
        }
    }

    /// Pick the best quote for one RFQ and record the trade
    ///
    /// Buy RFQs take the lowest price, sell RFQs the highest. Quotes tied at
    /// exactly the best price are chosen between with one draw from `rng`
    /// (a draw is taken even when only one quote is best). Returns the two
    /// confirmations and the number of tied quotes.
    pub fn match_trade(
        &mut self,
        quotes: &[Quote],
        step: usize,
        rng: &mut RngManager,
    ) -> Result<(DealerConfirm, BuySideConfirm, usize), MarketError> {
        let winner = select_best(quotes, rng)?;
        let tied = winner.1;
        let quote = winner.0.clone();
        self.report_trade(&quote, step);
        Ok((
            Self::make_dealer_confirm(&quote),
            Self::make_buyside_confirm(&quote),
            tied,
        ))
    }

    /// Snapshot the last-price table for `step`
    pub fn record_last_prices(&mut self, step: usize) {
        let prices = self
            .bonds
            .iter()
            .map(|b| {
                let price = self.last_prices.get(b.name()).copied().unwrap_or(b.price());
                (b.name().to_string(), price)
            })
            .collect();
        self.price_history.push(PriceSnapshot { step, prices });
    }

    /// End-of-day revaluation from one row of yield changes
    ///
    /// `changes[i]` applies to the i-th registered bond. Each bond is
    /// revalued from its last traded price; the bond's yield and price and
    /// the last-price table are all updated. A bond whose revaluation fails
    /// is left untouched and the error ends the update.
    pub fn update_eod_bond_price(
        &mut self,
        step: usize,
        changes: &[f64],
        mode: RevaluationMode,
    ) -> Result<(), MarketError> {
        if changes.len() != self.bonds.len() {
            return Err(MarketError::MissingYieldChanges {
                step,
                expected: self.bonds.len(),
                found: changes.len(),
            });
        }
        for (bond, delta) in self.bonds.iter_mut().zip(changes) {
            let start = self
                .last_prices
                .get(bond.name())
                .copied()
                .unwrap_or(bond.price());
            let price = valuation::revalue_end_of_day(bond, start, *delta, mode).map_err(
                |source| MarketError::Revaluation {
                    bond: bond.name().to_string(),
                    step,
                    source,
                },
            )?;
            self.last_prices.insert(bond.name().to_string(), price);
        }
        Ok(())
    }

    /// Parallel yield shift for every bond, closed-form repriced
    pub fn shock_ytm(&mut self, step: usize, shift: f64) -> Result<(), MarketError> {
        for bond in self.bonds.iter_mut() {
            let price = valuation::shock(bond, shift).map_err(|source| MarketError::Revaluation {
                bond: bond.name().to_string(),
                step,
                source,
            })?;
            self.last_prices.insert(bond.name().to_string(), price);
        }
        Ok(())
    }

    fn bond_index(&self, name: &str) -> Option<usize> {
        self.bonds.iter().position(|b| b.name() == name)
    }
}

/// Best quote plus the size of the tie set it was drawn from
fn select_best<'a>(
    quotes: &'a [Quote],
    rng: &mut RngManager,
) -> Result<(&'a Quote, usize), MarketError> {
    let first = quotes.first().ok_or_else(|| MarketError::NoQuotes {
        order_id: String::from("<none>"),
    })?;
    if quotes.iter().any(|q| {
        q.side != first.side || q.order_id != first.order_id || q.bond != first.bond
    }) {
        return Err(MarketError::MismatchedQuotes {
            order_id: first.order_id.to_string(),
        });
    }

    let prices = quotes.iter().map(|q| q.price);
    let best = match first.side {
        Side::Buy => prices.fold(f64::INFINITY, f64::min),
        Side::Sell => prices.fold(f64::NEG_INFINITY, f64::max),
    };
    let tied: Vec<&Quote> = quotes.iter().filter(|q| q.price == best).collect();
    let pick = rng.index(tied.len());
    Ok((tied[pick], tied.len()))
}
