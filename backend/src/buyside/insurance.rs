//! Insurance company: equity-linked bond rebalancing
//!
//! Each step the equity book earns the previous day's equity return. If the
//! equity share of the total portfolio then sits outside
//! `equity_weight_target ± tolerance`, the company trades its whole bond
//! deviation `bond_value − (1 − equity_weight_target) × total` in a single
//! bond picked uniformly at random.

use super::{AgentError, AgentKind, Book, BuySideAgent, BuySideSnapshot, DecisionContext, Position};
use crate::models::{BuySideConfirm, Rfq, Side, PRICE_BASIS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceCoParams {
    /// Target equity share of the total portfolio
    pub equity_weight_target: f64,
    /// Half-width of the no-trade band around the target
    pub tolerance: f64,
}

impl Default for InsuranceCoParams {
    fn default() -> Self {
        Self {
            equity_weight_target: 0.4,
            tolerance: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceCo {
    book: Book,
    params: InsuranceCoParams,
    equity: f64,
}

impl InsuranceCo {
    /// Equity is sized so it starts at exactly the target weight
    pub fn new(
        id: impl Into<String>,
        positions: Vec<(String, Position)>,
        params: InsuranceCoParams,
    ) -> Result<Self, AgentError> {
        let book = Book::new(id, positions);
        let w = params.equity_weight_target;
        if !(0.0..1.0).contains(&w) || !(params.tolerance >= 0.0) {
            return Err(AgentError::InvalidParameter {
                agent: book.agent_id().to_string(),
                reason: format!(
                    "equity target must be in [0, 1) and tolerance non-negative, got {} and {}",
                    w, params.tolerance
                ),
            });
        }
        if book.bond_list().is_empty() {
            return Err(AgentError::InvalidParameter {
                agent: book.agent_id().to_string(),
                reason: "no bonds to rebalance into".to_string(),
            });
        }
        let equity = w * book.compute_portfolio_value() / (1.0 - w);
        Ok(Self {
            book,
            params,
            equity,
        })
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn params(&self) -> &InsuranceCoParams {
        &self.params
    }

    pub fn bond_weight_target(&self) -> f64 {
        1.0 - self.params.equity_weight_target
    }
}

impl BuySideAgent for InsuranceCo {
    fn id(&self) -> &str {
        self.book.agent_id()
    }

    fn kind(&self) -> AgentKind {
        AgentKind::InsuranceCo
    }

    fn book(&self) -> &Book {
        &self.book
    }

    fn make_portfolio_decision(
        &mut self,
        ctx: &mut DecisionContext<'_>,
    ) -> Result<Vec<Rfq>, AgentError> {
        let missing = || AgentError::MissingEquityReturn {
            agent: self.book.agent_id().to_string(),
            step: ctx.step,
        };
        let equity_return = ctx
            .step
            .checked_sub(1)
            .and_then(|s| ctx.market_data.equity_return(s))
            .ok_or_else(missing)?;
        self.equity *= 1.0 + equity_return;

        let bond_value = self.book.compute_portfolio_value();
        let total = self.equity + bond_value;
        let equity_weight = self.equity / total;
        let target = self.params.equity_weight_target;
        if (target - self.params.tolerance..=target + self.params.tolerance).contains(&equity_weight) {
            return Ok(Vec::new());
        }

        let bond_diff = bond_value - self.bond_weight_target() * total;
        if bond_diff.abs() < 1.0 {
            return Ok(Vec::new());
        }
        let side = if bond_diff > 0.0 { Side::Sell } else { Side::Buy };

        let pick = ctx.rng.index(self.book.bond_list().len());
        let bond = self.book.bond_list()[pick].clone();
        let price = self
            .book
            .position(&bond)
            .map(|p| p.price / PRICE_BASIS)
            .ok_or_else(|| AgentError::UnknownBond {
                agent: self.book.agent_id().to_string(),
                bond: bond.clone(),
            })?;

        let size = (bond_diff / price).round_ties_even().abs();
        if size < 1.0 {
            return Ok(Vec::new());
        }
        Ok(vec![self.book.make_rfq(&bond, side, size)])
    }

    fn modify_portfolio(&mut self, confirm: &BuySideConfirm) -> Result<(), AgentError> {
        self.equity += self.book.apply_fill(confirm)?;
        Ok(())
    }

    fn update_prices(&mut self, prices: &BTreeMap<String, f64>) -> Result<(), AgentError> {
        self.book.update_prices(prices)
    }

    fn end_of_day(&mut self, _step: usize) -> Result<(), AgentError> {
        Ok(())
    }

    fn snapshot(&self) -> BuySideSnapshot {
        BuySideSnapshot::InsuranceCo(self.clone())
    }
}
