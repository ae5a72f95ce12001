//! Index-tracking mutual fund
//!
//! # Flow model
//!
//! Investor flow on step `t` is a fraction of the previous step's NAV:
//!
//! ```text
//! r_d  = NPS[t-1] / NPS[t-2] − 1
//! r_w  = NPS[t-1] / NPS[t-6] − 1
//! flow = (α + β_d·r_d + β_d⁻·1{r_d<0} + β_w·r_w + β_w⁻·1{r_w<0}) × NAV[t-1]
//! ```
//!
//! so every decision reads history 1, 2 and 6 steps back. Those entries must
//! exist (the orchestrator seeds them during the priming window); a missing
//! lag is an error.
//!
//! # Rebalancing
//!
//! With `cash' = cash + flow` and `nav' = bond_value[t-1] + cash'`, the fund
//! trades only when `cash'` leaves `[lower_bound, upper_bound] × nav'`. It
//! then moves cash to `target × nav'` by trading every bond in proportion to
//! its index weight. A lower-bound breach always sells; buying waits for the
//! upper bound.

use super::{AgentError, AgentKind, Book, BuySideAgent, BuySideSnapshot, DecisionContext, Position};
use crate::models::{BuySideConfirm, NavEntry, NavHistory, Rfq, Side, PRICE_BASIS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ALPHA: f64 = 0.00017;
const BETA_DAILY: f64 = 0.56;
const BETA_DAILY_DOWN: f64 = -0.0002;
const BETA_WEEKLY: f64 = 0.60;
const BETA_WEEKLY_DOWN: f64 = -0.0002;

const DAILY_LAG: usize = 2;

/// Deepest NAV lag the flow model reads; trading needs this many seeded steps
pub const NAV_LOOKBACK: usize = 6;

/// Flow as a fraction of NAV for the given lagged daily and weekly returns
///
/// # Example
/// ```
/// use bond_market_simulator_core_rs::buyside::flow_ratio;
///
/// let ratio = flow_ratio(0.01, 0.01);
/// assert!((ratio - 0.01177).abs() < 1e-12);
/// ```
pub fn flow_ratio(daily_return: f64, weekly_return: f64) -> f64 {
    let daily_down = if daily_return < 0.0 { 1.0 } else { 0.0 };
    let weekly_down = if weekly_return < 0.0 { 1.0 } else { 0.0 };
    ALPHA
        + BETA_DAILY * daily_return
        + BETA_DAILY_DOWN * daily_down
        + BETA_WEEKLY * weekly_return
        + BETA_WEEKLY_DOWN * weekly_down
}

/// Mutual fund configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutualFundParams {
    /// Cash floor as a fraction of NAV
    pub lower_bound: f64,
    /// Cash ceiling as a fraction of NAV
    pub upper_bound: f64,
    /// Cash the fund rebalances to, as a fraction of NAV
    pub target: f64,
    /// Shares outstanding at setup
    pub shares: f64,
    /// First step on which investor flows are applied
    pub flow_start_step: usize,
    /// Opening cash; `None` sizes it so cash is `target` of NAV
    #[serde(default)]
    pub initial_cash: Option<f64>,
}

impl Default for MutualFundParams {
    fn default() -> Self {
        Self {
            lower_bound: 0.03,
            upper_bound: 0.07,
            target: 0.05,
            shares: 100_000.0,
            flow_start_step: 8,
            initial_cash: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutualFund {
    book: Book,
    /// Index weight per bond, aligned with the book's bond list
    index_weights: Vec<f64>,
    params: MutualFundParams,
    cash: f64,
    shares: f64,
    nav_history: NavHistory,
}

impl MutualFund {
    /// `index_weights` must name every held bond
    pub fn new(
        id: impl Into<String>,
        positions: Vec<(String, Position)>,
        index_weights: &[(String, f64)],
        params: MutualFundParams,
    ) -> Result<Self, AgentError> {
        let book = Book::new(id, positions);
        let agent = book.agent_id().to_string();
        let invalid = |reason: String| AgentError::InvalidParameter {
            agent: agent.clone(),
            reason,
        };

        if !(0.0 <= params.lower_bound
            && params.lower_bound <= params.target
            && params.target <= params.upper_bound
            && params.upper_bound < 1.0)
        {
            return Err(invalid(format!(
                "cash bounds must satisfy 0 <= lower ({}) <= target ({}) <= upper ({}) < 1",
                params.lower_bound, params.target, params.upper_bound
            )));
        }
        if !(params.shares > 0.0) {
            return Err(invalid(format!("shares must be positive, got {}", params.shares)));
        }

        let weights = book
            .bond_list()
            .iter()
            .map(|bond| {
                index_weights
                    .iter()
                    .find(|(name, _)| name == bond)
                    .map(|(_, w)| *w)
                    .ok_or_else(|| invalid(format!("no index weight for {}", bond)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cash = params.initial_cash.unwrap_or_else(|| {
            params.target * book.compute_portfolio_value() / (1.0 - params.target)
        });
        let shares = params.shares;

        Ok(Self {
            book,
            index_weights: weights,
            params,
            cash,
            shares,
            nav_history: NavHistory::new(),
        })
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn shares(&self) -> f64 {
        self.shares
    }

    pub fn params(&self) -> &MutualFundParams {
        &self.params
    }

    /// Load externally produced history (e.g. a previous run's tail)
    pub fn seed_history<I>(&mut self, entries: I) -> Result<(), AgentError>
    where
        I: IntoIterator<Item = NavEntry>,
    {
        for entry in entries {
            let step = entry.step;
            if !self.nav_history.record(entry) {
                return Err(AgentError::DuplicateNav {
                    agent: self.book.agent_id().to_string(),
                    step,
                });
            }
        }
        Ok(())
    }

    /// Record the NAV for `step`, then apply that step's investor flow
    ///
    /// NAV per share is measured before the flow; the flow buys or redeems
    /// shares at that price. The stored entry carries post-flow cash, NAV
    /// and shares.
    pub fn add_nav_to_history(&mut self, step: usize) -> Result<(), AgentError> {
        let bond_value = self.book.compute_portfolio_value();
        let nav_per_share = (bond_value + self.cash) / self.shares;

        let flow = if step >= self.params.flow_start_step {
            self.compute_flow(step)?
        } else {
            0.0
        };
        self.cash += flow;
        self.shares += flow / nav_per_share;

        let entry = NavEntry {
            step,
            bond_value,
            cash: self.cash,
            nav: bond_value + self.cash,
            nav_per_share,
            shares: self.shares,
            flow,
        };
        if !self.nav_history.record(entry) {
            return Err(AgentError::DuplicateNav {
                agent: self.book.agent_id().to_string(),
                step,
            });
        }
        Ok(())
    }

    /// Expected investor flow on `step` from the lagged NAV history
    pub fn compute_flow(&self, step: usize) -> Result<f64, AgentError> {
        let previous = self.lagged(step, 1)?;
        let daily_base = self.lagged(step, DAILY_LAG)?;
        let weekly_base = self.lagged(step, NAV_LOOKBACK)?;

        let daily_return = previous.nav_per_share / daily_base.nav_per_share - 1.0;
        let weekly_return = previous.nav_per_share / weekly_base.nav_per_share - 1.0;
        Ok(flow_ratio(daily_return, weekly_return) * previous.nav)
    }

    fn lagged(&self, step: usize, lag: usize) -> Result<&NavEntry, AgentError> {
        step.checked_sub(lag)
            .and_then(|s| self.nav_history.get(s))
            .ok_or_else(|| AgentError::MissingNavHistory {
                agent: self.book.agent_id().to_string(),
                step,
                lag,
            })
    }
}

impl BuySideAgent for MutualFund {
    fn id(&self) -> &str {
        self.book.agent_id()
    }

    fn kind(&self) -> AgentKind {
        AgentKind::MutualFund
    }

    fn book(&self) -> &Book {
        &self.book
    }

    fn make_portfolio_decision(
        &mut self,
        ctx: &mut DecisionContext<'_>,
    ) -> Result<Vec<Rfq>, AgentError> {
        let step = ctx.step;
        let expected_flow = self.compute_flow(step)?;
        let expected_cash = self.cash + expected_flow;
        let expected_nav = self.lagged(step, 1)?.bond_value + expected_cash;

        let side = if expected_cash < self.params.lower_bound * expected_nav {
            Side::Sell
        } else if expected_cash > self.params.upper_bound * expected_nav {
            Side::Buy
        } else {
            return Ok(Vec::new());
        };

        let cash_to_raise = self.params.target * expected_nav - expected_cash;
        let orders: Vec<(String, f64)> = self
            .book
            .bond_list()
            .iter()
            .zip(&self.index_weights)
            .filter_map(|(bond, weight)| {
                let price = self.book.position(bond)?.price / PRICE_BASIS;
                let size = (weight * cash_to_raise / price).round_ties_even().abs();
                (size >= 1.0).then(|| (bond.clone(), size))
            })
            .collect();

        Ok(orders
            .into_iter()
            .map(|(bond, size)| self.book.make_rfq(&bond, side, size))
            .collect())
    }

    fn modify_portfolio(&mut self, confirm: &BuySideConfirm) -> Result<(), AgentError> {
        self.cash += self.book.apply_fill(confirm)?;
        Ok(())
    }

    fn update_prices(&mut self, prices: &BTreeMap<String, f64>) -> Result<(), AgentError> {
        self.book.update_prices(prices)
    }

    fn end_of_day(&mut self, step: usize) -> Result<(), AgentError> {
        self.add_nav_to_history(step)
    }

    fn nav_history(&self) -> Option<&NavHistory> {
        Some(&self.nav_history)
    }

    fn snapshot(&self) -> BuySideSnapshot {
        BuySideSnapshot::MutualFund(self.clone())
    }
}
