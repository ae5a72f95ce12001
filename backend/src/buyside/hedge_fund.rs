//! Hedge-style dealer bound adjuster
//!
//! Tracks a weighted bond index at its cached prices. When any daily index
//! return in the trailing window falls below `-threshold` it asks for
//! dealer bounds scaled by `factor` (stress: wider quotes); when any exceeds
//! `+threshold` (and none fell) it asks for `1 / factor`; otherwise `1.0`,
//! which restores the base bounds.

use super::{AgentError, AgentKind, Book, BuySideAgent, BuySideSnapshot, DecisionContext, Position};
use crate::models::{BuySideConfirm, Rfq};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeFundParams {
    /// Number of trailing daily returns inspected
    pub window: usize,
    /// Absolute daily return that counts as a large move
    pub threshold: f64,
    /// Bound multiplier applied under stress
    pub factor: f64,
}

impl Default for HedgeFundParams {
    fn default() -> Self {
        Self {
            window: 5,
            threshold: 0.05,
            factor: 1.25,
        }
    }
}

/// Index level at the end of one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexObservation {
    pub step: usize,
    pub level: f64,
    /// Return since the previous observation (0 for the first)
    pub daily_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeFund {
    book: Book,
    /// Index weight per bond, aligned with the book's bond list
    index_weights: Vec<f64>,
    params: HedgeFundParams,
    index_history: Vec<IndexObservation>,
}

impl HedgeFund {
    pub fn new(
        id: impl Into<String>,
        positions: Vec<(String, Position)>,
        index_weights: &[(String, f64)],
        params: HedgeFundParams,
    ) -> Result<Self, AgentError> {
        let book = Book::new(id, positions);
        let invalid = |reason: String| AgentError::InvalidParameter {
            agent: book.agent_id().to_string(),
            reason,
        };
        if params.window == 0 || !(params.threshold > 0.0) || !(params.factor > 0.0) {
            return Err(invalid(format!(
                "window, threshold and factor must be positive, got {}, {}, {}",
                params.window, params.threshold, params.factor
            )));
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

        Ok(Self {
            book,
            index_weights: weights,
            params,
            index_history: Vec::new(),
        })
    }

    pub fn params(&self) -> &HedgeFundParams {
        &self.params
    }

    pub fn index_history(&self) -> &[IndexObservation] {
        &self.index_history
    }

    /// Weighted index level at cached prices
    pub fn index_level(&self) -> f64 {
        self.book
            .bond_list()
            .iter()
            .zip(&self.index_weights)
            .filter_map(|(bond, w)| self.book.position(bond).map(|p| w * p.price))
            .sum()
    }

    /// Append today's index level and return
    pub fn observe(&mut self, step: usize) {
        let level = self.index_level();
        let daily_return = match self.index_history.last() {
            Some(prev) if prev.level != 0.0 => level / prev.level - 1.0,
            _ => 0.0,
        };
        self.index_history.push(IndexObservation {
            step,
            level,
            daily_return,
        });
    }

    /// Multiplier implied by the trailing window of returns
    pub fn bound_multiplier(&self) -> f64 {
        let start = self.index_history.len().saturating_sub(self.params.window);
        let window = &self.index_history[start..];
        if window.iter().any(|o| o.daily_return < -self.params.threshold) {
            self.params.factor
        } else if window.iter().any(|o| o.daily_return > self.params.threshold) {
            1.0 / self.params.factor
        } else {
            1.0
        }
    }
}

impl BuySideAgent for HedgeFund {
    fn id(&self) -> &str {
        self.book.agent_id()
    }

    fn kind(&self) -> AgentKind {
        AgentKind::HedgeFund
    }

    fn book(&self) -> &Book {
        &self.book
    }

    fn make_portfolio_decision(
        &mut self,
        _ctx: &mut DecisionContext<'_>,
    ) -> Result<Vec<Rfq>, AgentError> {
        Ok(Vec::new())
    }

    fn modify_portfolio(&mut self, confirm: &BuySideConfirm) -> Result<(), AgentError> {
        self.book.apply_fill(confirm).map(|_| ())
    }

    fn update_prices(&mut self, prices: &BTreeMap<String, f64>) -> Result<(), AgentError> {
        self.book.update_prices(prices)
    }

    fn end_of_day(&mut self, step: usize) -> Result<(), AgentError> {
        self.observe(step);
        Ok(())
    }

    fn dealer_bound_multiplier(&self) -> Option<f64> {
        Some(self.bound_multiplier())
    }

    fn snapshot(&self) -> BuySideSnapshot {
        BuySideSnapshot::HedgeFund(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fund() -> HedgeFund {
        HedgeFund::new(
            "h1",
            vec![
                ("A".to_string(), Position::new(0.0, 100.0)),
                ("B".to_string(), Position::new(0.0, 100.0)),
            ],
            &[("A".to_string(), 0.5), ("B".to_string(), 0.5)],
            HedgeFundParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_first_observation_has_zero_return() {
        let mut fund = fund();
        fund.observe(0);
        assert_eq!(fund.index_history()[0].level, 100.0);
        assert_eq!(fund.index_history()[0].daily_return, 0.0);
        assert_eq!(fund.bound_multiplier(), 1.0);
    }

    #[test]
    fn test_window_needs_weights_for_every_bond() {
        let err = HedgeFund::new(
            "h1",
            vec![("A".to_string(), Position::new(0.0, 100.0))],
            &[],
            HedgeFundParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::InvalidParameter { .. }));
    }
}
