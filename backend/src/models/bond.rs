//! Bond definitions and market state

use crate::valuation::{self, ValuationError};
use serde::{Deserialize, Serialize};

/// Face value prices are quoted against
pub const PRICE_BASIS: f64 = 100.0;

/// Static bond definition supplied at setup
///
/// `nominal` is the amount outstanding; `ytm` is the opening yield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondSpec {
    pub name: String,
    pub nominal: f64,
    pub maturity: f64,
    pub coupon: f64,
    pub ytm: f64,
    pub nper: u32,
}

impl BondSpec {
    pub fn new(name: impl Into<String>, nominal: f64, maturity: f64, coupon: f64, ytm: f64, nper: u32) -> Self {
        Self {
            name: name.into(),
            nominal,
            maturity,
            coupon,
            ytm,
            nper,
        }
    }
}

/// A registered bond: static terms plus current yield and price
///
/// Owned by the market. `price` is always per 100 face and is kept in sync
/// with `ytm` by every method that moves either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    name: String,
    nominal: f64,
    maturity: f64,
    coupon: f64,
    nper: u32,
    ytm: f64,
    price: f64,
}

impl Bond {
    /// Register terms and compute the opening price
    pub fn new(spec: BondSpec) -> Result<Self, ValuationError> {
        if !spec.nominal.is_finite() || spec.nominal <= 0.0 {
            return Err(ValuationError::InvalidInput {
                field: "nominal".to_string(),
                reason: format!("bond {} must have positive nominal", spec.name),
            });
        }
        let price = valuation::price(PRICE_BASIS, spec.maturity, spec.coupon, spec.ytm, spec.nper)?;
        Ok(Self {
            name: spec.name,
            nominal: spec.nominal,
            maturity: spec.maturity,
            coupon: spec.coupon,
            nper: spec.nper,
            ytm: spec.ytm,
            price,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    pub fn coupon(&self) -> f64 {
        self.coupon
    }

    pub fn nper(&self) -> u32 {
        self.nper
    }

    pub fn ytm(&self) -> f64 {
        self.ytm
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// Closed-form price at an arbitrary yield
    pub fn price_at(&self, ytm: f64) -> Result<f64, ValuationError> {
        valuation::price(PRICE_BASIS, self.maturity, self.coupon, ytm, self.nper)
    }

    /// Modified duration at the current yield
    pub fn modified_duration(&self) -> Result<f64, ValuationError> {
        self.duration_at(self.ytm)
    }

    pub fn duration_at(&self, ytm: f64) -> Result<f64, ValuationError> {
        valuation::duration(PRICE_BASIS, self.maturity, self.coupon, ytm, self.nper)
    }

    /// Yield implied by `market_price`, solved from the current yield
    pub fn implied_yield(&self, market_price: f64) -> Result<f64, ValuationError> {
        valuation::implied_yield(market_price, PRICE_BASIS, self.maturity, self.coupon, self.nper, self.ytm)
    }

    /// Move yield and price together
    pub(crate) fn set_market_state(&mut self, ytm: f64, price: f64) {
        self.ytm = ytm;
        self.price = price;
    }

    /// Terms as a spec (current yield as `ytm`)
    pub fn spec(&self) -> BondSpec {
        BondSpec::new(self.name.clone(), self.nominal, self.maturity, self.coupon, self.ytm, self.nper)
    }
}
