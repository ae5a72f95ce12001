//! Pricing, duration and implied yield for level-coupon bonds

use super::ValuationError;

/// Iteration cap for the implied-yield Newton solve
pub const MAX_NEWTON_ITERATIONS: usize = 100;

/// Price residual below which the solve is accepted
const PRICE_TOLERANCE: f64 = 1e-10;

/// Yield step below which the solve is accepted
const STEP_TOLERANCE: f64 = 1e-14;

/// Number of whole coupon periods to maturity
///
/// Maturity is rounded to the nearest coupon date; at least one period is
/// required.
pub fn coupon_periods(maturity: f64, nper: u32) -> Result<usize, ValuationError> {
    if nper == 0 {
        return Err(invalid("nper", "must be at least one payment per year"));
    }
    if !maturity.is_finite() || maturity <= 0.0 {
        return Err(invalid("maturity", "must be positive"));
    }
    let periods = (maturity * nper as f64).round();
    if periods < 1.0 {
        return Err(invalid("maturity", "shorter than one coupon period"));
    }
    Ok(periods as usize)
}

/// Present value of a level-coupon bond
///
/// `coupon × nominal / nper` is paid each period and `nominal` is repaid
/// with the final coupon. The annuity factor is evaluated through
/// `ln_1p`/`exp_m1` so yields near zero do not lose precision.
///
/// # Example
/// ```
/// use bond_market_simulator_core_rs::valuation::price;
///
/// let par = price(100.0, 10.0, 0.05, 0.05, 2).unwrap();
/// assert!((par - 100.0).abs() < 1e-9);
/// ```
pub fn price(
    nominal: f64,
    maturity: f64,
    coupon: f64,
    ytm: f64,
    nper: u32,
) -> Result<f64, ValuationError> {
    let n = coupon_periods(maturity, nper)? as f64;
    let r = periodic_rate(ytm, nper)?;
    let payment = nominal * coupon / nper as f64;

    if r == 0.0 {
        return Ok(payment * n + nominal);
    }

    let log_growth = r.ln_1p();
    let discount = (-n * log_growth).exp();
    let annuity = -(-n * log_growth).exp_m1() / r;
    Ok(payment * annuity + nominal * discount)
}

/// Modified duration in years
///
/// Each cash flow `j = 1..=n` is discounted at `(1 + ytm/nper)^-j` and
/// weighted by its time `j / nper` (0.5j for semi-annual bonds). The
/// weighted-average time (Macaulay) is divided by `1 + ytm/nper`.
pub fn duration(
    nominal: f64,
    maturity: f64,
    coupon: f64,
    ytm: f64,
    nper: u32,
) -> Result<f64, ValuationError> {
    let n = coupon_periods(maturity, nper)?;
    let r = periodic_rate(ytm, nper)?;
    let payment = nominal * coupon / nper as f64;
    let step_discount = 1.0 / (1.0 + r);

    let mut discount = 1.0;
    let mut present_value = 0.0;
    let mut weighted_time = 0.0;
    for j in 1..=n {
        discount *= step_discount;
        let cash_flow = if j == n { payment + nominal } else { payment };
        let pv = cash_flow * discount;
        present_value += pv;
        weighted_time += (j as f64 / nper as f64) * pv;
    }

    if present_value <= 0.0 {
        return Err(invalid("nominal", "cash flows have no positive present value"));
    }

    let macaulay = weighted_time / present_value;
    Ok(macaulay / (1.0 + r))
}

/// Yield that reprices the bond to `target_price`
///
/// Newton-Raphson starting from `guess`, using `dP/dy = -D_mod × P`.
/// Price is strictly decreasing in yield for positive cash flows, so the
/// root is unique; iterates are kept above a periodic rate of -99%.
pub fn implied_yield(
    target_price: f64,
    nominal: f64,
    maturity: f64,
    coupon: f64,
    nper: u32,
    guess: f64,
) -> Result<f64, ValuationError> {
    if !target_price.is_finite() || target_price <= 0.0 {
        return Err(invalid("price", "must be positive and finite"));
    }
    if !guess.is_finite() {
        return Err(invalid("guess", "must be finite"));
    }

    let floor = -0.99 * nper as f64;
    let mut ytm = guess.max(floor);
    let mut residual = f64::INFINITY;

    for _ in 0..MAX_NEWTON_ITERATIONS {
        let model_price = price(nominal, maturity, coupon, ytm, nper)?;
        residual = model_price - target_price;
        if residual.abs() < PRICE_TOLERANCE {
            return Ok(ytm);
        }

        let slope = -duration(nominal, maturity, coupon, ytm, nper)? * model_price;
        if slope == 0.0 || !slope.is_finite() {
            break;
        }

        let step = residual / slope;
        let next = (ytm - step).max(floor);
        if (next - ytm).abs() < STEP_TOLERANCE {
            return Ok(next);
        }
        ytm = next;
    }

    Err(ValuationError::ConvergenceFailure {
        iterations: MAX_NEWTON_ITERATIONS,
        residual,
    })
}

fn periodic_rate(ytm: f64, nper: u32) -> Result<f64, ValuationError> {
    if !ytm.is_finite() {
        return Err(invalid("ytm", "must be finite"));
    }
    let r = ytm / nper as f64;
    if r <= -1.0 {
        return Err(invalid("ytm", "periodic rate must exceed -100%"));
    }
    Ok(r)
}

fn invalid(field: &str, reason: &str) -> ValuationError {
    ValuationError::InvalidInput {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_bond_prices() {
        let cases = [
            (1.0, 0.0175, 0.015, 100.24721536368058),
            (2.0, 0.025, 0.0175, 101.46775304752784),
            (5.0, 0.0225, 0.025, 98.83180926153968),
            (10.0, 0.024, 0.026, 98.24880431930487),
            (25.0, 0.04, 0.0421, 96.7721765936335),
        ];
        for (maturity, coupon, ytm, expected) in cases {
            let p = price(100.0, maturity, coupon, ytm, 2).unwrap();
            assert!((p - expected).abs() < 1e-9, "{} vs {}", p, expected);
        }
    }

    #[test]
    fn test_zero_yield_is_sum_of_cash_flows() {
        let p = price(100.0, 5.0, 0.04, 0.0, 2).unwrap();
        assert!((p - 120.0).abs() < 1e-12);

        let near = price(100.0, 5.0, 0.04, 1e-12, 2).unwrap();
        assert!((near - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_long_bond_is_finite() {
        let p = price(100.0, 30.0, 0.05, 0.06, 4).unwrap();
        assert!(p.is_finite() && p > 0.0);
    }

    #[test]
    fn test_reference_durations() {
        let cases = [
            (1.0, 0.0175, 0.015, 0.98826),
            (2.0, 0.025, 0.0175, 1.94654),
            (5.0, 0.0225, 0.025, 4.69649),
            (10.0, 0.024, 0.026, 8.82344),
            (25.0, 0.04, 0.0421, 15.53637),
        ];
        for (maturity, coupon, ytm, expected) in cases {
            let d = duration(100.0, maturity, coupon, ytm, 2).unwrap();
            assert!((d - expected).abs() < 1e-4, "{} vs {}", d, expected);
        }
    }

    #[test]
    fn test_zero_coupon_duration_is_maturity_over_growth() {
        let d = duration(100.0, 3.0, 0.0, 0.04, 2).unwrap();
        assert!((d - 3.0 / 1.02).abs() < 1e-12);
    }

    #[test]
    fn test_implied_yield_round_trip() {
        let p = price(100.0, 10.0, 0.024, 0.026, 2).unwrap();
        let y = implied_yield(p, 100.0, 10.0, 0.024, 2, 0.05).unwrap();
        assert!((y - 0.026).abs() < 1e-10);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(price(100.0, 5.0, 0.02, 0.02, 0).is_err());
        assert!(price(100.0, 0.0, 0.02, 0.02, 2).is_err());
        assert!(price(100.0, 5.0, 0.02, -2.5, 2).is_err());
        assert!(implied_yield(-1.0, 100.0, 5.0, 0.02, 2, 0.02).is_err());
        assert!(implied_yield(f64::NAN, 100.0, 5.0, 0.02, 2, 0.02).is_err());
    }
}
