//! Dealer quoting tests
//!
//! Reference dealer: MM101 at its opening price, specialization 0.9,
//! nominal 500 with long/short factors 0.1/0.075 (limits [-37.5, 50]) and
//! spread factor 10.

use bond_market_simulator_core_rs::dealer::{Dealer, DealerError, DealerPosition, OutsideBounds};
use bond_market_simulator_core_rs::models::{DealerConfirm, OrderId, Rfq};
use bond_market_simulator_core_rs::Side;
use std::collections::BTreeMap;

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

/// Move inventory to `quantity` without moving the reference price
fn with_inventory(quantity: f64) -> Dealer {
    let mut d = dealer();
    if quantity != 0.0 {
        let side = if quantity > 0.0 { Side::Sell } else { Side::Buy };
        d.modify_portfolio(&DealerConfirm {
            dealer_id: "d1".to_string(),
            order_id: OrderId::new("setup", 1),
            bond: "MM101".to_string(),
            side,
            size: quantity.abs(),
            price: P,
        })
        .unwrap();
    }
    d
}

fn quoted(quantity: f64, side: Side, amount: f64) -> Option<f64> {
    with_inventory(quantity)
        .make_quote(&rfq(side, amount))
        .unwrap()
        .map(|q| q.price)
}

#[test]
fn test_limits_from_nominal() {
    let d = dealer();
    let position = d.position("MM101").unwrap();
    assert_eq!(position.lower_limit, -37.5);
    assert_eq!(position.upper_limit, 50.0);
    assert_eq!(position.quantity, 0.0);
}

#[test]
fn test_reference_quotes() {
    let cases = [
        (20.0, Side::Buy, 100.23131901953005),
        (-10.0, Side::Buy, 100.70334019358533),
        (20.0, Side::Sell, 99.79109053377583),
        (-10.0, Side::Sell, 100.1414784198565),
        (-5.0, Side::Sell, 100.11832608678442),
        (5.0, Side::Buy, 100.37610464057674),
    ];
    for (quantity, side, expected) in cases {
        let price = quoted(quantity, side, 5.0).unwrap();
        assert!(
            (price - expected).abs() < 1e-9,
            "qty {} {}: {} vs {}",
            quantity,
            side,
            price,
            expected
        );
    }
}

#[test]
fn test_refuses_beyond_limits() {
    // 48 + 5 > 50
    assert_eq!(quoted(48.0, Side::Sell, 5.0), None);
    // -35 - 5 < -37.5
    assert_eq!(quoted(-35.0, Side::Buy, 5.0), None);
    // exactly at the limit is allowed
    assert!(quoted(45.0, Side::Sell, 5.0).is_some());
}

#[test]
fn test_bid_falls_as_inventory_rises() {
    let bids: Vec<f64> = [(-30.0, 10.0), (-20.0, 10.0), (-10.0, 10.0), (0.0, 10.0), (10.0, 20.0)]
        .into_iter()
        .map(|(q, amount)| quoted(q, Side::Sell, amount).unwrap())
        .collect();
    let expected = [
        100.59760324976125,
        100.29352002982478,
        100.11832608678442,
        100.06476543171868,
        99.69986556779489,
    ];
    for (bid, e) in bids.iter().zip(expected) {
        assert!((bid - e).abs() < 1e-9, "{} vs {}", bid, e);
    }
    assert!(bids.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn test_short_quote_anchors_ask_long_quote_anchors_bid() {
    let inside = 10.0 * 0.0225 * P / 87.5;
    // post-trade -15: the ask carries the skew
    let ask = quoted(-10.0, Side::Buy, 5.0).unwrap();
    let bid = quoted(-20.0, Side::Sell, 5.0).unwrap();
    assert!((ask - P * (1.0 + 0.4 * 0.91 * 0.0125)).abs() < 1e-9);
    assert!((ask - bid - inside).abs() < 1e-9);
    // post-trade +25: the bid carries the skew
    let bid = quoted(20.0, Side::Sell, 5.0).unwrap();
    let ask = quoted(30.0, Side::Buy, 5.0).unwrap();
    assert!((bid - P * (1.0 - 0.5 * 0.91 * 0.01)).abs() < 1e-9);
    assert!((ask - bid - inside).abs() < 1e-9);
}

#[test]
fn test_ask_above_bid_at_same_inventory() {
    for quantity in [-20.0, 0.0, 20.0] {
        let d = with_inventory(quantity);
        // Same post-trade inventory: sell 5 from q-5, buy 5 from q+5
        let bid = with_inventory(quantity - 5.0)
            .make_quote(&rfq(Side::Sell, 5.0))
            .unwrap()
            .unwrap()
            .price;
        let ask = with_inventory(quantity + 5.0)
            .make_quote(&rfq(Side::Buy, 5.0))
            .unwrap()
            .unwrap()
            .price;
        assert!(ask > bid, "inventory {}", quantity);
        assert!(d.make_quote(&rfq(Side::Buy, 1.0)).unwrap().is_some());
    }
}

#[test]
fn test_wider_bounds_widen_spread() {
    let mut d = with_inventory(0.0);
    let narrow_bid = d.make_quote(&rfq(Side::Sell, 5.0)).unwrap().unwrap().price;
    d.set_bound_multiplier(1.25);
    assert_eq!(d.bounds(), OutsideBounds::default().scaled(1.25));
    let wide_bid = d.make_quote(&rfq(Side::Sell, 5.0)).unwrap().unwrap().price;
    assert!(wide_bid < narrow_bid);

    // Multiplier is relative to the base, never compounding
    d.set_bound_multiplier(1.0);
    assert_eq!(d.bounds(), d.base_bounds());
}

#[test]
fn test_fill_moves_inventory_and_price() {
    let mut d = dealer();
    d.modify_portfolio(&DealerConfirm {
        dealer_id: "d1".to_string(),
        order_id: OrderId::new("m1", 1),
        bond: "MM101".to_string(),
        side: Side::Sell,
        size: 12.0,
        price: 99.8,
    })
    .unwrap();
    let position = d.position("MM101").unwrap();
    assert_eq!(position.quantity, 12.0);
    assert_eq!(position.price, 99.8);
}

#[test]
fn test_fill_beyond_limit_is_error() {
    let mut d = dealer();
    let err = d
        .modify_portfolio(&DealerConfirm {
            dealer_id: "d1".to_string(),
            order_id: OrderId::new("m1", 1),
            bond: "MM101".to_string(),
            side: Side::Sell,
            size: 60.0,
            price: P,
        })
        .unwrap_err();
    assert!(matches!(err, DealerError::LimitBreach { .. }));
    assert_eq!(d.position("MM101").unwrap().quantity, 0.0);
}

#[test]
fn test_unknown_bond_is_error() {
    let d = dealer();
    let mut request = rfq(Side::Buy, 1.0);
    request.bond = "MM999".to_string();
    assert!(matches!(
        d.make_quote(&request),
        Err(DealerError::UnknownBond { .. })
    ));
}

#[test]
fn test_update_prices_requires_every_bond() {
    let mut d = dealer();
    let mut prices = BTreeMap::new();
    assert!(matches!(
        d.update_prices(&prices),
        Err(DealerError::MissingPrice { .. })
    ));
    prices.insert("MM101".to_string(), 99.0);
    d.update_prices(&prices).unwrap();
    assert_eq!(d.position("MM101").unwrap().price, 99.0);
}

#[test]
fn test_update_limits_flattens_inventory() {
    let mut d = with_inventory(20.0);
    d.update_limits(0.2, 0.1);
    let position = d.position("MM101").unwrap();
    assert_eq!(position.quantity, 0.0);
    assert_eq!(position.upper_limit, 100.0);
    assert_eq!(position.lower_limit, -50.0);
}

#[test]
fn test_specialization_out_of_range_rejected() {
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
