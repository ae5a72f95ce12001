//! Property tests over pricing, weights, matching and dealer inventory

use bond_market_simulator_core_rs::dealer::{Dealer, DealerPosition, OutsideBounds};
use bond_market_simulator_core_rs::models::{DealerConfirm, OrderId, Quote, Rfq};
use bond_market_simulator_core_rs::valuation::{implied_yield, price};
use bond_market_simulator_core_rs::{BondMarket, BondSpec, RngManager, Side};
use proptest::prelude::*;

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn market_with(nominals: &[f64], yields: &[f64]) -> BondMarket {
    let mut market = BondMarket::new("prop");
    for (i, (nominal, ytm)) in nominals.iter().zip(yields).enumerate() {
        market
            .add_bond(BondSpec::new(format!("B{}", i), *nominal, 5.0, 0.03, *ytm, 2))
            .unwrap();
    }
    market
}

fn dealer(specialization: f64) -> Dealer {
    Dealer::new(
        "d1",
        vec![(
            "MM101".to_string(),
            DealerPosition::new(500.0, 100.24721536368058, specialization),
        )],
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

proptest! {
    #[test]
    fn prop_price_yield_round_trip(
        maturity in 1u32..60,
        coupon in 0.0f64..0.10,
        ytm in -0.005f64..0.15,
        nper in prop_oneof![Just(1u32), Just(2u32), Just(4u32)],
    ) {
        let maturity = maturity as f64 / 2.0;
        prop_assume!(maturity * nper as f64 >= 1.0);
        let p = price(100.0, maturity, coupon, ytm, nper).unwrap();
        let recovered = implied_yield(p, 100.0, maturity, coupon, nper, 0.05).unwrap();
        prop_assert!((recovered - ytm).abs() < 1e-8, "{} vs {}", recovered, ytm);
    }

    #[test]
    fn prop_price_decreasing_in_yield(
        coupon in 0.0f64..0.10,
        ytm in 0.0f64..0.15,
        bump in 0.0001f64..0.05,
    ) {
        let low = price(100.0, 10.0, coupon, ytm, 2).unwrap();
        let high = price(100.0, 10.0, coupon, ytm + bump, 2).unwrap();
        prop_assert!(high < low);
    }

    #[test]
    fn prop_weights_sum_to_one(
        bonds in prop::collection::vec((1_000.0f64..5_000_000.0, 0.0f64..0.08), 1..10),
    ) {
        let (nominals, yields): (Vec<f64>, Vec<f64>) = bonds.into_iter().unzip();
        let market = market_with(&nominals, &yields);
        let by_nominal: f64 = market.compute_weights_from_nominal().iter().map(|(_, w)| w).sum();
        let by_price: f64 = market.compute_weights_from_price().iter().map(|(_, w)| w).sum();
        prop_assert!((by_nominal - 1.0).abs() < 1e-9);
        prop_assert!((by_price - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_shock_lowers_every_price(
        yields in prop::collection::vec(0.0f64..0.08, 1..8),
    ) {
        let nominals = vec![1_000_000.0; yields.len()];
        let mut market = market_with(&nominals, &yields);
        let before: Vec<f64> = market.bonds().iter().map(|b| b.price()).collect();
        market.shock_ytm(1, 0.01).unwrap();
        for (bond, p) in market.bonds().iter().zip(before) {
            prop_assert!(bond.price() < p);
        }
    }

    #[test]
    fn prop_tie_break_deterministic_and_eligible(
        seed in any::<u64>(),
        side in side_strategy(),
        tied in 2usize..6,
        worse in 0usize..4,
    ) {
        let best = 100.0;
        let off = match side { Side::Buy => 1.0, Side::Sell => -1.0 };
        let quotes: Vec<Quote> = (0..tied + worse)
            .map(|i| Quote {
                dealer_id: format!("d{}", i),
                order_id: OrderId::new("m1", 1),
                bond: "B0".to_string(),
                amount: 1.0,
                side,
                price: if i < tied { best } else { best + off },
            })
            .collect();

        let winner = |seed: u64| {
            let mut market = market_with(&[1_000_000.0], &[0.03]);
            let mut rng = RngManager::new(seed);
            market.match_trade(&quotes, 8, &mut rng).unwrap().0.dealer_id
        };
        let first = winner(seed);
        prop_assert_eq!(&first, &winner(seed));
        let index: usize = first[1..].parse().unwrap();
        prop_assert!(index < tied);
    }

    #[test]
    fn prop_inventory_never_leaves_limits(
        requests in prop::collection::vec((side_strategy(), 1.0f64..30.0), 1..60),
    ) {
        let mut d = dealer(0.5);
        for (side, amount) in requests {
            if let Some(quote) = d.make_quote(&rfq(side, amount)).unwrap() {
                prop_assert_eq!(quote.amount, amount);
                d.modify_portfolio(&DealerConfirm {
                    dealer_id: quote.dealer_id,
                    order_id: quote.order_id,
                    bond: quote.bond,
                    side: quote.side,
                    size: quote.amount,
                    price: quote.price,
                })
                .unwrap();
            }
            let p = d.position("MM101").unwrap();
            prop_assert!(p.quantity >= p.lower_limit && p.quantity <= p.upper_limit);
        }
    }

    #[test]
    fn prop_quote_monotonic_in_inventory(
        specialization in 0.0f64..=1.0,
        side in side_strategy(),
        amount in 1.0f64..5.0,
        start in -30.0f64..20.0,
        gap in 0.5f64..10.0,
    ) {
        let at = |quantity: f64| -> Option<f64> {
            let mut d = dealer(specialization);
            if quantity != 0.0 {
                let fill_side = if quantity > 0.0 { Side::Sell } else { Side::Buy };
                d.modify_portfolio(&DealerConfirm {
                    dealer_id: "d1".to_string(),
                    order_id: OrderId::new("setup", 1),
                    bond: "MM101".to_string(),
                    side: fill_side,
                    size: quantity.abs(),
                    price: 100.24721536368058,
                })
                .unwrap();
            }
            d.make_quote(&rfq(side, amount)).unwrap().map(|q| q.price)
        };

        // The anchored price jumps at flat, so compare within one side
        let change = side.dealer_inventory_change(amount);
        let (from, to) = (start + change, start + gap + change);
        prop_assume!((from < 0.0 && to < 0.0) || (from > 0.0 && to > 0.0));

        let lower = at(start);
        let higher = at(start + gap);
        if let (Some(lo), Some(hi)) = (lower, higher) {
            prop_assert!(hi < lo, "{} at {} vs {} at {}", hi, start + gap, lo, start);
        }
    }
}
