use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use tiered_bonus_core::tiers::{clean_rows, lookup, lookup_rows, RawTierRow, RateTier, Tier};

fn original_rate_table() -> Vec<RateTier> {
    [
        (dec!(0), dec!(0)),
        (dec!(150000000), dec!(0.005)),
        (dec!(300000000), dec!(0.01)),
        (dec!(500000000), dec!(0.015)),
        (dec!(800000000), dec!(0.02)),
        (dec!(1000000000), dec!(0.025)),
        (dec!(2000000000), dec!(0.03)),
    ]
    .into_iter()
    .map(|(minimum_revenue, rate)| RateTier {
        minimum_revenue,
        rate,
    })
    .collect()
}

// ===========================================================================
// Known answers
// ===========================================================================

#[test]
fn test_rate_table_boundaries() {
    let table = original_rate_table();
    let cases = [
        (dec!(0), dec!(0)),
        (dec!(149999999), dec!(0)),
        (dec!(150000000), dec!(0.005)),
        (dec!(299999999.99), dec!(0.005)),
        (dec!(300000000), dec!(0.01)),
        (dec!(799999999), dec!(0.015)),
        (dec!(1999999999), dec!(0.025)),
        (dec!(2000000000), dec!(0.03)),
        (dec!(50000000000), dec!(0.03)),
    ];
    for (query, expected) in cases {
        assert_eq!(lookup(&table, query), expected, "query {query}");
    }
}

#[test]
fn test_floor_value_when_lowest_threshold_is_zero() {
    let table = vec![
        Tier {
            threshold: dec!(0),
            value: dec!(1),
        },
        Tier {
            threshold: dec!(0.3),
            value: dec!(0.8),
        },
    ];
    assert_eq!(lookup(&table, dec!(0)), dec!(1));
}

#[test]
fn test_editable_table_with_partial_edits() {
    let rows = vec![
        RawTierRow {
            threshold: json!(0),
            value: json!(1.0),
        },
        RawTierRow {
            threshold: json!("thirty"),
            value: json!(0.8),
        },
        RawTierRow {
            threshold: json!(0.32),
            value: json!("50%"),
        },
        RawTierRow {
            threshold: json!(null),
            value: json!(null),
        },
    ];
    let cleaned = clean_rows(&rows);
    assert_eq!(cleaned.tiers.len(), 2);
    assert_eq!(cleaned.discarded.len(), 2);
    // The "thirty" row is gone, so 0.31 still falls in the first tier
    assert_eq!(lookup_rows(&rows, dec!(0.31)), dec!(1));
    assert_eq!(lookup_rows(&rows, dec!(0.32)), dec!(0.5));
}

// ===========================================================================
// Properties
// ===========================================================================

fn tier_strategy() -> impl Strategy<Value = Tier> {
    (0u32..1000, 0u32..1000).prop_map(|(t, v)| Tier {
        threshold: Decimal::from(t),
        value: Decimal::new(v as i64, 3),
    })
}

proptest! {
    #[test]
    fn prop_below_smallest_threshold_is_zero(
        tiers in prop::collection::vec(tier_strategy(), 1..12),
    ) {
        let smallest = tiers.iter().map(|t| t.threshold).min().unwrap();
        prop_assume!(smallest > Decimal::ZERO);
        prop_assert_eq!(lookup(&tiers, smallest - dec!(0.001)), Decimal::ZERO);
    }

    #[test]
    fn prop_invariant_to_input_order(
        tiers in prop::collection::vec(tier_strategy(), 0..12),
        query in 0u32..1100,
    ) {
        // Distinct thresholds: with duplicates the supplied order decides the winner.
        let mut unique = tiers.clone();
        unique.sort_by_key(|t| t.threshold);
        unique.dedup_by_key(|t| t.threshold);
        let mut reversed = unique.clone();
        reversed.reverse();
        let q = Decimal::from(query);
        prop_assert_eq!(lookup(&unique, q), lookup(&reversed, q));
    }

    #[test]
    fn prop_monotonic_for_ascending_values(
        steps in prop::collection::vec((1u32..100, 0u32..50), 1..10),
        a in 0u32..2000,
        b in 0u32..2000,
    ) {
        // Build a table whose values rise with the thresholds.
        let mut threshold = Decimal::ZERO;
        let mut value = Decimal::ZERO;
        let mut tiers = vec![Tier { threshold, value }];
        for (dt, dv) in steps {
            threshold += Decimal::from(dt);
            value += Decimal::new(dv as i64, 3);
            tiers.push(Tier { threshold, value });
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(lookup(&tiers, Decimal::from(lo)) <= lookup(&tiers, Decimal::from(hi)));
    }
}
