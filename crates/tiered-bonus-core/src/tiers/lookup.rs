use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Factor, Money, Rate};

/// A row of a step-function table: `value` applies from `threshold` upward
/// until the next threshold takes over.
pub trait Tiered {
    fn threshold(&self) -> Decimal;
    fn value(&self) -> Decimal;
}

/// Untyped (threshold, value) pair, as produced by table cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub threshold: Decimal,
    pub value: Decimal,
}

/// Combined-revenue tier: `rate` applies once combined revenue reaches
/// `minimum_revenue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTier {
    pub minimum_revenue: Money,
    pub rate: Rate,
}

/// Cost-ratio tier: `factor` applies once a line's cost ratio reaches
/// `minimum_cost_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostFactorTier {
    pub minimum_cost_ratio: Rate,
    pub factor: Factor,
}

impl Tiered for Tier {
    fn threshold(&self) -> Decimal {
        self.threshold
    }
    fn value(&self) -> Decimal {
        self.value
    }
}

impl Tiered for RateTier {
    fn threshold(&self) -> Decimal {
        self.minimum_revenue
    }
    fn value(&self) -> Decimal {
        self.rate
    }
}

impl Tiered for CostFactorTier {
    fn threshold(&self) -> Decimal {
        self.minimum_cost_ratio
    }
    fn value(&self) -> Decimal {
        self.factor
    }
}

impl From<Tier> for RateTier {
    fn from(tier: Tier) -> Self {
        RateTier {
            minimum_revenue: tier.threshold,
            rate: tier.value,
        }
    }
}

impl From<Tier> for CostFactorTier {
    fn from(tier: Tier) -> Self {
        CostFactorTier {
            minimum_cost_ratio: tier.threshold,
            factor: tier.value,
        }
    }
}

/// Find the tier governing `query`: the one with the highest threshold not
/// exceeding it.
///
/// The input need not be sorted. Tiers are ordered by threshold with a stable
/// sort, so when two tiers share a threshold the one supplied later wins.
/// Returns `None` when `query` sits below every threshold.
pub fn matching_tier<T: Tiered>(tiers: &[T], query: Decimal) -> Option<&T> {
    let mut ordered: Vec<&T> = tiers.iter().collect();
    ordered.sort_by_key(|t| t.threshold());

    let mut matched = None;
    for tier in ordered {
        if query >= tier.threshold() {
            matched = Some(tier);
        } else {
            break;
        }
    }
    matched
}

/// Step-function lookup. Queries below the lowest threshold resolve to zero.
pub fn lookup<T: Tiered>(tiers: &[T], query: Decimal) -> Decimal {
    matching_tier(tiers, query).map_or(Decimal::ZERO, |t| t.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rate_table() -> Vec<RateTier> {
        vec![
            RateTier {
                minimum_revenue: dec!(0),
                rate: dec!(0),
            },
            RateTier {
                minimum_revenue: dec!(150000000),
                rate: dec!(0.005),
            },
            RateTier {
                minimum_revenue: dec!(300000000),
                rate: dec!(0.01),
            },
        ]
    }

    #[test]
    fn test_exact_threshold_is_inclusive() {
        let table = rate_table();
        assert_eq!(lookup(&table, dec!(150000000)), dec!(0.005));
        assert_eq!(lookup(&table, dec!(149999999.99)), dec!(0));
        assert_eq!(lookup(&table, dec!(300000000)), dec!(0.01));
    }

    #[test]
    fn test_above_highest_threshold_uses_last_tier() {
        assert_eq!(lookup(&rate_table(), dec!(9000000000)), dec!(0.01));
    }

    #[test]
    fn test_below_lowest_threshold_is_zero() {
        let table = vec![Tier {
            threshold: dec!(100),
            value: dec!(0.7),
        }];
        assert_eq!(lookup(&table, dec!(99)), Decimal::ZERO);
        assert!(matching_tier(&table, dec!(99)).is_none());
    }

    #[test]
    fn test_unsorted_input_is_sorted_internally() {
        let mut table = rate_table();
        table.reverse();
        assert_eq!(lookup(&table, dec!(200000000)), dec!(0.005));
    }

    #[test]
    fn test_duplicate_threshold_later_row_wins() {
        let table = vec![
            Tier {
                threshold: dec!(0.30),
                value: dec!(0.8),
            },
            Tier {
                threshold: dec!(0),
                value: dec!(1),
            },
            Tier {
                threshold: dec!(0.30),
                value: dec!(0.6),
            },
        ];
        assert_eq!(lookup(&table, dec!(0.31)), dec!(0.6));
    }

    #[test]
    fn test_empty_table() {
        let table: Vec<Tier> = Vec::new();
        assert_eq!(lookup(&table, dec!(5)), Decimal::ZERO);
    }

    #[test]
    fn test_cost_factor_cost_ratio_above_one() {
        let table = vec![
            CostFactorTier {
                minimum_cost_ratio: dec!(0),
                factor: dec!(1),
            },
            CostFactorTier {
                minimum_cost_ratio: dec!(0.35),
                factor: dec!(0),
            },
        ];
        assert_eq!(lookup(&table, dec!(1.4)), dec!(0));
    }
}
