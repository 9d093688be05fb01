use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::currency::{validate_settings, CurrencySettings};
use crate::error::BonusError;
use crate::tiers::RawTierRow;
use crate::types::{Money, Rate};
use crate::BonusResult;

/// Tie-breaking rule for the final total bonus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    /// x.5 moves away from zero
    #[default]
    HalfUp,
    /// x.5 moves to the even neighbour
    HalfEven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingSettings {
    #[serde(default)]
    pub rule: RoundingRule,
    /// Decimal places of the base currency's smallest unit (0 for VND)
    #[serde(default)]
    pub decimal_places: u32,
}

impl Default for RoundingSettings {
    fn default() -> Self {
        RoundingSettings {
            rule: RoundingRule::HalfUp,
            decimal_places: 0,
        }
    }
}

impl RoundingSettings {
    pub fn apply(&self, amount: Money) -> Money {
        let strategy = match self.rule {
            RoundingRule::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingRule::HalfEven => RoundingStrategy::MidpointNearestEven,
        };
        amount.round_dp_with_strategy(self.decimal_places, strategy)
    }
}

/// Everything a batch needs besides the people: both tables, the eligibility
/// threshold, currency handling and rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusPolicy {
    /// Cost ratio below which a line earns the optimization bonus
    #[serde(default = "default_eligibility_threshold")]
    pub eligibility_threshold: Rate,
    #[serde(default = "default_rate_table")]
    pub rate_table: Vec<RawTierRow>,
    #[serde(default = "default_cost_factor_table")]
    pub cost_factor_table: Vec<RawTierRow>,
    #[serde(default)]
    pub currency: CurrencySettings,
    #[serde(default)]
    pub rounding: RoundingSettings,
}

impl Default for BonusPolicy {
    fn default() -> Self {
        BonusPolicy {
            eligibility_threshold: default_eligibility_threshold(),
            rate_table: default_rate_table(),
            cost_factor_table: default_cost_factor_table(),
            currency: CurrencySettings::default(),
            rounding: RoundingSettings::default(),
        }
    }
}

impl BonusPolicy {
    /// Check the scalar settings. Tables are never rejected; see
    /// [`crate::tiers::clean_rows`].
    pub fn validate(&self) -> BonusResult<()> {
        validate_threshold(self.eligibility_threshold)?;
        validate_settings(&self.currency)
    }
}

pub(crate) fn validate_threshold(threshold: Rate) -> BonusResult<()> {
    if threshold < Decimal::ZERO || threshold > Decimal::ONE {
        return Err(BonusError::config(
            "eligibility_threshold",
            format!("Eligibility threshold must be between 0 and 1, got {threshold}"),
        ));
    }
    Ok(())
}

/// Combined-revenue rate tiers (revenue in base currency).
pub fn default_rate_table() -> Vec<RawTierRow> {
    [
        (dec!(0), dec!(0.000)),
        (dec!(150000000), dec!(0.005)),
        (dec!(300000000), dec!(0.010)),
        (dec!(500000000), dec!(0.015)),
        (dec!(800000000), dec!(0.020)),
        (dec!(1000000000), dec!(0.025)),
        (dec!(2000000000), dec!(0.030)),
    ]
    .into_iter()
    .map(|(threshold, value)| RawTierRow::new(threshold, value))
    .collect()
}

/// Per-line cost-ratio factor tiers.
pub fn default_cost_factor_table() -> Vec<RawTierRow> {
    [
        (dec!(0.00), dec!(1.00)),
        (dec!(0.30), dec!(0.80)),
        (dec!(0.32), dec!(0.50)),
        (dec!(0.35), dec!(0.00)),
    ]
    .into_iter()
    .map(|(threshold, value)| RawTierRow::new(threshold, value))
    .collect()
}

fn default_eligibility_threshold() -> Rate {
    dec!(0.30)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::lookup_rows;

    #[test]
    fn test_half_up_vs_half_even() {
        let up = RoundingSettings::default();
        let even = RoundingSettings {
            rule: RoundingRule::HalfEven,
            decimal_places: 0,
        };
        assert_eq!(up.apply(dec!(2.5)), dec!(3));
        assert_eq!(even.apply(dec!(2.5)), dec!(2));
        assert_eq!(up.apply(dec!(3.5)), dec!(4));
        assert_eq!(even.apply(dec!(3.5)), dec!(4));
        assert_eq!(up.apply(dec!(2.49)), dec!(2));
    }

    #[test]
    fn test_rounding_decimal_places() {
        let cents = RoundingSettings {
            rule: RoundingRule::HalfUp,
            decimal_places: 2,
        };
        assert_eq!(cents.apply(dec!(10.005)), dec!(10.01));
    }

    #[test]
    fn test_default_policy_is_valid() {
        assert!(BonusPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_default_tables() {
        let policy = BonusPolicy::default();
        assert_eq!(lookup_rows(&policy.rate_table, dec!(1200000000)), dec!(0.025));
        assert_eq!(lookup_rows(&policy.cost_factor_table, dec!(0.33)), dec!(0.5));
        assert_eq!(lookup_rows(&policy.cost_factor_table, dec!(0.40)), dec!(0));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        for threshold in [dec!(-0.01), dec!(1.01)] {
            let policy = BonusPolicy {
                eligibility_threshold: threshold,
                ..BonusPolicy::default()
            };
            assert!(matches!(
                policy.validate().unwrap_err(),
                BonusError::ConfigurationError { .. }
            ));
        }
    }

    #[test]
    fn test_partial_policy_fills_defaults() {
        let policy: BonusPolicy =
            serde_json::from_str(r#"{ "eligibility_threshold": "0.25" }"#).unwrap();
        assert_eq!(policy.eligibility_threshold, dec!(0.25));
        assert_eq!(policy.rate_table.len(), 7);
        assert_eq!(policy.currency.conversion_rate, dec!(5200));
    }
}
