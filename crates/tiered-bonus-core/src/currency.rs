use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BonusError;
use crate::types::{CurrencyUnit, Money, Rate};
use crate::BonusResult;

/// Which monetary fields a foreign-unit input converts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    /// Revenue is entered in the input unit; cost is always base currency.
    #[default]
    RevenueOnly,
    /// All four fields are entered in the input unit.
    AllFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// Unit the person amounts are entered in
    #[serde(default)]
    pub input_unit: CurrencyUnit,
    /// Base-currency units per one foreign unit
    #[serde(default = "default_conversion_rate")]
    pub conversion_rate: Rate,
    #[serde(default)]
    pub mode: ConversionMode,
    #[serde(default = "default_base_code")]
    pub base_code: String,
    #[serde(default = "default_foreign_code")]
    pub foreign_code: String,
}

fn default_conversion_rate() -> Rate {
    dec!(5200)
}

fn default_base_code() -> String {
    "VND".into()
}

fn default_foreign_code() -> String {
    "RM".into()
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            input_unit: CurrencyUnit::Base,
            conversion_rate: default_conversion_rate(),
            mode: ConversionMode::RevenueOnly,
            base_code: default_base_code(),
            foreign_code: default_foreign_code(),
        }
    }
}

/// The four monetary inputs of one person, in a single unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    pub line_a_revenue: Money,
    pub line_a_cost: Money,
    pub line_b_revenue: Money,
    pub line_b_cost: Money,
}

impl LineAmounts {
    pub fn is_zero(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_zero())
    }

    /// Field name / amount pairs, in declaration order.
    pub fn fields(&self) -> [(&'static str, Money); 4] {
        [
            ("line_a_revenue", self.line_a_revenue),
            ("line_a_cost", self.line_a_cost),
            ("line_b_revenue", self.line_b_revenue),
            ("line_b_cost", self.line_b_cost),
        ]
    }
}

/// Reject a conversion setup the batch must not run with.
pub fn validate_settings(settings: &CurrencySettings) -> BonusResult<()> {
    if settings.conversion_rate <= Decimal::ZERO {
        return Err(BonusError::config(
            "conversion_rate",
            format!(
                "Conversion rate must be positive, got {}",
                settings.conversion_rate
            ),
        ));
    }
    Ok(())
}

/// Convert a person's amounts into base currency.
///
/// Base-unit input passes through unchanged. Foreign-unit input is multiplied
/// by the conversion rate: revenue only, or all four fields, per
/// [`ConversionMode`].
pub fn normalize(values: &LineAmounts, settings: &CurrencySettings) -> BonusResult<LineAmounts> {
    validate_settings(settings)?;

    if settings.input_unit == CurrencyUnit::Base {
        return Ok(*values);
    }

    let rate = settings.conversion_rate;
    let convert = |field: &str, amount: Money| -> BonusResult<Money> {
        amount
            .checked_mul(rate)
            .ok_or_else(|| BonusError::overflow(field, format!("{amount} x {rate}")))
    };

    let (line_a_cost, line_b_cost) = match settings.mode {
        ConversionMode::RevenueOnly => (values.line_a_cost, values.line_b_cost),
        ConversionMode::AllFields => (
            convert("line_a_cost", values.line_a_cost)?,
            convert("line_b_cost", values.line_b_cost)?,
        ),
    };

    Ok(LineAmounts {
        line_a_revenue: convert("line_a_revenue", values.line_a_revenue)?,
        line_a_cost,
        line_b_revenue: convert("line_b_revenue", values.line_b_revenue)?,
        line_b_cost,
    })
}
