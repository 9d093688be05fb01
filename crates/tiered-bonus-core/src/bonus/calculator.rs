use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::policy::{validate_threshold, RoundingSettings};
use crate::currency::LineAmounts;
use crate::error::BonusError;
use crate::tiers::table::parse_cell;
use crate::tiers::{lookup, CostFactorTier, RateTier};
use crate::types::{Factor, Money, Rate};
use crate::BonusResult;

/// Share of the distance below the eligibility threshold paid out as the
/// optimization bonus.
pub const OPTIMIZATION_COEFFICIENT: Decimal = dec!(0.25);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One person's figures for both business lines.
///
/// Deserializes through [`RawPersonInput`], so an amount that is not a finite
/// number is reported as a validation error naming the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPersonInput")]
pub struct PersonInput {
    pub name: String,
    pub line_a_revenue: Money,
    pub line_a_cost: Money,
    pub line_b_revenue: Money,
    pub line_b_cost: Money,
}

/// A person as it arrives in a JSON batch, amount cells still untyped.
///
/// Missing, `null` and blank cells count as zero, as in a roster file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPersonInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub line_a_revenue: Value,
    #[serde(default)]
    pub line_a_cost: Value,
    #[serde(default)]
    pub line_b_revenue: Value,
    #[serde(default)]
    pub line_b_cost: Value,
}

impl RawPersonInput {
    /// Parse the amount cells; a bad cell fails naming `record` and the field.
    pub fn parse(&self, record: &str) -> BonusResult<PersonInput> {
        let cells = [
            ("line_a_revenue", &self.line_a_revenue),
            ("line_a_cost", &self.line_a_cost),
            ("line_b_revenue", &self.line_b_revenue),
            ("line_b_cost", &self.line_b_cost),
        ];
        let mut amounts = [Decimal::ZERO; 4];
        for (amount, (field, cell)) in amounts.iter_mut().zip(cells) {
            *amount =
                parse_amount(cell).map_err(|reason| BonusError::validation(record, field, reason))?;
        }

        Ok(PersonInput {
            name: self.name.clone(),
            line_a_revenue: amounts[0],
            line_a_cost: amounts[1],
            line_b_revenue: amounts[2],
            line_b_cost: amounts[3],
        })
    }
}

impl TryFrom<RawPersonInput> for PersonInput {
    type Error = BonusError;

    fn try_from(raw: RawPersonInput) -> BonusResult<Self> {
        raw.parse(display_name(&raw.name))
    }
}

fn parse_amount(cell: &Value) -> Result<Money, String> {
    match cell {
        Value::Null => Ok(Decimal::ZERO),
        Value::String(s) if s.trim().is_empty() => Ok(Decimal::ZERO),
        other => parse_cell(other),
    }
}

/// Trimmed name, or `<unnamed>` for a blank one.
pub fn display_name(name: &str) -> &str {
    match name.trim() {
        "" => "<unnamed>",
        trimmed => trimmed,
    }
}

impl PersonInput {
    pub fn amounts(&self) -> LineAmounts {
        LineAmounts {
            line_a_revenue: self.line_a_revenue,
            line_a_cost: self.line_a_cost,
            line_b_revenue: self.line_b_revenue,
            line_b_cost: self.line_b_cost,
        }
    }

    /// Same person, different amounts (e.g. after currency normalization).
    pub fn with_amounts(&self, amounts: LineAmounts) -> PersonInput {
        PersonInput {
            name: self.name.clone(),
            line_a_revenue: amounts.line_a_revenue,
            line_a_cost: amounts.line_a_cost,
            line_b_revenue: amounts.line_b_revenue,
            line_b_cost: amounts.line_b_cost,
        }
    }

    /// An untouched form row: no name and nothing entered.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.amounts().is_zero()
    }

    pub fn label(&self) -> &str {
        display_name(&self.name)
    }

    /// Reject negative amounts, naming `record` and the offending field.
    pub fn validate(&self, record: &str) -> BonusResult<()> {
        for (field, amount) in self.amounts().fields() {
            if amount < Decimal::ZERO {
                return Err(BonusError::validation(
                    record,
                    field,
                    format!("amount must be non-negative, got {amount}"),
                ));
            }
        }
        Ok(())
    }
}

/// Per-line breakdown, all amounts in base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineResult {
    pub revenue: Money,
    pub cost: Money,
    pub cost_ratio: Rate,
    pub factor: Factor,
    pub sales_bonus: Money,
    pub optimization_bonus: Money,
}

impl LineResult {
    pub fn bonus(&self) -> Money {
        self.sales_bonus + self.optimization_bonus
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonResult {
    pub name: String,
    pub line_a: LineResult,
    pub line_b: LineResult,
    pub combined_revenue: Money,
    pub combined_rate: Rate,
    /// Sum of all four bonus terms, rounded to the base currency unit
    pub total_bonus: Money,
}

impl PersonResult {
    pub fn unrounded_total(&self) -> Money {
        self.line_a.bonus() + self.line_b.bonus()
    }
}

// ---------------------------------------------------------------------------
// Formula pieces
// ---------------------------------------------------------------------------

/// Cost over revenue; zero when there is no revenue.
pub fn cost_ratio(revenue: Money, cost: Money) -> BonusResult<Rate> {
    if revenue > Decimal::ZERO {
        cost.checked_div(revenue)
            .ok_or_else(|| BonusError::overflow("cost_ratio", format!("{cost} / {revenue}")))
    } else {
        Ok(Decimal::ZERO)
    }
}

/// Linear incentive for a line running below the eligibility threshold.
///
/// Zero for a line without revenue or with a cost ratio at or above the
/// threshold.
pub fn optimization_bonus(
    revenue: Money,
    ratio: Rate,
    eligibility_threshold: Rate,
) -> BonusResult<Money> {
    if revenue > Decimal::ZERO && ratio < eligibility_threshold {
        let shortfall = eligibility_threshold - ratio;
        OPTIMIZATION_COEFFICIENT
            .checked_mul(shortfall)
            .and_then(|v| v.checked_mul(revenue))
            .ok_or_else(|| {
                BonusError::overflow(
                    "optimization_bonus",
                    format!("{OPTIMIZATION_COEFFICIENT} x {shortfall} x {revenue}"),
                )
            })
    } else {
        Ok(Decimal::ZERO)
    }
}

fn compute_line(
    line: &str,
    revenue: Money,
    cost: Money,
    combined_rate: Rate,
    factor_table: &[CostFactorTier],
    eligibility_threshold: Rate,
) -> BonusResult<LineResult> {
    let ratio = cost_ratio(revenue, cost).map_err(|e| e.on_line(line))?;
    let factor = lookup(factor_table, ratio);
    let sales_bonus = revenue
        .checked_mul(combined_rate)
        .and_then(|v| v.checked_mul(factor))
        .ok_or_else(|| {
            BonusError::overflow(
                &format!("{line}_sales_bonus"),
                format!("{revenue} x {combined_rate} x {factor}"),
            )
        })?;
    let optimization_bonus =
        optimization_bonus(revenue, ratio, eligibility_threshold).map_err(|e| e.on_line(line))?;

    Ok(LineResult {
        revenue,
        cost,
        cost_ratio: ratio,
        factor,
        sales_bonus,
        optimization_bonus,
    })
}

// ---------------------------------------------------------------------------
// Person computation
// ---------------------------------------------------------------------------

/// Compute one person's bonus from amounts already in base currency.
///
/// Returns `Ok(None)` for a blank record (no name, all amounts zero). Negative
/// amounts, an eligibility threshold outside [0, 1] and results beyond the
/// decimal range are errors.
pub fn compute_person(
    person: &PersonInput,
    rate_table: &[RateTier],
    factor_table: &[CostFactorTier],
    eligibility_threshold: Rate,
    rounding: &RoundingSettings,
) -> BonusResult<Option<PersonResult>> {
    validate_threshold(eligibility_threshold)?;
    person.validate(person.label())?;

    if person.is_blank() {
        tracing::debug!("skipping blank record");
        return Ok(None);
    }

    compute_amounts(person, rate_table, factor_table, eligibility_threshold, rounding)
        .map(Some)
        .map_err(|e| e.in_record(person.label()))
}

fn compute_amounts(
    person: &PersonInput,
    rate_table: &[RateTier],
    factor_table: &[CostFactorTier],
    eligibility_threshold: Rate,
    rounding: &RoundingSettings,
) -> BonusResult<PersonResult> {
    let combined_revenue = person
        .line_a_revenue
        .checked_add(person.line_b_revenue)
        .ok_or_else(|| {
            BonusError::overflow(
                "combined_revenue",
                format!("{} + {}", person.line_a_revenue, person.line_b_revenue),
            )
        })?;
    let combined_rate = lookup(rate_table, combined_revenue);

    let line_a = compute_line(
        "line_a",
        person.line_a_revenue,
        person.line_a_cost,
        combined_rate,
        factor_table,
        eligibility_threshold,
    )?;
    let line_b = compute_line(
        "line_b",
        person.line_b_revenue,
        person.line_b_cost,
        combined_rate,
        factor_table,
        eligibility_threshold,
    )?;

    let unrounded = [
        line_a.sales_bonus,
        line_a.optimization_bonus,
        line_b.sales_bonus,
        line_b.optimization_bonus,
    ]
    .into_iter()
    .try_fold(Decimal::ZERO, |acc, term| acc.checked_add(term))
    .ok_or_else(|| BonusError::overflow("total_bonus", "sum of the four bonus terms".into()))?;
    let total_bonus = rounding.apply(unrounded);

    tracing::debug!(
        person = person.label(),
        %combined_revenue,
        %combined_rate,
        %total_bonus,
        "computed bonus"
    );

    Ok(PersonResult {
        name: person.name.trim().to_string(),
        line_a,
        line_b,
        combined_revenue,
        combined_rate,
        total_bonus,
    })
}
