use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::calculator::{compute_person, display_name, PersonInput, PersonResult, RawPersonInput};
use super::policy::BonusPolicy;
use crate::currency::normalize;
use crate::error::BonusError;
use crate::tiers::{clean_rows, CleanedTable, CostFactorTier, DiscardedRow, RateTier};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::BonusResult;

/// A batch of people plus the policy to score them with.
///
/// Deserializes through [`RawBonusBatchInput`]; prefer [`BonusBatchInput::from_json`]
/// to get a typed validation error naming the row of a malformed amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawBonusBatchInput")]
pub struct BonusBatchInput {
    pub persons: Vec<PersonInput>,
    pub policy: BonusPolicy,
}

/// A batch as it arrives over the wire, person amounts still untyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBonusBatchInput {
    pub persons: Vec<RawPersonInput>,
    #[serde(default)]
    pub policy: BonusPolicy,
}

impl TryFrom<RawBonusBatchInput> for BonusBatchInput {
    type Error = BonusError;

    fn try_from(raw: RawBonusBatchInput) -> BonusResult<Self> {
        let persons = raw
            .persons
            .iter()
            .enumerate()
            .map(|(index, person)| person.parse(&record_label(index, &person.name)))
            .collect::<BonusResult<Vec<_>>>()?;
        Ok(BonusBatchInput {
            persons,
            policy: raw.policy,
        })
    }
}

impl BonusBatchInput {
    pub fn from_json(text: &str) -> BonusResult<Self> {
        let raw: RawBonusBatchInput = serde_json::from_str(text)?;
        BonusBatchInput::try_from(raw)
    }

    pub fn from_value(value: serde_json::Value) -> BonusResult<Self> {
        let raw: RawBonusBatchInput = serde_json::from_value(value)?;
        BonusBatchInput::try_from(raw)
    }
}

/// Cleaning outcome for one of the two policy tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDiagnostics {
    pub table: String,
    pub usable_rows: usize,
    pub discarded: Vec<DiscardedRow>,
    pub notes: Vec<String>,
}

impl TableDiagnostics {
    fn from_cleaned(table: &str, cleaned: &CleanedTable) -> Self {
        TableDiagnostics {
            table: table.into(),
            usable_rows: cleaned.tiers.len(),
            discarded: cleaned.discarded.clone(),
            notes: cleaned.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub records_in: usize,
    pub computed: usize,
    pub skipped: usize,
    pub total_combined_revenue: Money,
    pub total_bonus: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusBatchOutput {
    /// Computed records, in input order
    pub results: Vec<PersonResult>,
    /// Zero-based input positions of blank records
    pub skipped_rows: Vec<usize>,
    pub diagnostics: Vec<TableDiagnostics>,
    pub summary: BatchSummary,
}

/// Run the bonus engine over a batch of people.
///
/// The whole batch is rejected if the policy is invalid or any record carries
/// a negative amount; the error names the row. Malformed table rows are
/// dropped and reported as warnings. Blank records are skipped. An empty
/// result set is reported as a warning, not an error.
pub fn calculate_bonuses(
    input: &BonusBatchInput,
) -> BonusResult<ComputationOutput<BonusBatchOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let policy = &input.policy;

    policy.validate()?;

    let rate_clean = clean_rows(&policy.rate_table);
    let factor_clean = clean_rows(&policy.cost_factor_table);
    for (name, cleaned) in [("rate_table", &rate_clean), ("cost_factor_table", &factor_clean)] {
        for warning in cleaned.warnings(name) {
            tracing::warn!(table = name, "{warning}");
            warnings.push(warning);
        }
    }
    let rate_table: Vec<RateTier> = rate_clean.typed();
    let factor_table: Vec<CostFactorTier> = factor_clean.typed();

    for (index, person) in input.persons.iter().enumerate() {
        person.validate(&record_label(index, &person.name))?;
    }

    let outcomes = map_records(&input.persons, |person| {
        let amounts = normalize(&person.amounts(), &policy.currency)
            .map_err(|e| e.in_record(person.label()))?;
        compute_person(
            &person.with_amounts(amounts),
            &rate_table,
            &factor_table,
            policy.eligibility_threshold,
            &policy.rounding,
        )
    })?;

    let mut results = Vec::with_capacity(outcomes.len());
    let mut skipped_rows = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Some(result) => results.push(result),
            None => skipped_rows.push(index),
        }
    }

    if results.is_empty() {
        let warning = if input.persons.is_empty() {
            "No results produced: the batch contained no records".to_string()
        } else {
            format!(
                "No results produced: all {} records were blank",
                input.persons.len()
            )
        };
        tracing::warn!("{warning}");
        warnings.push(warning);
    }

    let summary = BatchSummary {
        records_in: input.persons.len(),
        computed: results.len(),
        skipped: skipped_rows.len(),
        total_combined_revenue: checked_total(&results, "total_combined_revenue", |r| {
            r.combined_revenue
        })?,
        total_bonus: checked_total(&results, "total_bonus", |r| r.total_bonus)?,
    };

    tracing::info!(
        records = summary.records_in,
        computed = summary.computed,
        skipped = summary.skipped,
        total_bonus = %summary.total_bonus,
        "bonus batch complete"
    );

    let output = BonusBatchOutput {
        results,
        skipped_rows,
        diagnostics: vec![
            TableDiagnostics::from_cleaned("rate_table", &rate_clean),
            TableDiagnostics::from_cleaned("cost_factor_table", &factor_clean),
        ],
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tiered bonus: combined-revenue rate x cost-ratio factor per line, \
         plus 0.25 x (threshold - cost ratio) x revenue below the eligibility threshold",
        &serde_json::json!({
            "eligibility_threshold": policy.eligibility_threshold.to_string(),
            "input_unit": policy.currency.input_unit,
            "conversion_rate": policy.currency.conversion_rate.to_string(),
            "conversion_mode": policy.currency.mode,
            "base_currency": policy.currency.base_code,
            "rounding": policy.rounding,
            "invalid_record_policy": "reject_batch",
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn record_label(index: usize, name: &str) -> String {
    format!("row {} ({})", index + 1, display_name(name))
}

fn checked_total(
    results: &[PersonResult],
    field: &str,
    amount: impl Fn(&PersonResult) -> Money,
) -> BonusResult<Money> {
    results
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(amount(r)))
        .ok_or_else(|| BonusError::overflow(field, format!("sum over {} records", results.len())))
}

#[cfg(not(feature = "parallel"))]
fn map_records<F>(persons: &[PersonInput], f: F) -> BonusResult<Vec<Option<PersonResult>>>
where
    F: Fn(&PersonInput) -> BonusResult<Option<PersonResult>>,
{
    persons.iter().map(f).collect()
}

#[cfg(feature = "parallel")]
fn map_records<F>(persons: &[PersonInput], f: F) -> BonusResult<Vec<Option<PersonResult>>>
where
    F: Fn(&PersonInput) -> BonusResult<Option<PersonResult>> + Sync + Send,
{
    use rayon::prelude::*;
    // Indexed collect keeps input order.
    persons.par_iter().map(f).collect()
}
