use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::bonus::{PersonInput, PersonResult};
use crate::error::BonusError;
use crate::types::{parse_decimal, Factor, Money, Rate};
use crate::BonusResult;

/// Column order of the export file.
pub const EXPORT_COLUMNS: [&str; 16] = [
    "name",
    "line_a_revenue",
    "line_a_cost",
    "line_b_revenue",
    "line_b_cost",
    "line_a_cost_ratio_pct",
    "line_b_cost_ratio_pct",
    "combined_revenue",
    "combined_rate_pct",
    "line_a_factor",
    "line_b_factor",
    "line_a_sales_bonus",
    "line_b_sales_bonus",
    "line_a_optimization_bonus",
    "line_b_optimization_bonus",
    "total_bonus",
];

/// Columns a roster file must carry; `name` is optional.
pub const ROSTER_COLUMNS: [&str; 4] = [
    "line_a_revenue",
    "line_a_cost",
    "line_b_revenue",
    "line_b_cost",
];

/// One exported line. Amounts are plain decimals in base currency; ratios and
/// the combined rate are percentage strings with two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_a_revenue: Money,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_a_cost: Money,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_b_revenue: Money,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_b_cost: Money,
    pub line_a_cost_ratio_pct: String,
    pub line_b_cost_ratio_pct: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub combined_revenue: Money,
    pub combined_rate_pct: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_a_factor: Factor,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_b_factor: Factor,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_a_sales_bonus: Money,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_b_sales_bonus: Money,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_a_optimization_bonus: Money,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_b_optimization_bonus: Money,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_bonus: Money,
}

impl From<&PersonResult> for ExportRow {
    fn from(r: &PersonResult) -> Self {
        ExportRow {
            name: r.name.clone(),
            line_a_revenue: r.line_a.revenue.normalize(),
            line_a_cost: r.line_a.cost.normalize(),
            line_b_revenue: r.line_b.revenue.normalize(),
            line_b_cost: r.line_b.cost.normalize(),
            line_a_cost_ratio_pct: percent_string(r.line_a.cost_ratio),
            line_b_cost_ratio_pct: percent_string(r.line_b.cost_ratio),
            combined_revenue: r.combined_revenue.normalize(),
            combined_rate_pct: percent_string(r.combined_rate),
            line_a_factor: r.line_a.factor.normalize(),
            line_b_factor: r.line_b.factor.normalize(),
            line_a_sales_bonus: r.line_a.sales_bonus.normalize(),
            line_b_sales_bonus: r.line_b.sales_bonus.normalize(),
            line_a_optimization_bonus: r.line_a.optimization_bonus.normalize(),
            line_b_optimization_bonus: r.line_b.optimization_bonus.normalize(),
            total_bonus: r.total_bonus.normalize(),
        }
    }
}

impl ExportRow {
    pub fn line_a_cost_ratio(&self) -> Option<Rate> {
        parse_decimal(&self.line_a_cost_ratio_pct)
    }

    pub fn line_b_cost_ratio(&self) -> Option<Rate> {
        parse_decimal(&self.line_b_cost_ratio_pct)
    }

    pub fn combined_rate(&self) -> Option<Rate> {
        parse_decimal(&self.combined_rate_pct)
    }
}

/// `0.25` -> `"25.00%"`
pub fn percent_string(rate: Rate) -> String {
    format!("{:.2}%", (rate * Decimal::ONE_HUNDRED).round_dp(2))
}

/// Write results as comma-separated text with a header row.
pub fn write_csv(results: &[PersonResult]) -> BonusResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    if results.is_empty() {
        wtr.write_record(EXPORT_COLUMNS)?;
    }
    for result in results {
        wtr.serialize(ExportRow::from(result))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| BonusError::ExportError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| BonusError::ExportError(e.to_string()))
}

/// Parse text produced by [`write_csv`] back into rows.
pub fn read_csv(text: &str) -> BonusResult<Vec<ExportRow>> {
    let mut rdr = csv::Reader::from_reader(text.as_bytes());
    let rows = rdr.deserialize().collect::<Result<Vec<ExportRow>, _>>()?;
    Ok(rows)
}

/// Parse a roster of people.
///
/// Header must contain the four amount columns (any order, case-insensitive);
/// `name` is optional. Empty amount cells count as zero. Cells that are not
/// finite numbers fail with a validation error naming the row and column.
pub fn read_persons_csv(text: &str) -> BonusResult<Vec<PersonInput>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let name_col = column("name");
    let mut amount_cols = [0usize; 4];
    for (slot, field) in amount_cols.iter_mut().zip(ROSTER_COLUMNS) {
        *slot = column(field).ok_or_else(|| {
            BonusError::InsufficientData(format!("roster is missing the '{field}' column"))
        })?;
    }

    let mut persons = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let record = record?;
        let row = format!("row {}", index + 1);

        let mut amounts = [Decimal::ZERO; 4];
        for ((amount, col), field) in amounts.iter_mut().zip(amount_cols).zip(ROSTER_COLUMNS) {
            let raw = record.get(col).unwrap_or("");
            if raw.is_empty() {
                continue;
            }
            *amount = parse_decimal(raw).ok_or_else(|| {
                BonusError::validation(&row, field, format!("'{raw}' is not a finite number"))
            })?;
        }

        persons.push(PersonInput {
            name: name_col
                .and_then(|c| record.get(c))
                .unwrap_or("")
                .to_string(),
            line_a_revenue: amounts[0],
            line_a_cost: amounts[1],
            line_b_revenue: amounts[2],
            line_b_cost: amounts[3],
        });
    }

    Ok(persons)
}
