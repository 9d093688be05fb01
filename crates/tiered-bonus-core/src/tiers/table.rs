use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use super::lookup::{matching_tier, Tier, Tiered};
use crate::types::{parse_decimal, with_metadata, ComputationOutput};
use crate::BonusResult;

/// One row of an editable table as it arrives from a form or a file.
///
/// Cells stay untyped so half-finished edits survive deserialization; they are
/// parsed by [`clean_rows`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTierRow {
    #[serde(default, alias = "minimum_revenue", alias = "minimum_cost_ratio")]
    pub threshold: Value,
    #[serde(default, alias = "rate", alias = "factor")]
    pub value: Value,
}

impl RawTierRow {
    pub fn new(threshold: Decimal, value: Decimal) -> Self {
        RawTierRow {
            threshold: Value::String(threshold.to_string()),
            value: Value::String(value.to_string()),
        }
    }
}

/// A row dropped during cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedRow {
    /// Zero-based position in the table as supplied
    pub index: usize,
    pub field: String,
    pub reason: String,
}

/// Result of a cleaning pass: usable tiers in ascending threshold order, plus
/// what was thrown away and anything suspicious about what was kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedTable {
    pub tiers: Vec<Tier>,
    pub discarded: Vec<DiscardedRow>,
    pub notes: Vec<String>,
}

impl CleanedTable {
    /// Typed copy of the usable tiers.
    pub fn typed<T: From<Tier>>(&self) -> Vec<T> {
        self.tiers.iter().copied().map(T::from).collect()
    }

    /// Human-readable diagnostics, prefixed with the table name.
    pub fn warnings(&self, table: &str) -> Vec<String> {
        let discarded = self.discarded.iter().map(|d| {
            format!(
                "{table}: row {} discarded ({}: {})",
                d.index + 1,
                d.field,
                d.reason
            )
        });
        let notes = self.notes.iter().map(|n| format!("{table}: {n}"));
        discarded.chain(notes).collect()
    }
}

/// Parse a single cell into a finite decimal.
pub fn parse_cell(cell: &Value) -> Result<Decimal, String> {
    match cell {
        Value::Number(n) => {
            let text = n.to_string();
            parse_decimal(&text).ok_or_else(|| format!("'{text}' is not a finite number"))
        }
        Value::String(s) => parse_decimal(s).ok_or_else(|| {
            if s.trim().is_empty() {
                "empty cell".to_string()
            } else {
                format!("'{s}' is not a finite number")
            }
        }),
        Value::Null => Err("empty cell".into()),
        Value::Bool(_) => Err("boolean is not a number".into()),
        Value::Array(_) | Value::Object(_) => Err("cell is not a scalar".into()),
    }
}

/// Split an editable table into usable tiers and discarded rows.
///
/// Rows whose threshold or value does not parse as a finite number are
/// dropped and reported; they never make the table unusable. The kept tiers
/// are returned sorted by threshold (stable, so duplicate thresholds keep
/// their supplied order and the later one still wins a lookup).
pub fn clean_rows(rows: &[RawTierRow]) -> CleanedTable {
    let mut tiers = Vec::with_capacity(rows.len());
    let mut discarded = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match (parse_cell(&row.threshold), parse_cell(&row.value)) {
            (Ok(threshold), Ok(value)) => tiers.push(Tier { threshold, value }),
            (Err(reason), _) => discarded.push(DiscardedRow {
                index,
                field: "threshold".into(),
                reason,
            }),
            (_, Err(reason)) => discarded.push(DiscardedRow {
                index,
                field: "value".into(),
                reason,
            }),
        }
    }

    for row in &discarded {
        tracing::debug!(
            row = row.index,
            field = %row.field,
            reason = %row.reason,
            "discarding malformed tier row"
        );
    }

    tiers.sort_by_key(|t| t.threshold);
    let notes = table_notes(&tiers);

    CleanedTable {
        tiers,
        discarded,
        notes,
    }
}

fn table_notes(tiers: &[Tier]) -> Vec<String> {
    let mut notes = Vec::new();

    match tiers.first() {
        None => notes.push("no usable rows; every lookup resolves to 0".into()),
        Some(lowest) if lowest.threshold > Decimal::ZERO => notes.push(format!(
            "lowest threshold is {}; smaller queries resolve to 0",
            lowest.threshold
        )),
        Some(lowest) if lowest.threshold < Decimal::ZERO => notes.push(format!(
            "negative threshold {} can never be undercut by a non-negative query",
            lowest.threshold
        )),
        Some(_) => {}
    }

    for pair in tiers.windows(2) {
        if pair[0].threshold == pair[1].threshold {
            notes.push(format!(
                "threshold {} appears more than once; the later row wins",
                pair[1].threshold
            ));
        }
    }

    if tiers.iter().any(|t| t.value < Decimal::ZERO) {
        notes.push("table contains negative values".into());
    }

    notes
}

/// Look up `query` directly against an editable table, skipping malformed rows.
pub fn lookup_rows(rows: &[RawTierRow], query: Decimal) -> Decimal {
    super::lookup::lookup(&clean_rows(rows).tiers, query)
}

// ---------------------------------------------------------------------------
// Single-table evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableLookupInput {
    pub rows: Vec<RawTierRow>,
    pub query: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableLookupOutput {
    pub query: Decimal,
    pub value: Decimal,
    /// Threshold of the governing tier; `None` when the query is below all of them
    pub matched_threshold: Option<Decimal>,
    pub usable_rows: usize,
    pub discarded: Vec<DiscardedRow>,
}

/// Evaluate one editable table at one query, reporting which tier matched.
pub fn evaluate_table(
    input: &TableLookupInput,
) -> BonusResult<ComputationOutput<TableLookupOutput>> {
    let start = Instant::now();

    let cleaned = clean_rows(&input.rows);
    let warnings = cleaned.warnings("table");
    let matched = matching_tier(&cleaned.tiers, input.query);

    let output = TableLookupOutput {
        query: input.query,
        value: matched.map_or(Decimal::ZERO, |t| t.value()),
        matched_threshold: matched.map(|t| t.threshold()),
        usable_rows: cleaned.tiers.len(),
        discarded: cleaned.discarded.clone(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tiered step-function lookup (highest threshold not exceeding the query)",
        &serde_json::json!({
            "rows_supplied": input.rows.len(),
            "query": input.query.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn row(threshold: Value, value: Value) -> RawTierRow {
        RawTierRow { threshold, value }
    }

    #[test]
    fn test_malformed_rows_are_discarded_not_fatal() {
        let rows = vec![
            row(json!(0), json!(1.0)),
            row(json!("abc"), json!(0.5)),
            row(json!(0.30), json!(null)),
            row(json!("0.32"), json!("50%")),
        ];
        let cleaned = clean_rows(&rows);
        assert_eq!(cleaned.tiers.len(), 2);
        assert_eq!(cleaned.discarded.len(), 2);
        assert_eq!(cleaned.discarded[0].index, 1);
        assert_eq!(cleaned.discarded[0].field, "threshold");
        assert_eq!(cleaned.discarded[1].index, 2);
        assert_eq!(cleaned.discarded[1].field, "value");
        assert_eq!(cleaned.tiers[1].value, dec!(0.5));
    }

    #[test]
    fn test_discarded_rows_do_not_change_lookup() {
        let clean = vec![row(json!(0), json!(1)), row(json!(0.3), json!(0.8))];
        let mut dirty = clean.clone();
        dirty.insert(1, row(json!(""), json!("")));
        dirty.push(row(json!(true), json!(0)));
        for q in [dec!(0), dec!(0.29), dec!(0.3), dec!(2)] {
            assert_eq!(lookup_rows(&clean, q), lookup_rows(&dirty, q));
        }
    }

    #[test]
    fn test_cleaned_tiers_are_sorted() {
        let rows = vec![
            row(json!(300), json!(0.01)),
            row(json!(0), json!(0)),
            row(json!(150), json!(0.005)),
        ];
        let thresholds: Vec<Decimal> = clean_rows(&rows).tiers.iter().map(|t| t.threshold).collect();
        assert_eq!(thresholds, vec![dec!(0), dec!(150), dec!(300)]);
    }

    #[test]
    fn test_notes_for_missing_zero_tier_and_duplicates() {
        let rows = vec![
            row(json!(100), json!(0.1)),
            row(json!(100), json!(0.2)),
        ];
        let cleaned = clean_rows(&rows);
        assert_eq!(cleaned.notes.len(), 2);
        assert!(cleaned.notes[0].contains("lowest threshold is 100"));
        assert!(cleaned.notes[1].contains("appears more than once"));
    }

    #[test]
    fn test_empty_table_note() {
        let cleaned = clean_rows(&[]);
        assert!(cleaned.tiers.is_empty());
        assert_eq!(cleaned.notes.len(), 1);
    }

    #[test]
    fn test_field_aliases_accepted() {
        let rows: Vec<RawTierRow> = serde_json::from_value(json!([
            { "minimum_revenue": 0, "rate": 0.0 },
            { "minimum_revenue": 150000000, "rate": "0.5%" }
        ]))
        .unwrap();
        assert_eq!(lookup_rows(&rows, dec!(150000000)), dec!(0.005));
    }

    #[test]
    fn test_missing_cell_is_discarded() {
        let rows: Vec<RawTierRow> =
            serde_json::from_value(json!([{ "minimum_cost_ratio": 0.3 }])).unwrap();
        let cleaned = clean_rows(&rows);
        assert_eq!(cleaned.discarded.len(), 1);
        assert_eq!(cleaned.discarded[0].reason, "empty cell");
    }

    #[test]
    fn test_evaluate_table_reports_match() {
        let input = TableLookupInput {
            rows: vec![
                RawTierRow::new(dec!(0), dec!(1)),
                RawTierRow::new(dec!(0.30), dec!(0.8)),
                row(json!("x"), json!(1)),
            ],
            query: dec!(0.31),
        };
        let out = evaluate_table(&input).unwrap();
        assert_eq!(out.result.value, dec!(0.8));
        assert_eq!(out.result.matched_threshold, Some(dec!(0.30)));
        assert_eq!(out.result.usable_rows, 2);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_evaluate_table_below_all_thresholds() {
        let input = TableLookupInput {
            rows: vec![RawTierRow::new(dec!(10), dec!(1))],
            query: dec!(5),
        };
        let out = evaluate_table(&input).unwrap();
        assert_eq!(out.result.value, Decimal::ZERO);
        assert_eq!(out.result.matched_threshold, None);
    }
}
