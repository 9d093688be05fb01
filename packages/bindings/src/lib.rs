use napi::Result as NapiResult;
use napi_derive::napi;

use tiered_bonus_core::bonus::{BonusBatchInput, BonusPolicy, RawBonusBatchInput};
use tiered_bonus_core::tiers::table::TableLookupInput;
use tiered_bonus_core::tiers::RawTierRow;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Bonus batch
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_bonuses(input_json: String) -> NapiResult<String> {
    let input = BonusBatchInput::from_json(&input_json).map_err(to_napi_error)?;
    let output =
        tiered_bonus_core::bonus::calculate_bonuses(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Same batch as [`calculate_bonuses`], returned as the CSV export text.
#[napi]
pub fn export_csv(input_json: String) -> NapiResult<String> {
    let input = BonusBatchInput::from_json(&input_json).map_err(to_napi_error)?;
    let output =
        tiered_bonus_core::bonus::calculate_bonuses(&input).map_err(to_napi_error)?;
    tiered_bonus_core::export::write_csv(&output.result.results).map_err(to_napi_error)
}

#[derive(serde::Deserialize)]
struct DisplayBindingInput {
    #[serde(flatten)]
    input: RawBonusBatchInput,
    #[serde(default)]
    options: tiered_bonus_core::export::DisplayOptions,
}

/// Batch results formatted for display (grouped digits, percentage strings).
#[napi]
pub fn display_bonuses(input_json: String) -> NapiResult<String> {
    let binding_input: DisplayBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let input = BonusBatchInput::try_from(binding_input.input).map_err(to_napi_error)?;
    let output = tiered_bonus_core::bonus::calculate_bonuses(&input).map_err(to_napi_error)?;
    let rows =
        tiered_bonus_core::export::display_rows(&output.result.results, &binding_input.options);
    serde_json::to_string(&rows).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// `query` is a string so JS callers keep full decimal precision.
#[napi]
pub fn lookup_tier(rows_json: String, query: String) -> NapiResult<String> {
    let rows: Vec<RawTierRow> = serde_json::from_str(&rows_json).map_err(to_napi_error)?;
    let query: rust_decimal::Decimal = tiered_bonus_core::parse_decimal(&query)
        .ok_or_else(|| to_napi_error(format!("'{query}' is not a number")))?;
    let output = tiered_bonus_core::tiers::table::evaluate_table(&TableLookupInput { rows, query })
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn default_policy() -> NapiResult<String> {
    serde_json::to_string(&BonusPolicy::default()).map_err(to_napi_error)
}
