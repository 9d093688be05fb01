use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use tiered_bonus_core::bonus::BonusPolicy;
use tiered_bonus_core::tiers::table::{self, TableLookupInput};
use tiered_bonus_core::tiers::RawTierRow;

use crate::config;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TableArg {
    /// Combined-revenue rate table
    Rate,
    /// Cost-ratio factor table
    CostFactor,
}

/// Arguments for a single table lookup
#[derive(Args)]
pub struct LookupArgs {
    /// Which policy table to evaluate
    #[arg(long, value_enum, default_value = "rate")]
    pub table: TableArg,

    /// Value to look up (combined revenue, or a cost ratio such as 0.31)
    #[arg(long)]
    pub query: Decimal,

    /// Policy file to take the table from (defaults otherwise)
    #[arg(long)]
    pub config: Option<String>,

    /// JSON file holding just the rows ([{"threshold": .., "value": ..}, ...])
    #[arg(long, conflicts_with = "config")]
    pub rows: Option<String>,
}

pub fn run_lookup(args: LookupArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rows: Vec<RawTierRow> = if let Some(ref path) = args.rows {
        input::file::read_json(path)?
    } else {
        let policy = match args.config {
            Some(ref path) => config::load_policy(path)?,
            None => BonusPolicy::default(),
        };
        match args.table {
            TableArg::Rate => policy.rate_table,
            TableArg::CostFactor => policy.cost_factor_table,
        }
    };

    let result = table::evaluate_table(&TableLookupInput {
        rows,
        query: args.query,
    })?;
    Ok(serde_json::to_value(result)?)
}
