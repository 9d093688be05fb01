use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::fs;

use tiered_bonus_core::bonus::batch::{self, BonusBatchInput};
use tiered_bonus_core::bonus::{BonusPolicy, RoundingRule};
use tiered_bonus_core::currency::ConversionMode;
use tiered_bonus_core::export::{display_rows, write_csv, DisplayOptions};
use tiered_bonus_core::CurrencyUnit;

use crate::config;
use crate::input;
use crate::OutputFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Base,
    Foreign,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    RevenueOnly,
    AllFields,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoundingArg {
    HalfUp,
    HalfEven,
}

/// Arguments for a bonus batch
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to JSON batch file ({"persons": [...], "policy": {...}})
    #[arg(long, conflicts_with = "persons")]
    pub input: Option<String>,

    /// Path to CSV roster (name,line_a_revenue,line_a_cost,line_b_revenue,line_b_cost)
    #[arg(long)]
    pub persons: Option<String>,

    /// Policy file (.toml, .yaml or .json); defaults apply to anything left out
    #[arg(long)]
    pub config: Option<String>,

    /// Eligibility threshold for the optimization bonus (e.g. 0.30)
    #[arg(long)]
    pub threshold: Option<Decimal>,

    /// Unit the person amounts are entered in
    #[arg(long, value_enum)]
    pub input_unit: Option<UnitArg>,

    /// Base-currency units per foreign unit
    #[arg(long)]
    pub conversion_rate: Option<Decimal>,

    /// Which fields a foreign-unit input converts
    #[arg(long, value_enum)]
    pub conversion_mode: Option<ModeArg>,

    /// Tie-breaking rule for the rounded total
    #[arg(long, value_enum)]
    pub rounding: Option<RoundingArg>,

    /// Also write the CSV export to this path
    #[arg(long)]
    pub export: Option<String>,

    /// Thousands separator for --output table
    #[arg(long, default_value = ".")]
    pub separator: char,
}

impl CalculateArgs {
    fn apply_overrides(&self, policy: &mut BonusPolicy) {
        if let Some(threshold) = self.threshold {
            policy.eligibility_threshold = threshold;
        }
        if let Some(unit) = self.input_unit {
            policy.currency.input_unit = match unit {
                UnitArg::Base => CurrencyUnit::Base,
                UnitArg::Foreign => CurrencyUnit::Foreign,
            };
        }
        if let Some(rate) = self.conversion_rate {
            policy.currency.conversion_rate = rate;
        }
        if let Some(mode) = self.conversion_mode {
            policy.currency.mode = match mode {
                ModeArg::RevenueOnly => ConversionMode::RevenueOnly,
                ModeArg::AllFields => ConversionMode::AllFields,
            };
        }
        if let Some(rule) = self.rounding {
            policy.rounding.rule = match rule {
                RoundingArg::HalfUp => RoundingRule::HalfUp,
                RoundingArg::HalfEven => RoundingRule::HalfEven,
            };
        }
    }

    fn load_batch(&self) -> Result<BonusBatchInput, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            let mut batch = BonusBatchInput::from_json(&input::file::read_text(path)?)
                .map_err(|e| format!("Failed to load '{}': {}", path, e))?;
            if let Some(ref cfg) = self.config {
                batch.policy = config::load_policy(cfg)?;
            }
            return Ok(batch);
        }

        let policy = match self.config {
            Some(ref cfg) => config::load_policy(cfg)?,
            None => BonusPolicy::default(),
        };

        if let Some(ref path) = self.persons {
            return Ok(BonusBatchInput {
                persons: input::roster::read_roster(path)?,
                policy,
            });
        }

        match input::stdin::read_stdin()? {
            Some(data) => {
                let mut batch = BonusBatchInput::from_value(data)?;
                if self.config.is_some() {
                    batch.policy = policy;
                }
                Ok(batch)
            }
            None => Err("--input <batch.json>, --persons <roster.csv> or stdin required".into()),
        }
    }
}

/// Returns `None` when the CSV export was printed directly.
pub fn run_calculate(
    args: CalculateArgs,
    format: &OutputFormat,
) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let mut batch_input = args.load_batch()?;
    args.apply_overrides(&mut batch_input.policy);

    let output = batch::calculate_bonuses(&batch_input)?;

    // Stdout CSV and the --export file come from the same text
    if args.export.is_some() || matches!(format, OutputFormat::Csv) {
        let text = write_csv(&output.result.results)?;
        if let Some(ref path) = args.export {
            fs::write(path, &text).map_err(|e| format!("Failed to write '{}': {}", path, e))?;
            tracing::info!(path = %path, rows = output.result.results.len(), "wrote export");
        }
        if let OutputFormat::Csv = format {
            print!("{}", text);
            return Ok(None);
        }
    }

    // JSON keeps the full structured result; table and minimal get the
    // views they can print.
    let value = match format {
        OutputFormat::Json | OutputFormat::Csv => serde_json::to_value(&output)?,
        OutputFormat::Table => {
            let options = DisplayOptions {
                thousands_separator: args.separator,
                ..DisplayOptions::default()
            };
            json!({
                "result": {
                    "rows": display_rows(&output.result.results, &options),
                    "records_in": output.result.summary.records_in,
                    "computed": output.result.summary.computed,
                    "skipped": output.result.summary.skipped,
                    "total_bonus": output.result.summary.total_bonus,
                },
                "methodology": output.methodology,
                "warnings": output.warnings,
            })
        }
        OutputFormat::Minimal => json!({ "result": output.result.summary }),
    };
    Ok(Some(value))
}
