use clap::Args;
use serde_json::Value;

use tiered_bonus_core::bonus::BonusPolicy;

use crate::config;

/// Arguments for printing the default policy
#[derive(Args)]
pub struct DefaultsArgs {
    /// Print a TOML template instead of structured output
    #[arg(long)]
    pub toml: bool,
}

/// Returns `None` when the TOML template was printed directly.
pub fn run_defaults(args: DefaultsArgs) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let policy = BonusPolicy::default();
    if args.toml {
        print!("{}", config::policy_to_toml(&policy)?);
        return Ok(None);
    }
    Ok(Some(serde_json::json!({ "result": policy })))
}
