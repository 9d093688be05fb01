use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::bonus::PersonResult;
use crate::types::{Money, Rate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Digit-group separator for whole amounts (`.` in the VND convention)
    pub thousands_separator: char,
    /// Decimals shown for ratios and rates
    pub percent_decimals: u32,
    /// Decimals shown for factors, which are displayed as percentages too
    pub factor_decimals: u32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            thousands_separator: '.',
            percent_decimals: 2,
            factor_decimals: 0,
        }
    }
}

/// Whole-unit amount with grouped digits: `1234567.8` -> `1.234.568`.
pub fn format_thousands(amount: Money, separator: char) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Fraction as a percentage: `0.005` with 2 decimals -> `0.50%`.
pub fn format_percent(rate: Rate, decimals: u32) -> String {
    let pct = (rate * Decimal::ONE_HUNDRED).round_dp(decimals);
    format!("{:.*}%", decimals as usize, pct)
}

/// A result formatted for people rather than machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub name: String,
    pub line_a_revenue: String,
    pub line_a_cost: String,
    pub line_a_cost_ratio: String,
    pub line_b_revenue: String,
    pub line_b_cost: String,
    pub line_b_cost_ratio: String,
    pub combined_revenue: String,
    pub combined_rate: String,
    pub line_a_factor: String,
    pub line_b_factor: String,
    pub line_a_sales_bonus: String,
    pub line_b_sales_bonus: String,
    pub line_a_optimization_bonus: String,
    pub line_b_optimization_bonus: String,
    pub total_bonus: String,
}

pub fn display_row(r: &PersonResult, options: &DisplayOptions) -> DisplayRow {
    let money = |v: Money| format_thousands(v, options.thousands_separator);
    let pct = |v: Rate| format_percent(v, options.percent_decimals);
    let factor = |v: Rate| format_percent(v, options.factor_decimals);

    DisplayRow {
        name: r.name.clone(),
        line_a_revenue: money(r.line_a.revenue),
        line_a_cost: money(r.line_a.cost),
        line_a_cost_ratio: pct(r.line_a.cost_ratio),
        line_b_revenue: money(r.line_b.revenue),
        line_b_cost: money(r.line_b.cost),
        line_b_cost_ratio: pct(r.line_b.cost_ratio),
        combined_revenue: money(r.combined_revenue),
        combined_rate: pct(r.combined_rate),
        line_a_factor: factor(r.line_a.factor),
        line_b_factor: factor(r.line_b.factor),
        line_a_sales_bonus: money(r.line_a.sales_bonus),
        line_b_sales_bonus: money(r.line_b.sales_bonus),
        line_a_optimization_bonus: money(r.line_a.optimization_bonus),
        line_b_optimization_bonus: money(r.line_b.optimization_bonus),
        total_bonus: money(r.total_bonus),
    }
}

pub fn display_rows(results: &[PersonResult], options: &DisplayOptions) -> Vec<DisplayRow> {
    results.iter().map(|r| display_row(r, options)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(dec!(0), '.'), "0");
        assert_eq!(format_thousands(dec!(999), '.'), "999");
        assert_eq!(format_thousands(dec!(1000), '.'), "1.000");
        assert_eq!(format_thousands(dec!(150000000), '.'), "150.000.000");
        assert_eq!(format_thousands(dec!(1234567.5), ','), "1,234,568");
        assert_eq!(format_thousands(dec!(-2500), ','), "-2,500");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(0.005), 2), "0.50%");
        assert_eq!(format_percent(dec!(0.8), 0), "80%");
        assert_eq!(format_percent(dec!(0.3), 2), "30.00%");
    }

    #[test]
    fn test_partial_options_fill_defaults() {
        let options: DisplayOptions =
            serde_json::from_str(r#"{ "thousands_separator": "," }"#).unwrap();
        assert_eq!(options.thousands_separator, ',');
        assert_eq!(options.percent_decimals, 2);
        assert_eq!(options.factor_decimals, 0);
    }
}
