use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tiered_bonus_core::bonus::{calculate_bonuses, BonusBatchInput, BonusPolicy, PersonInput};
use tiered_bonus_core::export::display::format_thousands;
use tiered_bonus_core::export::{
    display_rows, read_csv, read_persons_csv, write_csv, DisplayOptions, ExportRow, EXPORT_COLUMNS,
};

fn sample_results() -> Vec<tiered_bonus_core::bonus::PersonResult> {
    let input = BonusBatchInput {
        persons: vec![
            PersonInput {
                name: "Nguyen, Van A".into(),
                line_a_revenue: dec!(200000000),
                line_a_cost: dec!(50000000),
                ..PersonInput::default()
            },
            PersonInput::default(),
            PersonInput {
                name: "Tran B".into(),
                line_a_revenue: dec!(400000000),
                line_a_cost: dec!(100000000),
                line_b_revenue: dec!(250000000),
                line_b_cost: dec!(80000000),
            },
        ],
        policy: BonusPolicy::default(),
    };
    calculate_bonuses(&input).unwrap().result.results
}

#[test]
fn test_header_row_and_column_order() {
    let text = write_csv(&sample_results()).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, EXPORT_COLUMNS.join(","));
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn test_round_trip_reproduces_values() {
    let results = sample_results();
    let text = write_csv(&results).unwrap();
    let parsed = read_csv(&text).unwrap();

    let expected: Vec<ExportRow> = results.iter().map(ExportRow::from).collect();
    assert_eq!(parsed, expected);

    for (row, result) in parsed.iter().zip(&results) {
        assert_eq!(row.total_bonus, result.total_bonus);
        assert_eq!(row.combined_revenue, result.combined_revenue);
        assert_eq!(row.line_a_sales_bonus, result.line_a.sales_bonus);
        assert_eq!(row.line_b_optimization_bonus, result.line_b.optimization_bonus);
        assert_eq!(row.line_a_cost_ratio(), Some(result.line_a.cost_ratio));
        assert_eq!(row.combined_rate(), Some(result.combined_rate));
    }
}

#[test]
fn test_reference_person_export_values() {
    let results = sample_results();
    let row = ExportRow::from(&results[0]);
    assert_eq!(row.name, "Nguyen, Van A");
    assert_eq!(row.line_a_cost_ratio_pct, "25.00%");
    assert_eq!(row.line_b_cost_ratio_pct, "0.00%");
    assert_eq!(row.combined_rate_pct, "0.50%");
    assert_eq!(row.total_bonus, dec!(3500000));
}

#[test]
fn test_roster_import_feeds_batch() {
    let roster = "name,line_a_revenue,line_a_cost,line_b_revenue,line_b_cost\n\
                  Hoang,200000000,50000000,0,0\n\
                  ,0,0,0,0\n";
    let persons = read_persons_csv(roster).unwrap();
    let out = calculate_bonuses(&BonusBatchInput {
        persons,
        policy: BonusPolicy::default(),
    })
    .unwrap();
    assert_eq!(out.result.results.len(), 1);
    assert_eq!(out.result.results[0].total_bonus, dec!(3500000));
}

#[test]
fn test_display_view_localizes_numbers() {
    let rows = display_rows(&sample_results(), &DisplayOptions::default());
    assert_eq!(rows[0].line_a_revenue, "200.000.000");
    assert_eq!(rows[0].line_a_cost_ratio, "25.00%");
    assert_eq!(rows[0].combined_rate, "0.50%");
    assert_eq!(rows[0].line_a_factor, "100%");
    assert_eq!(rows[0].total_bonus, "3.500.000");
    assert_eq!(format_thousands(dec!(1234), ','), "1,234");
}

#[test]
fn test_percent_columns_are_rounded_amounts_stay_exact() {
    // Cost ratio 1/3 cannot be written with two percent decimals
    let input = BonusBatchInput {
        persons: vec![PersonInput {
            name: "Vu".into(),
            line_a_revenue: dec!(300000000),
            line_a_cost: dec!(100000000),
            ..PersonInput::default()
        }],
        policy: BonusPolicy::default(),
    };
    let results = calculate_bonuses(&input).unwrap().result.results;
    let parsed = read_csv(&write_csv(&results).unwrap()).unwrap();
    let (row, result) = (&parsed[0], &results[0]);

    assert_eq!(row.line_a_cost_ratio_pct, "33.33%");
    assert_eq!(row.line_a_cost_ratio(), Some(dec!(0.3333)));
    assert!(row.line_a_cost_ratio() != Some(result.line_a.cost_ratio));

    // The exact ratio comes back from the amount columns
    assert_eq!(row.line_a_cost / row.line_a_revenue, result.line_a.cost_ratio);
    assert_eq!(row.line_a_factor, dec!(0.5));
    assert_eq!(row.total_bonus, dec!(1500000));
    assert_eq!(row.total_bonus, result.total_bonus);
}
