//! End-to-end analysis from a DataFrame to exported reports.

use accrete::data::{DataError, FieldBinding};
use accrete::engine::{GrowthConfig, RevenueMovement, UserMovement};
use accrete::output::{ExportFormat, Exporter, GrowthAccountingExport, GrowthSummary, to_export};
use accrete::{Analysis, AnalysisError};
use approx::assert_relative_eq;
use polars::prelude::*;

fn orders() -> DataFrame {
    df!(
        "customer" => ["ann", "bob", "ann", "cat", "bob", "ann", "dan"],
        "ordered_on" => [
            "2024-01-04", "2024-01-20", "2024-02-02", "2024-02-14",
            "2024-03-09", "2024-03-10", "2024-03-11",
        ],
        "total" => [40.0, 25.0, 30.0, 15.0, 10.0, 50.0, -20.0],
    )
    .unwrap()
}

fn binding() -> FieldBinding {
    FieldBinding::default()
        .with_user_id("customer")
        .with_activity_date("ordered_on")
        .with_amount("total")
}

#[test]
fn test_monthly_growth_from_frame() {
    let analysis = Analysis::from_frame(&orders(), &binding()).unwrap();
    let rows = analysis.growth_accounting(&GrowthConfig::default()).unwrap();
    assert_eq!(rows.len(), 3);

    let feb = &rows[1];
    assert_eq!(feb.active_users, 2);
    assert_eq!(feb.users.get(UserMovement::New), Some(1.0));
    assert_eq!(feb.users.get(UserMovement::Churned), Some(-1.0));
    assert_relative_eq!(feb.revenue_movements.value_or_zero(RevenueMovement::Contraction), -10.0);
    assert_relative_eq!(feb.ratios.user_quick_ratio, 1.0);
    assert_relative_eq!(feb.ratios.revenue_retention, 30.0 / 65.0);

    let mar = &rows[2];
    assert_eq!(mar.users.get(UserMovement::Resurrected), Some(1.0));
    assert_eq!(mar.users.get(UserMovement::Retained), Some(1.0));
    assert_relative_eq!(mar.revenue_movements.value_or_zero(RevenueMovement::Expansion), 20.0);

    let export: Vec<GrowthAccountingExport> = to_export(&rows);
    let csv = export.export_to_string(ExportFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains("2024-03-01,month,2,"));

    let table = GrowthSummary::new("orders", &rows).to_ascii_table();
    assert!(table.contains("2024-02-01"));
}

#[test]
fn test_schema_error_surfaces() {
    let err = Analysis::from_frame(&orders(), &FieldBinding::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::Data(DataError::Schema { .. })));
}
