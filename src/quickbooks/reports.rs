//! Extracts summary totals from QBO report JSON.
//!
//! QBO reports nest sections under `Rows.Row[]`; each section carries a
//! `group` name and a `Summary.ColData[]` whose last cell is the total as a
//! string. Balance sheet groups such as `Liabilities` sit one level down, so
//! lookups walk the whole tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitAndLossSummary {
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetSummary {
    pub total_assets: f64,
    pub total_liabilities: f64,
    /// `None` when the report carries no `Equity` section.
    pub total_equity: Option<f64>,
}

pub fn parse_profit_and_loss(report: &Value) -> ProfitAndLossSummary {
    let revenue = group_total(report, "Income").unwrap_or(0.0);
    let expenses = group_total(report, "Expenses").unwrap_or(0.0);
    let net_income = group_total(report, "NetIncome").unwrap_or(revenue - expenses);
    ProfitAndLossSummary {
        revenue,
        expenses,
        net_income,
    }
}

pub fn parse_balance_sheet(report: &Value) -> BalanceSheetSummary {
    BalanceSheetSummary {
        total_assets: group_total(report, "TotalAssets").unwrap_or(0.0),
        total_liabilities: group_total(report, "Liabilities").unwrap_or(0.0),
        total_equity: group_total(report, "Equity"),
    }
}

/// Total of the first section named `group`, depth first.
pub fn group_total(report: &Value, group: &str) -> Option<f64> {
    rows(report).iter().find_map(|row| find_in_row(row, group))
}

fn rows(node: &Value) -> &[Value] {
    node.get("Rows")
        .and_then(|r| r.get("Row"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn find_in_row(row: &Value, group: &str) -> Option<f64> {
    if row.get("group").and_then(Value::as_str) == Some(group) {
        if let Some(total) = summary_amount(row) {
            return Some(total);
        }
    }
    rows(row).iter().find_map(|child| find_in_row(child, group))
}

fn summary_amount(row: &Value) -> Option<f64> {
    let cells = row
        .get("Summary")
        .and_then(|s| s.get("ColData"))
        .and_then(Value::as_array)?;
    cells.iter().rev().find_map(|cell| parse_amount(cell.get("value")?))
}

fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '$').collect();
            cleaned.trim().parse::<f64>().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(group: &str, label: &str, amount: &str) -> Value {
        json!({
            "type": "Section",
            "group": group,
            "Summary": { "ColData": [{ "value": label }, { "value": amount }] }
        })
    }

    #[test]
    fn test_profit_and_loss_groups() {
        let report = json!({
            "Header": { "ReportName": "ProfitAndLoss" },
            "Rows": { "Row": [
                section("Income", "Total Income", "250000.00"),
                section("COGS", "Total Cost of Goods Sold", "40000.00"),
                section("Expenses", "Total Expenses", "180000.50"),
                section("NetIncome", "Net Income", "30000.00"),
            ]}
        });

        let pnl = parse_profit_and_loss(&report);
        assert_eq!(pnl.revenue, 250_000.0);
        assert_eq!(pnl.expenses, 180_000.5);
        assert_eq!(pnl.net_income, 30_000.0);
    }

    #[test]
    fn test_missing_groups_are_zero() {
        let pnl = parse_profit_and_loss(&json!({ "Rows": { "Row": [] } }));
        assert_eq!(pnl, ProfitAndLossSummary::default());

        let bs = parse_balance_sheet(&json!({}));
        assert_eq!(bs.total_assets, 0.0);
        assert_eq!(bs.total_equity, None);
    }

    #[test]
    fn test_balance_sheet_nested_groups() {
        let mut liabilities_and_equity = section(
            "TotalLiabilitiesAndEquity",
            "Total Liabilities and Equity",
            "500000",
        );
        liabilities_and_equity["Rows"] = json!({ "Row": [
            section("Liabilities", "Total Liabilities", "200,000.00"),
            section("Equity", "Total Equity", "300000.00"),
        ]});

        let report = json!({ "Rows": { "Row": [
            section("TotalAssets", "TOTAL ASSETS", "500000.00"),
            liabilities_and_equity,
        ]}});

        let bs = parse_balance_sheet(&report);
        assert_eq!(bs.total_assets, 500_000.0);
        assert_eq!(bs.total_liabilities, 200_000.0);
        assert_eq!(bs.total_equity, Some(300_000.0));
    }

    #[test]
    fn test_negative_and_blank_amounts() {
        let report = json!({ "Rows": { "Row": [
            section("NetIncome", "Net Income", "-1520.75"),
            section("Income", "Total Income", ""),
        ]}});
        let pnl = parse_profit_and_loss(&report);
        assert_eq!(pnl.net_income, -1520.75);
        assert_eq!(pnl.revenue, 0.0);
    }
}
