use crate::line_items::{LineItem, LineItemResolver};
use crate::schema::FallbackPolicy;
use crate::table::UnifiedStatementTable;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const OTHER_ASSETS_LABEL: &str = "Other assets";

/// One positive component of a breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct CompositionSlice {
    pub label: String,
    pub value: f64,
    /// Fraction of the breakdown total, in `(0, 1]`.
    pub share: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum BreakdownKind {
    Assets,
    FundingSources,
}

impl BreakdownKind {
    pub fn title(&self) -> &'static str {
        match self {
            BreakdownKind::Assets => "Asset Composition",
            BreakdownKind::FundingSources => "Funding Sources",
        }
    }
}

/// Vertical analysis of one side of the balance sheet for a single year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Breakdown {
    pub kind: BreakdownKind,
    pub year: String,
    pub slices: Vec<CompositionSlice>,
}

impl Breakdown {
    fn from_items(kind: BreakdownKind, year: &str, items: Vec<(String, Option<f64>)>) -> Self {
        let positive: Vec<(String, f64)> = items
            .into_iter()
            .filter_map(|(label, value)| value.filter(|v| *v > 0.0).map(|v| (label, v)))
            .collect();
        let total: f64 = positive.iter().map(|(_, v)| v).sum();

        let slices = positive
            .into_iter()
            .map(|(label, value)| CompositionSlice {
                label,
                value,
                share: value / total,
            })
            .collect();

        Self {
            kind,
            year: year.to_string(),
            slices,
        }
    }

    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn slice(&self, label: &str) -> Option<&CompositionSlice> {
        self.slices.iter().find(|s| s.label == label)
    }
}

/// Asset and funding breakdowns for one year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct CompositionAnalysis {
    pub year: String,
    pub assets: Breakdown,
    pub funding_sources: Breakdown,
}

pub struct CompositionAnalyzer<'a> {
    resolver: LineItemResolver<'a>,
    table: &'a UnifiedStatementTable,
}

impl<'a> CompositionAnalyzer<'a> {
    pub fn new(table: &'a UnifiedStatementTable, policy: FallbackPolicy) -> Self {
        Self {
            resolver: LineItemResolver::new(table, policy),
            table,
        }
    }

    /// Last fiscal year of the table.
    pub fn default_year(&self) -> Option<String> {
        self.table.fiscal_years().pop()
    }

    /// Known asset lines plus an "Other assets" remainder when total assets exceed them.
    pub fn assets(&self, year: &str) -> Breakdown {
        let mut items: Vec<(String, Option<f64>)> = [
            LineItem::Cash,
            LineItem::Receivables,
            LineItem::Inventory,
            LineItem::FixedAssets,
        ]
        .into_iter()
        .map(|item| (item.label().to_string(), self.resolver.resolve(item, year)))
        .collect();

        let known_sum: f64 = items
            .iter()
            .filter_map(|(_, v)| *v)
            .filter(|v| *v > 0.0)
            .sum();

        if let Some(total) = self.resolver.resolve(LineItem::TotalAssets, year) {
            if total > known_sum {
                items.push((OTHER_ASSETS_LABEL.to_string(), Some(total - known_sum)));
            }
        }

        Breakdown::from_items(BreakdownKind::Assets, year, items)
    }

    pub fn funding_sources(&self, year: &str) -> Breakdown {
        let items = [
            LineItem::CurrentLiabilities,
            LineItem::LongTermLiabilities,
            LineItem::Equity,
        ]
        .into_iter()
        .map(|item| (item.label().to_string(), self.resolver.resolve(item, year)))
        .collect();

        Breakdown::from_items(BreakdownKind::FundingSources, year, items)
    }

    pub fn analyze(&self, year: &str) -> CompositionAnalysis {
        CompositionAnalysis {
            year: year.to_string(),
            assets: self.assets(year),
            funding_sources: self.funding_sources(year),
        }
    }

    /// Analysis for the default year, `None` when the table has no fiscal year.
    pub fn analyze_latest(&self) -> Option<CompositionAnalysis> {
        self.default_year().map(|year| self.analyze(&year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CellValue, StatementSheet};
    use crate::table::LineItemRow;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn balance_sheet(years: &[&str], items: &[(&str, &[f64])]) -> UnifiedStatementTable {
        let rows = items
            .iter()
            .map(|(name, values)| LineItemRow {
                sheet: StatementSheet::BalanceSheet,
                name: name.to_string(),
                values: years
                    .iter()
                    .zip(values.iter())
                    .map(|(y, v)| (y.to_string(), CellValue::Number(*v)))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect();
        UnifiedStatementTable::new(years.iter().map(|y| y.to_string()).collect(), rows)
    }

    #[test]
    fn test_other_assets_is_the_remainder() {
        let table = balance_sheet(
            &["2023"],
            &[
                ("TỔNG TÀI SẢN", &[1000.0]),
                ("Tiền và tương đương tiền", &[100.0]),
                ("Các khoản phải thu", &[200.0]),
                ("Hàng tồn kho", &[150.0]),
                ("Tài sản cố định", &[300.0]),
            ],
        );
        let analyzer = CompositionAnalyzer::new(&table, FallbackPolicy::Truthy);
        let assets = analyzer.assets("2023");

        assert_eq!(assets.slices.len(), 5);
        assert_eq!(assets.slice(OTHER_ASSETS_LABEL).unwrap().value, 250.0);
        assert_relative_eq!(assets.total(), 1000.0);
        assert_relative_eq!(assets.slice("Cash and cash equivalents").unwrap().share, 0.1);
    }

    #[test]
    fn test_non_positive_items_are_dropped() {
        let table = balance_sheet(
            &["2023"],
            &[
                ("TỔNG TÀI SẢN", &[500.0]),
                ("Tiền và tương đương tiền", &[-10.0]),
                ("Các khoản phải thu", &[0.0]),
                ("Tài sản cố định", &[500.0]),
            ],
        );
        let assets = CompositionAnalyzer::new(&table, FallbackPolicy::Truthy).assets("2023");

        assert_eq!(assets.slices.len(), 1);
        assert!(assets.slice(OTHER_ASSETS_LABEL).is_none());
        assert_relative_eq!(assets.slices[0].share, 1.0);
    }

    #[test]
    fn test_inventory_uses_net_alias_when_gross_is_zero() {
        let table = balance_sheet(
            &["2023"],
            &[("Hàng tồn kho", &[0.0]), ("Hàng tồn kho, ròng", &[80.0])],
        );
        let assets = CompositionAnalyzer::new(&table, FallbackPolicy::Truthy).assets("2023");
        assert_eq!(assets.slice("Inventory").unwrap().value, 80.0);
    }

    #[test]
    fn test_funding_sources() {
        let table = balance_sheet(
            &["2022", "2023"],
            &[
                ("Nợ ngắn hạn", &[100.0, 300.0]),
                ("Nợ dài hạn", &[50.0, 0.0]),
                ("VỐN CHỦ SỞ HỮU", &[350.0, 700.0]),
            ],
        );
        let analyzer = CompositionAnalyzer::new(&table, FallbackPolicy::Truthy);
        assert_eq!(analyzer.default_year().as_deref(), Some("2023"));

        let analysis = analyzer.analyze_latest().unwrap();
        let funding = &analysis.funding_sources;
        assert_eq!(analysis.year, "2023");
        assert_eq!(funding.slices.len(), 2);
        assert_relative_eq!(funding.slice("Owners' equity").unwrap().share, 0.7);
        assert!(analysis.assets.is_empty());
    }

    #[test]
    fn test_no_fiscal_year() {
        let table = balance_sheet(&["TTM"], &[("TỔNG TÀI SẢN", &[1.0])]);
        let analyzer = CompositionAnalyzer::new(&table, FallbackPolicy::Truthy);
        assert!(analyzer.analyze_latest().is_none());
    }
}
