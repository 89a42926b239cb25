//! The fixed line item vocabulary.
//!
//! Each [`LineItem`] is a semantic tag with one or more source names, tried in
//! order. Names are matched exactly against the unified table; the
//! [`FallbackPolicy`] decides whether a present zero ends the search.

use crate::schema::FallbackPolicy;
use crate::table::UnifiedStatementTable;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LineItem {
    TotalAssets,
    Equity,
    CurrentAssets,
    Inventory,
    Cash,
    Receivables,
    FixedAssets,
    CurrentLiabilities,
    LongTermLiabilities,
    ShortTermDebt,
    LongTermDebt,
    Payables,
    PaidInCapital,
    TotalLiabilities,
    Revenue,
    GrossProfit,
    NetIncome,
    Ebit,
    CostOfGoodsSold,
    InterestExpense,
    Depreciation,
    BasicEps,
    RentCost,
}

impl LineItem {
    pub const ALL: [LineItem; 23] = [
        LineItem::TotalAssets,
        LineItem::Equity,
        LineItem::CurrentAssets,
        LineItem::Inventory,
        LineItem::Cash,
        LineItem::Receivables,
        LineItem::FixedAssets,
        LineItem::CurrentLiabilities,
        LineItem::LongTermLiabilities,
        LineItem::ShortTermDebt,
        LineItem::LongTermDebt,
        LineItem::Payables,
        LineItem::PaidInCapital,
        LineItem::TotalLiabilities,
        LineItem::Revenue,
        LineItem::GrossProfit,
        LineItem::NetIncome,
        LineItem::Ebit,
        LineItem::CostOfGoodsSold,
        LineItem::InterestExpense,
        LineItem::Depreciation,
        LineItem::BasicEps,
        LineItem::RentCost,
    ];

    /// Source names in lookup order.
    ///
    /// `Inventory` treats gross and net inventory as interchangeable, gross first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            LineItem::TotalAssets => &["TỔNG TÀI SẢN"],
            LineItem::Equity => &["VỐN CHỦ SỞ HỮU"],
            LineItem::CurrentAssets => &["TÀI SẢN NGẮN HẠN"],
            LineItem::Inventory => &["Hàng tồn kho", "Hàng tồn kho, ròng"],
            LineItem::Cash => &["Tiền và tương đương tiền"],
            LineItem::Receivables => &["Các khoản phải thu"],
            LineItem::FixedAssets => &["Tài sản cố định"],
            LineItem::CurrentLiabilities => &["Nợ ngắn hạn"],
            LineItem::LongTermLiabilities => &["Nợ dài hạn"],
            LineItem::ShortTermDebt => &["Vay ngắn hạn"],
            LineItem::LongTermDebt => &["Vay dài hạn"],
            LineItem::Payables => &["Phải trả người bán"],
            LineItem::PaidInCapital => &["Vốn góp"],
            LineItem::TotalLiabilities => &["NỢ PHẢI TRẢ"],
            LineItem::Revenue => &["Doanh số thuần", "Doanh số"],
            LineItem::GrossProfit => &["Lãi gộp"],
            LineItem::NetIncome => &["Lãi/(lỗ) thuần sau thuế"],
            LineItem::Ebit => &["EBIT"],
            LineItem::CostOfGoodsSold => &["Giá vốn hàng bán"],
            LineItem::InterestExpense => &["Trong đó: Chi phí lãi vay"],
            LineItem::Depreciation => &["Khấu hao"],
            LineItem::BasicEps => &["Lãi cơ bản trên cổ phiếu"],
            LineItem::RentCost => &["Chi phí thuê tài sản", "Chi phí hoạt động - thuê"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineItem::TotalAssets => "Total assets",
            LineItem::Equity => "Owners' equity",
            LineItem::CurrentAssets => "Current assets",
            LineItem::Inventory => "Inventory",
            LineItem::Cash => "Cash and cash equivalents",
            LineItem::Receivables => "Receivables",
            LineItem::FixedAssets => "Fixed assets",
            LineItem::CurrentLiabilities => "Current liabilities",
            LineItem::LongTermLiabilities => "Long-term liabilities",
            LineItem::ShortTermDebt => "Short-term borrowings",
            LineItem::LongTermDebt => "Long-term borrowings",
            LineItem::Payables => "Trade payables",
            LineItem::PaidInCapital => "Paid-in capital",
            LineItem::TotalLiabilities => "Total liabilities",
            LineItem::Revenue => "Net revenue",
            LineItem::GrossProfit => "Gross profit",
            LineItem::NetIncome => "Net profit after tax",
            LineItem::Ebit => "EBIT",
            LineItem::CostOfGoodsSold => "Cost of goods sold",
            LineItem::InterestExpense => "Interest expense",
            LineItem::Depreciation => "Depreciation",
            LineItem::BasicEps => "Basic EPS",
            LineItem::RentCost => "Rent and lease cost",
        }
    }
}

/// Resolves [`LineItem`]s against one unified table.
pub struct LineItemResolver<'a> {
    table: &'a UnifiedStatementTable,
    policy: FallbackPolicy,
}

impl<'a> LineItemResolver<'a> {
    pub fn new(table: &'a UnifiedStatementTable, policy: FallbackPolicy) -> Self {
        Self { table, policy }
    }

    /// Walks the alias chain for `item` in `year`.
    ///
    /// Under `Truthy`, the last alias is returned as found (absent or zero) once
    /// every earlier alias was absent or zero.
    pub fn resolve(&self, item: LineItem, year: &str) -> Option<f64> {
        self.resolve_with_alias(item, year).map(|(_, value)| value)
    }

    /// Resolves `item` and takes its magnitude. Costs are often reported negative.
    pub fn resolve_abs(&self, item: LineItem, year: &str) -> Option<f64> {
        self.resolve(item, year).map(f64::abs)
    }

    /// Which source name supplied the value, for audit display.
    pub fn matched_alias(&self, item: LineItem, year: &str) -> Option<&'static str> {
        self.resolve_with_alias(item, year).map(|(name, _)| name)
    }

    fn resolve_with_alias(&self, item: LineItem, year: &str) -> Option<(&'static str, f64)> {
        let aliases = item.aliases();
        let last = aliases.len() - 1;

        for (idx, name) in aliases.iter().copied().enumerate() {
            let value = self.table.lookup(name, year);
            match self.policy {
                FallbackPolicy::PresentOnly => {
                    if let Some(v) = value {
                        return Some((name, v));
                    }
                }
                FallbackPolicy::Truthy => {
                    if idx == last {
                        return value.map(|v| (name, v));
                    }
                    match value {
                        Some(v) if v != 0.0 => return Some((name, v)),
                        Some(_) => debug!(
                            "'{}' is zero in {}; falling back to '{}'",
                            name,
                            year,
                            aliases[idx + 1]
                        ),
                        None => {}
                    }
                }
            }
        }

        None
    }
}
