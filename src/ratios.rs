//! Per-year financial ratios.
//!
//! Every ratio is computed independently from period-end figures of a single
//! year. A missing input only affects the ratios that depend on it.

use crate::line_items::{LineItem, LineItemResolver};
use crate::schema::AnalysisConfig;
use crate::table::UnifiedStatementTable;
use crate::utils::{safe_divide, RatioValue};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RatioGroup {
    Valuation,
    Profitability,
    Liquidity,
    CapitalStructure,
}

impl RatioGroup {
    pub const ALL: [RatioGroup; 4] = [
        RatioGroup::Valuation,
        RatioGroup::Profitability,
        RatioGroup::Liquidity,
        RatioGroup::CapitalStructure,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RatioGroup::Valuation => "A. Valuation",
            RatioGroup::Profitability => "B. Profitability & Efficiency",
            RatioGroup::Liquidity => "C. Liquidity & Cash Cycle",
            RatioGroup::CapitalStructure => "D. Capital Structure",
        }
    }

    pub fn ratios(&self) -> impl Iterator<Item = RatioId> + '_ {
        RatioId::ALL.into_iter().filter(move |id| id.group() == *self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RatioId {
    Eps,
    Bvps,
    Ebitda,
    Ebitdar,
    Revenue,
    GrossMargin,
    EbitMargin,
    NetMargin,
    Roe,
    Roa,
    Roic,
    AssetTurnover,
    FixedAssetTurnover,
    CurrentRatio,
    QuickRatio,
    CashRatio,
    Dso,
    Dio,
    Dpo,
    CashConversionCycle,
    DebtToEquity,
    InterestCoverage,
    FinancialLeverage,
}

impl RatioId {
    /// Canonical display order.
    pub const ALL: [RatioId; 23] = [
        RatioId::Eps,
        RatioId::Bvps,
        RatioId::Ebitda,
        RatioId::Ebitdar,
        RatioId::Revenue,
        RatioId::GrossMargin,
        RatioId::EbitMargin,
        RatioId::NetMargin,
        RatioId::Roe,
        RatioId::Roa,
        RatioId::Roic,
        RatioId::AssetTurnover,
        RatioId::FixedAssetTurnover,
        RatioId::CurrentRatio,
        RatioId::QuickRatio,
        RatioId::CashRatio,
        RatioId::Dso,
        RatioId::Dio,
        RatioId::Dpo,
        RatioId::CashConversionCycle,
        RatioId::DebtToEquity,
        RatioId::InterestCoverage,
        RatioId::FinancialLeverage,
    ];

    pub fn group(&self) -> RatioGroup {
        match self {
            RatioId::Eps | RatioId::Bvps | RatioId::Ebitda | RatioId::Ebitdar => {
                RatioGroup::Valuation
            }
            RatioId::Revenue
            | RatioId::GrossMargin
            | RatioId::EbitMargin
            | RatioId::NetMargin
            | RatioId::Roe
            | RatioId::Roa
            | RatioId::Roic
            | RatioId::AssetTurnover
            | RatioId::FixedAssetTurnover => RatioGroup::Profitability,
            RatioId::CurrentRatio
            | RatioId::QuickRatio
            | RatioId::CashRatio
            | RatioId::Dso
            | RatioId::Dio
            | RatioId::Dpo
            | RatioId::CashConversionCycle => RatioGroup::Liquidity,
            RatioId::DebtToEquity | RatioId::InterestCoverage | RatioId::FinancialLeverage => {
                RatioGroup::CapitalStructure
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatioId::Eps => "EPS",
            RatioId::Bvps => "BVPS",
            RatioId::Ebitda => "EBITDA",
            RatioId::Ebitdar => "EBITDAR",
            RatioId::Revenue => "Revenue",
            RatioId::GrossMargin => "Gross Margin",
            RatioId::EbitMargin => "EBIT Margin",
            RatioId::NetMargin => "Net Margin",
            RatioId::Roe => "ROE",
            RatioId::Roa => "ROA",
            RatioId::Roic => "ROIC",
            RatioId::AssetTurnover => "Asset Turnover",
            RatioId::FixedAssetTurnover => "Fixed Asset Turnover",
            RatioId::CurrentRatio => "Current Ratio",
            RatioId::QuickRatio => "Quick Ratio",
            RatioId::CashRatio => "Cash Ratio",
            RatioId::Dso => "DSO",
            RatioId::Dio => "DIO",
            RatioId::Dpo => "DPO",
            RatioId::CashConversionCycle => "Cash Conversion Cycle",
            RatioId::DebtToEquity => "Debt/Equity",
            RatioId::InterestCoverage => "Interest Coverage",
            RatioId::FinancialLeverage => "Financial Leverage",
        }
    }

    /// How the ratio is computed, for the methodology reference.
    pub fn formula(&self) -> &'static str {
        match self {
            RatioId::Eps => "Basic earnings per share, taken directly from the income statement",
            RatioId::Bvps => "Owners' equity / (Paid-in capital / par value per share)",
            RatioId::Ebitda => "EBIT + |Depreciation| (EBIT alone when depreciation is not reported)",
            RatioId::Ebitdar => "EBITDA + |Rent and lease cost|",
            RatioId::Revenue => "Net revenue, taken directly from the income statement",
            RatioId::GrossMargin => "Gross profit / Revenue (decimal ratio)",
            RatioId::EbitMargin => "EBIT / Revenue (decimal ratio)",
            RatioId::NetMargin => "Net profit after tax / Revenue (decimal ratio)",
            RatioId::Roe => "Net profit after tax / Owners' equity (period end)",
            RatioId::Roa => "Net profit after tax / Total assets (period end)",
            RatioId::Roic => "EBIT x (1 - tax rate) / (Short-term + long-term borrowings + Owners' equity)",
            RatioId::AssetTurnover => "Revenue / Total assets (period end)",
            RatioId::FixedAssetTurnover => "Revenue / Fixed assets (period end)",
            RatioId::CurrentRatio => "Current assets / Current liabilities",
            RatioId::QuickRatio => "(Current assets - Inventory) / Current liabilities",
            RatioId::CashRatio => "Cash and cash equivalents / Current liabilities",
            RatioId::Dso => "Receivables / (Revenue / days in year)",
            RatioId::Dio => "Inventory / (COGS / days in year)",
            RatioId::Dpo => "Trade payables / (COGS / days in year)",
            RatioId::CashConversionCycle => "DIO + DSO - DPO",
            RatioId::DebtToEquity => "(Short-term + long-term borrowings) / Owners' equity",
            RatioId::InterestCoverage => "EBIT / Interest expense",
            RatioId::FinancialLeverage => "Total assets (period end) / Owners' equity (period end)",
        }
    }
}

/// Line item values for one year, as resolved through the vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BaseVariables {
    pub total_assets: Option<f64>,
    pub equity: Option<f64>,
    pub current_assets: Option<f64>,
    pub inventory: Option<f64>,
    pub cash: Option<f64>,
    pub receivables: Option<f64>,
    pub fixed_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub short_term_debt: Option<f64>,
    pub long_term_debt: Option<f64>,
    pub payables: Option<f64>,
    pub paid_in_capital: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub net_income: Option<f64>,
    pub ebit: Option<f64>,
    /// Magnitude, absent when zero; cost lines are usually reported negative.
    pub cogs: Option<f64>,
    /// Magnitude.
    pub interest_expense: Option<f64>,
    pub depreciation: Option<f64>,
    pub eps_basic: Option<f64>,
    pub rent_cost: Option<f64>,
}

impl BaseVariables {
    pub fn extract(resolver: &LineItemResolver<'_>, year: &str) -> Self {
        Self {
            total_assets: resolver.resolve(LineItem::TotalAssets, year),
            equity: resolver.resolve(LineItem::Equity, year),
            current_assets: resolver.resolve(LineItem::CurrentAssets, year),
            inventory: resolver.resolve(LineItem::Inventory, year),
            cash: resolver.resolve(LineItem::Cash, year),
            receivables: resolver.resolve(LineItem::Receivables, year),
            fixed_assets: resolver.resolve(LineItem::FixedAssets, year),
            current_liabilities: resolver.resolve(LineItem::CurrentLiabilities, year),
            short_term_debt: resolver.resolve(LineItem::ShortTermDebt, year),
            long_term_debt: resolver.resolve(LineItem::LongTermDebt, year),
            payables: resolver.resolve(LineItem::Payables, year),
            paid_in_capital: resolver.resolve(LineItem::PaidInCapital, year),
            total_liabilities: resolver.resolve(LineItem::TotalLiabilities, year),
            revenue: resolver.resolve(LineItem::Revenue, year),
            gross_profit: resolver.resolve(LineItem::GrossProfit, year),
            net_income: resolver.resolve(LineItem::NetIncome, year),
            ebit: resolver.resolve(LineItem::Ebit, year),
            cogs: resolver
                .resolve_abs(LineItem::CostOfGoodsSold, year)
                .filter(|cogs| *cogs != 0.0),
            interest_expense: resolver.resolve_abs(LineItem::InterestExpense, year),
            depreciation: resolver.resolve(LineItem::Depreciation, year),
            eps_basic: resolver.resolve(LineItem::BasicEps, year),
            rent_cost: resolver.resolve(LineItem::RentCost, year),
        }
    }

    /// Short-term plus long-term borrowings, absent parts counted as zero.
    pub fn total_debt(&self) -> f64 {
        self.short_term_debt.unwrap_or(0.0) + self.long_term_debt.unwrap_or(0.0)
    }

    /// EBIT plus depreciation magnitude; EBIT alone when depreciation is absent.
    pub fn ebitda(&self) -> Option<f64> {
        let ebit = self.ebit?;
        Some(match self.depreciation {
            Some(depreciation) => ebit + depreciation.abs(),
            None => ebit,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValuationRatios {
    pub eps: RatioValue,
    pub bvps: RatioValue,
    pub ebitda: RatioValue,
    pub ebitdar: RatioValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProfitabilityRatios {
    pub revenue: RatioValue,
    pub gross_margin: RatioValue,
    pub ebit_margin: RatioValue,
    pub net_margin: RatioValue,
    pub roe: RatioValue,
    pub roa: RatioValue,
    pub roic: RatioValue,
    pub asset_turnover: RatioValue,
    pub fixed_asset_turnover: RatioValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LiquidityRatios {
    pub current_ratio: RatioValue,
    pub quick_ratio: RatioValue,
    pub cash_ratio: RatioValue,
    pub dso: RatioValue,
    pub dio: RatioValue,
    pub dpo: RatioValue,
    pub cash_conversion_cycle: RatioValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CapitalStructureRatios {
    pub debt_to_equity: RatioValue,
    pub interest_coverage: RatioValue,
    pub financial_leverage: RatioValue,
}

/// All ratio groups for one fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearRatios {
    pub valuation: ValuationRatios,
    pub profitability: ProfitabilityRatios,
    pub liquidity: LiquidityRatios,
    pub capital_structure: CapitalStructureRatios,
}

impl YearRatios {
    pub fn get(&self, id: RatioId) -> RatioValue {
        match id {
            RatioId::Eps => self.valuation.eps,
            RatioId::Bvps => self.valuation.bvps,
            RatioId::Ebitda => self.valuation.ebitda,
            RatioId::Ebitdar => self.valuation.ebitdar,
            RatioId::Revenue => self.profitability.revenue,
            RatioId::GrossMargin => self.profitability.gross_margin,
            RatioId::EbitMargin => self.profitability.ebit_margin,
            RatioId::NetMargin => self.profitability.net_margin,
            RatioId::Roe => self.profitability.roe,
            RatioId::Roa => self.profitability.roa,
            RatioId::Roic => self.profitability.roic,
            RatioId::AssetTurnover => self.profitability.asset_turnover,
            RatioId::FixedAssetTurnover => self.profitability.fixed_asset_turnover,
            RatioId::CurrentRatio => self.liquidity.current_ratio,
            RatioId::QuickRatio => self.liquidity.quick_ratio,
            RatioId::CashRatio => self.liquidity.cash_ratio,
            RatioId::Dso => self.liquidity.dso,
            RatioId::Dio => self.liquidity.dio,
            RatioId::Dpo => self.liquidity.dpo,
            RatioId::CashConversionCycle => self.liquidity.cash_conversion_cycle,
            RatioId::DebtToEquity => self.capital_structure.debt_to_equity,
            RatioId::InterestCoverage => self.capital_structure.interest_coverage,
            RatioId::FinancialLeverage => self.capital_structure.financial_leverage,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RatioId, RatioValue)> + '_ {
        RatioId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

/// Ratios for every fiscal year of a table, keyed by year label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearlyRatioReport {
    pub years: BTreeMap<String, YearRatios>,
}

impl YearlyRatioReport {
    /// Year labels in chronological order.
    pub fn year_labels(&self) -> Vec<&str> {
        self.years.keys().map(String::as_str).collect()
    }

    pub fn latest_year(&self) -> Option<&str> {
        self.years.keys().next_back().map(String::as_str)
    }

    pub fn year(&self, year: &str) -> Option<&YearRatios> {
        self.years.get(year)
    }

    pub fn get(&self, year: &str, id: RatioId) -> Option<RatioValue> {
        self.years.get(year).map(|ratios| ratios.get(id))
    }

    /// Chronological values of one ratio; `None` marks a gap.
    pub fn series(&self, id: RatioId) -> Vec<(String, Option<f64>)> {
        self.years
            .iter()
            .map(|(year, ratios)| (year.clone(), ratios.get(id).value()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }
}

pub struct RatioEngine {
    config: AnalysisConfig,
}

impl RatioEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn compute(&self, table: &UnifiedStatementTable) -> YearlyRatioReport {
        let resolver = LineItemResolver::new(table, self.config.fallback_policy);
        let fiscal_years = table.fiscal_years();

        info!("Computing ratios for {} fiscal years", fiscal_years.len());

        let years = fiscal_years
            .into_iter()
            .map(|year| {
                let base = BaseVariables::extract(&resolver, &year);
                debug!("Base variables for {}: {:?}", year, base);
                let ratios = self.compute_year(&base);
                (year, ratios)
            })
            .collect();

        YearlyRatioReport { years }
    }

    pub fn compute_year(&self, base: &BaseVariables) -> YearRatios {
        YearRatios {
            valuation: self.valuation(base),
            profitability: self.profitability(base),
            liquidity: self.liquidity(base),
            capital_structure: self.capital_structure(base),
        }
    }

    fn valuation(&self, base: &BaseVariables) -> ValuationRatios {
        let shares_outstanding = safe_divide(base.paid_in_capital, Some(self.config.share_par_value));
        let bvps = match shares_outstanding {
            RatioValue::Value(shares) => safe_divide(base.equity, Some(shares)),
            _ => RatioValue::NotApplicable,
        };

        let ebitda = base.ebitda();
        let ebitdar = match (ebitda, base.rent_cost) {
            (Some(ebitda), Some(rent)) => RatioValue::from_lookup(Some(ebitda + rent.abs())),
            _ => RatioValue::NotApplicable,
        };

        ValuationRatios {
            eps: RatioValue::from_lookup(base.eps_basic),
            bvps,
            ebitda: RatioValue::from_lookup(ebitda),
            ebitdar,
        }
    }

    fn profitability(&self, base: &BaseVariables) -> ProfitabilityRatios {
        let roic = match (base.ebit, base.equity) {
            (Some(ebit), Some(equity)) => safe_divide(
                Some(ebit * (1.0 - self.config.corporate_tax_rate)),
                Some(base.total_debt() + equity),
            ),
            _ => RatioValue::NotApplicable,
        };

        ProfitabilityRatios {
            revenue: RatioValue::from_lookup(base.revenue),
            gross_margin: safe_divide(base.gross_profit, base.revenue),
            ebit_margin: safe_divide(base.ebit, base.revenue),
            net_margin: safe_divide(base.net_income, base.revenue),
            roe: safe_divide(base.net_income, base.equity),
            roa: safe_divide(base.net_income, base.total_assets),
            roic,
            asset_turnover: safe_divide(base.revenue, base.total_assets),
            fixed_asset_turnover: safe_divide(base.revenue, base.fixed_assets),
        }
    }

    fn liquidity(&self, base: &BaseVariables) -> LiquidityRatios {
        let days = Some(self.config.days_in_year);

        let quick_ratio = match (base.current_assets, base.inventory) {
            (Some(current), Some(inventory)) if current != 0.0 && inventory != 0.0 => {
                safe_divide(Some(current - inventory), base.current_liabilities)
            }
            _ => RatioValue::NotApplicable,
        };

        let daily_revenue = safe_divide(base.revenue, days);
        let daily_cogs = safe_divide(base.cogs, days);
        let dso = safe_divide(base.receivables, daily_revenue.value());
        let dio = safe_divide(base.inventory, daily_cogs.value());
        let dpo = safe_divide(base.payables, daily_cogs.value());

        let cash_conversion_cycle = match (dio, dso, dpo) {
            (RatioValue::Value(dio), RatioValue::Value(dso), RatioValue::Value(dpo)) => {
                RatioValue::Value(dio + dso - dpo)
            }
            _ => RatioValue::NotApplicable,
        };

        LiquidityRatios {
            current_ratio: safe_divide(base.current_assets, base.current_liabilities),
            quick_ratio,
            cash_ratio: safe_divide(base.cash, base.current_liabilities),
            dso,
            dio,
            dpo,
            cash_conversion_cycle,
        }
    }

    fn capital_structure(&self, base: &BaseVariables) -> CapitalStructureRatios {
        CapitalStructureRatios {
            debt_to_equity: safe_divide(Some(base.total_debt()), base.equity),
            interest_coverage: safe_divide(base.ebit, base.interest_expense),
            financial_leverage: safe_divide(base.total_assets, base.equity),
        }
    }
}

/// Computes the report with `config`.
pub fn compute_ratios(table: &UnifiedStatementTable, config: &AnalysisConfig) -> YearlyRatioReport {
    RatioEngine::new(config.clone()).compute(table)
}
