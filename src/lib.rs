//! # Financial Statement Analyzer
//!
//! A library for turning annual financial statement workbooks into a unified
//! line item table, a per-year ratio report and a risk-adjusted valuation matrix.
//!
//! ## Core Concepts
//!
//! - **Workbook**: The uploaded sheets. Only `BALANCE SHEEET`, `INCOME STATEMENT`
//!   and `CASH FLOW STATEMENT` are read; each has one row per fiscal year (`Năm`)
//!   and one column per line item
//! - **Unified Table**: Every line item of every sheet, one column per year
//! - **Line Item Vocabulary**: Fixed semantic tags with ordered source names,
//!   resolved under a [`FallbackPolicy`]
//! - **Ratio Report**: 23 ratios in four groups per fiscal year; anything that cannot
//!   be computed is N/A rather than an error
//! - **Risk Matrix**: A base valuation discounted for illiquidity and for a
//!   valuation multiple haircut
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_statement_analyzer::*;
//!
//! let workbook = Workbook::from_csv_dir("statements/")?;
//! let outcome = analyze_workbook(&workbook, &AnalysisConfig::default())?;
//!
//! let roe = outcome.ratios.get("2023", RatioId::Roe);
//! let base_case = outcome.risk_matrix.scenario(Scenario::Base);
//! println!("{}", RatioSummaryTable::from_report(&outcome.ratios).to_markdown());
//! ```

pub mod composition;
pub mod error;
pub mod ingestion;
pub mod line_items;
pub mod ratios;
pub mod report;
pub mod reshaper;
pub mod risk_matrix;
pub mod schema;
pub mod table;
pub mod utils;

pub use composition::{
    Breakdown, BreakdownKind, CompositionAnalysis, CompositionAnalyzer, CompositionSlice,
};
pub use error::{Result, StatementAnalysisError};
pub use ingestion::{convert_entries_to_workbook, StatementEntry, Workbook};
pub use line_items::{LineItem, LineItemResolver};
pub use ratios::{
    compute_ratios, BaseVariables, RatioEngine, RatioGroup, RatioId, YearRatios,
    YearlyRatioReport,
};
pub use report::{methodology_markdown, trend_charts, RatioSummaryTable, TrendChart, TrendSeries};
pub use reshaper::{reshape_workbook, StatementReshaper};
pub use risk_matrix::{RiskMatrix, Scenario, ScenarioValue};
pub use schema::*;
pub use table::{LineItemRow, UnifiedStatementTable};
pub use utils::{safe_divide, RatioValue, NOT_AVAILABLE};

use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AnalysisOutcome {
    pub table: UnifiedStatementTable,
    pub ratios: YearlyRatioReport,
    pub risk_matrix: RiskMatrix,
    /// Policy the ratios were resolved under; views derived later reuse it.
    pub fallback_policy: FallbackPolicy,
}

impl AnalysisOutcome {
    pub fn summary_table(&self) -> RatioSummaryTable {
        RatioSummaryTable::from_report(&self.ratios)
    }

    pub fn trend_charts(&self) -> Vec<TrendChart> {
        trend_charts(&self.ratios)
    }

    /// Composition for the last fiscal year, resolved like the ratios were.
    pub fn latest_composition(&self) -> Option<CompositionAnalysis> {
        CompositionAnalyzer::new(&self.table, self.fallback_policy).analyze_latest()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct FinancialStatementAnalyzer {
    config: AnalysisConfig,
    reshaper: StatementReshaper,
}

impl FinancialStatementAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            reshaper: StatementReshaper::new(),
        }
    }

    pub fn with_reshaper(mut self, reshaper: StatementReshaper) -> Self {
        self.reshaper = reshaper;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Reshape, compute ratios and build the risk matrix at the configured base valuation.
    pub fn analyze(&self, workbook: &Workbook) -> Result<AnalysisOutcome> {
        self.config.validate()?;

        info!("Analyzing workbook with {} sheets", workbook.len());
        debug!(
            "Standard sheets present: {:?}",
            workbook.standard_sheets()
        );

        let table = self.reshaper.reshape(workbook).ok_or_else(|| {
            StatementAnalysisError::StandardSheetsNotFound {
                expected: StatementSheet::expected_sheet_names(),
            }
        })?;

        let ratios = RatioEngine::new(self.config.clone()).compute(&table);
        let risk_matrix = RiskMatrix::build(self.config.base_valuation)?;

        info!(
            "Analysis complete: {} line items, {} fiscal years",
            table.len(),
            ratios.len()
        );

        Ok(AnalysisOutcome {
            table,
            ratios,
            risk_matrix,
            fallback_policy: self.config.fallback_policy,
        })
    }

    /// Rebuilds only the risk matrix, for a user-entered base valuation.
    pub fn risk_matrix(&self, base_valuation: f64) -> Result<RiskMatrix> {
        RiskMatrix::build(base_valuation)
    }
}

pub fn analyze_workbook(workbook: &Workbook, config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    FinancialStatementAnalyzer::new(config.clone()).analyze(workbook)
}

pub fn build_risk_matrix(base_valuation: f64) -> Result<RiskMatrix> {
    RiskMatrix::build(base_valuation)
}
