use crate::error::{Result, StatementAnalysisError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Header of the column that carries the fiscal year in every source sheet.
pub const YEAR_COLUMN: &str = "Năm";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum StatementSheet {
    #[schemars(description = "Point-in-time balances: assets, liabilities and equity at fiscal year end")]
    BalanceSheet,

    #[schemars(description = "Period activity: revenue, costs and profit for the fiscal year")]
    IncomeStatement,

    #[schemars(description = "Cash movements from operating, investing and financing activities")]
    CashFlow,
}

impl StatementSheet {
    /// Sheets in the order the reshaper visits them, which is also the lookup precedence.
    pub const ALL: [StatementSheet; 3] = [
        StatementSheet::BalanceSheet,
        StatementSheet::IncomeStatement,
        StatementSheet::CashFlow,
    ];

    /// Exact worksheet name expected in the uploaded workbook.
    ///
    /// The balance sheet name keeps the triple "E" used by the reporting template.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            StatementSheet::BalanceSheet => "BALANCE SHEEET",
            StatementSheet::IncomeStatement => "INCOME STATEMENT",
            StatementSheet::CashFlow => "CASH FLOW STATEMENT",
        }
    }

    pub fn from_sheet_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sheet| sheet.sheet_name() == name)
    }

    pub fn expected_sheet_names() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|sheet| sheet.sheet_name().to_string())
            .collect()
    }
}

impl std::fmt::Display for StatementSheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// A single spreadsheet cell as read from the source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Parses a raw text field the way a spreadsheet reader would type it.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(trimmed.to_string()),
        }
    }

    /// Numeric view of the cell. Empty, NaN, infinite and non-numeric cells are absent.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Empty => Ok(()),
        }
    }
}

/// One worksheet before reshaping: a year column plus one column per line item,
/// one row per fiscal year.
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct RawStatementTable {
    #[schemars(description = "Column headers. One of them is the year column ('Năm'); every other header is a line item name.")]
    pub headers: Vec<String>,

    #[schemars(description = "One row per fiscal year, aligned with the headers.")]
    pub rows: Vec<Vec<CellValue>>,
}

impl RawStatementTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum FallbackPolicy {
    #[default]
    #[schemars(
        description = "A value of exactly zero counts as absent and the next alias is tried. Matches the legacy 'primary or alternate' lookups, so a genuine zero can be replaced by an alternate line item."
    )]
    Truthy,

    #[schemars(description = "The first alias with a value wins, zero included. Only absent values fall through.")]
    PresentOnly,
}

fn default_share_par_value() -> f64 {
    10_000.0
}

fn default_days_in_year() -> f64 {
    365.0
}

fn default_corporate_tax_rate() -> f64 {
    0.20
}

fn default_base_valuation() -> f64 {
    10_000.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AnalysisConfig {
    #[serde(default)]
    #[schemars(description = "How alias chains treat a line item that is present but exactly zero.")]
    pub fallback_policy: FallbackPolicy,

    #[serde(default = "default_share_par_value")]
    #[schemars(description = "Par value per share. Paid-in capital divided by this gives the share count used for BVPS.")]
    pub share_par_value: f64,

    #[serde(default = "default_days_in_year")]
    #[schemars(description = "Day count used by DSO, DIO and DPO.")]
    pub days_in_year: f64,

    #[serde(default = "default_corporate_tax_rate")]
    #[schemars(description = "Tax rate applied to EBIT for ROIC, as a decimal in [0, 1).")]
    pub corporate_tax_rate: f64,

    #[serde(default = "default_base_valuation")]
    #[schemars(description = "Default base valuation fed to the risk discount matrix.")]
    pub base_valuation: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fallback_policy: FallbackPolicy::default(),
            share_par_value: default_share_par_value(),
            days_in_year: default_days_in_year(),
            corporate_tax_rate: default_corporate_tax_rate(),
            base_valuation: default_base_valuation(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.share_par_value.is_finite() && self.share_par_value > 0.0) {
            return Err(StatementAnalysisError::InvalidConfig(format!(
                "share_par_value must be positive, got {}",
                self.share_par_value
            )));
        }

        if !(self.days_in_year.is_finite() && self.days_in_year > 0.0) {
            return Err(StatementAnalysisError::InvalidConfig(format!(
                "days_in_year must be positive, got {}",
                self.days_in_year
            )));
        }

        if !(0.0..1.0).contains(&self.corporate_tax_rate) {
            return Err(StatementAnalysisError::InvalidConfig(format!(
                "corporate_tax_rate must be in [0, 1), got {}",
                self.corporate_tax_rate
            )));
        }

        if !(self.base_valuation.is_finite() && self.base_valuation >= 0.0) {
            return Err(StatementAnalysisError::InvalidBaseValuation(
                self.base_valuation,
            ));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
