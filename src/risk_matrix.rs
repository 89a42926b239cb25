use crate::error::{Result, StatementAnalysisError};
use crate::utils::{format_with_separators, round_to};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Illiquidity discount axis, in percent: 0% to 40% in 5% steps.
pub const ILLIQUIDITY_DISCOUNTS_PCT: [u32; 9] = [0, 5, 10, 15, 20, 25, 30, 35, 40];

/// Valuation multiple haircut axis, in percent: 0% to 30% in 5% steps.
pub const VALUATION_HAIRCUTS_PCT: [u32; 7] = [0, 5, 10, 15, 20, 25, 30];

/// `base x (1 - discount) x (1 - haircut)`, rounded to two decimals.
pub fn discounted_value(base: f64, illiquidity_discount_pct: u32, valuation_haircut_pct: u32) -> f64 {
    let discount = illiquidity_discount_pct as f64 / 100.0;
    let haircut = valuation_haircut_pct as f64 / 100.0;
    round_to(base * (1.0 - discount) * (1.0 - haircut), 2)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Scenario {
    Bull,
    Base,
    Bear,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Bull, Scenario::Base, Scenario::Bear];

    /// `(illiquidity discount %, valuation haircut %)`.
    pub fn adjustments(&self) -> (u32, u32) {
        match self {
            Scenario::Bull => (5, 5),
            Scenario::Base => (15, 10),
            Scenario::Bear => (30, 20),
        }
    }

    pub fn label(&self) -> String {
        let (discount, haircut) = self.adjustments();
        let name = match self {
            Scenario::Bull => "Bull Case",
            Scenario::Base => "Base Case",
            Scenario::Bear => "Bear Case",
        };
        format!("{} (ID {}%, VMH {}%)", name, discount, haircut)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ScenarioValue {
    pub scenario: Scenario,
    pub illiquidity_discount_pct: u32,
    pub valuation_haircut_pct: u32,
    pub value: f64,
}

/// Discounted values: one row per valuation haircut, one column per illiquidity discount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RiskMatrix {
    pub base_value: f64,
    pub illiquidity_discounts_pct: Vec<u32>,
    pub valuation_haircuts_pct: Vec<u32>,
    pub values: Vec<Vec<f64>>,
}

impl RiskMatrix {
    pub fn build(base_value: f64) -> Result<Self> {
        validate_base_value(base_value)?;

        let values = VALUATION_HAIRCUTS_PCT
            .iter()
            .map(|&haircut| {
                ILLIQUIDITY_DISCOUNTS_PCT
                    .iter()
                    .map(|&discount| discounted_value(base_value, discount, haircut))
                    .collect()
            })
            .collect();

        Ok(Self {
            base_value,
            illiquidity_discounts_pct: ILLIQUIDITY_DISCOUNTS_PCT.to_vec(),
            valuation_haircuts_pct: VALUATION_HAIRCUTS_PCT.to_vec(),
            values,
        })
    }

    /// Value at the given axis points, `None` if either is off-axis.
    pub fn cell(&self, illiquidity_discount_pct: u32, valuation_haircut_pct: u32) -> Option<f64> {
        let col = self
            .illiquidity_discounts_pct
            .iter()
            .position(|&d| d == illiquidity_discount_pct)?;
        let row = self
            .valuation_haircuts_pct
            .iter()
            .position(|&h| h == valuation_haircut_pct)?;
        self.values.get(row)?.get(col).copied()
    }

    pub fn cell_count(&self) -> usize {
        self.values.iter().map(Vec::len).sum()
    }

    pub fn row_labels(&self) -> Vec<String> {
        self.valuation_haircuts_pct
            .iter()
            .map(|h| format!("VMH {}%", h))
            .collect()
    }

    pub fn column_labels(&self) -> Vec<String> {
        self.illiquidity_discounts_pct
            .iter()
            .map(|d| format!("ID {}%", d))
            .collect()
    }

    pub fn scenario(&self, scenario: Scenario) -> ScenarioValue {
        let (discount, haircut) = scenario.adjustments();
        ScenarioValue {
            scenario,
            illiquidity_discount_pct: discount,
            valuation_haircut_pct: haircut,
            value: discounted_value(self.base_value, discount, haircut),
        }
    }

    pub fn scenarios(&self) -> Vec<ScenarioValue> {
        Scenario::ALL.iter().map(|s| self.scenario(*s)).collect()
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec![String::new()];
        header.extend(self.column_labels());
        writer.write_record(&header)?;

        for (label, row) in self.row_labels().into_iter().zip(&self.values) {
            let mut record = vec![label];
            record.extend(row.iter().map(|v| format!("{:.2}", v)));
            writer.write_record(&record)?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Heatmap-style text table with whole-number values.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "**Adjusted value matrix** (base = {})\n\n",
            format_with_separators(self.base_value, 0)
        ));

        output.push_str("| |");
        for label in self.column_labels() {
            output.push_str(&format!(" {} |", label));
        }
        output.push('\n');

        output.push_str("|:--|");
        for _ in &self.illiquidity_discounts_pct {
            output.push_str("--:|");
        }
        output.push('\n');

        for (label, row) in self.row_labels().into_iter().zip(&self.values) {
            output.push_str(&format!("| {} |", label));
            for value in row {
                output.push_str(&format!(" {} |", format_with_separators(*value, 0)));
            }
            output.push('\n');
        }

        output
    }
}

fn validate_base_value(base_value: f64) -> Result<()> {
    if !base_value.is_finite() || base_value < 0.0 {
        return Err(StatementAnalysisError::InvalidBaseValuation(base_value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_shape() {
        let matrix = RiskMatrix::build(10_000.0).unwrap();
        assert_eq!(matrix.values.len(), 7);
        assert!(matrix.values.iter().all(|row| row.len() == 9));
        assert_eq!(matrix.cell_count(), 63);
        assert_eq!(matrix.row_labels()[0], "VMH 0%");
        assert_eq!(matrix.column_labels()[8], "ID 40%");
    }

    #[test]
    fn test_known_cells() {
        let matrix = RiskMatrix::build(10_000.0).unwrap();
        assert_eq!(matrix.cell(0, 0), Some(10_000.0));
        assert_eq!(matrix.cell(15, 10), Some(7650.0));
        assert_eq!(matrix.cell(40, 30), Some(4200.0));
        assert_eq!(matrix.cell(45, 0), None);
        assert_eq!(matrix.cell(0, 35), None);
    }

    #[test]
    fn test_scenarios() {
        let matrix = RiskMatrix::build(10_000.0).unwrap();
        assert_eq!(matrix.scenario(Scenario::Bull).value, 9025.0);
        assert_eq!(matrix.scenario(Scenario::Base).value, 7650.0);
        assert_eq!(matrix.scenario(Scenario::Bear).value, 5600.0);
        assert_eq!(matrix.scenarios().len(), 3);
        assert_eq!(Scenario::Base.label(), "Base Case (ID 15%, VMH 10%)");
    }

    #[test]
    fn test_values_are_rounded_to_cents() {
        let matrix = RiskMatrix::build(1234.567).unwrap();
        for row in &matrix.values {
            for value in row {
                assert_eq!(*value, round_to(*value, 2));
            }
        }
        assert_eq!(matrix.cell(0, 0), Some(1234.57));
    }

    #[test]
    fn test_huge_base_stays_finite() {
        let matrix = RiskMatrix::build(1e307).unwrap();
        assert!(matrix.values.iter().flatten().all(|v| v.is_finite()));
        assert_eq!(matrix.cell(0, 0), Some(1e307));
        assert!(matrix.scenario(Scenario::Bear).value.is_finite());
        assert!(matrix.scenario(Scenario::Bear).value < 1e307);
    }

    #[test]
    fn test_zero_base_is_allowed() {
        let matrix = RiskMatrix::build(0.0).unwrap();
        assert!(matrix.values.iter().flatten().all(|v| *v == 0.0));
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(matches!(
            RiskMatrix::build(-1.0),
            Err(StatementAnalysisError::InvalidBaseValuation(_))
        ));
        assert!(RiskMatrix::build(f64::NAN).is_err());
        assert!(RiskMatrix::build(f64::INFINITY).is_err());
    }

    #[test]
    fn test_exports() {
        let matrix = RiskMatrix::build(10_000.0).unwrap();
        let csv = matrix.to_csv().unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with(",ID 0%,ID 5%"));
        assert!(lines.next().unwrap().starts_with("VMH 0%,10000.00,9500.00"));

        let markdown = matrix.to_markdown();
        assert!(markdown.contains("base = 10,000"));
        assert!(markdown.contains("| VMH 10% |"));
    }
}
