//! Presentation-ready views of a [`YearlyRatioReport`].
//!
//! Everything here is plain data so a front end can render it from JSON:
//! a formatted summary table, the fixed trend charts, and the methodology
//! reference.

use crate::error::Result;
use crate::ratios::{RatioGroup, RatioId, YearlyRatioReport};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct SummaryRow {
    pub group: String,
    pub ratio: String,
    /// One formatted cell per year, aligned with [`RatioSummaryTable::years`].
    pub cells: Vec<String>,
}

/// All ratios for all years, formatted as `#,###.####` or "N/A".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RatioSummaryTable {
    pub years: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl RatioSummaryTable {
    pub fn from_report(report: &YearlyRatioReport) -> Self {
        let years: Vec<String> = report.year_labels().into_iter().map(String::from).collect();

        let rows = RatioGroup::ALL
            .iter()
            .flat_map(|group| group.ratios())
            .map(|id| SummaryRow {
                group: id.group().label().to_string(),
                ratio: id.label().to_string(),
                cells: years
                    .iter()
                    .map(|year| {
                        report
                            .get(year, id)
                            .map(|value| value.display())
                            .unwrap_or_default()
                    })
                    .collect(),
            })
            .collect();

        Self { years, rows }
    }

    pub fn row(&self, ratio: RatioId) -> Option<&SummaryRow> {
        self.rows.iter().find(|row| row.ratio == ratio.label())
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["Group".to_string(), "Ratio".to_string()];
        header.extend(self.years.iter().cloned());
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.group.clone(), row.ratio.clone()];
            record.extend(row.cells.iter().cloned());
            writer.write_record(&record)?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// One Markdown table per ratio group.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Financial Ratio Summary\n\n");

        let mut current_group: Option<&str> = None;
        for row in &self.rows {
            if current_group != Some(row.group.as_str()) {
                if current_group.is_some() {
                    output.push('\n');
                }
                output.push_str(&format!("## {}\n\n", row.group));
                output.push_str("| Ratio |");
                for year in &self.years {
                    output.push_str(&format!(" {} |", year));
                }
                output.push('\n');
                output.push_str("|:--|");
                for _ in &self.years {
                    output.push_str("--:|");
                }
                output.push('\n');
                current_group = Some(row.group.as_str());
            }

            output.push_str(&format!("| {} |", row.ratio));
            for cell in &row.cells {
                output.push_str(&format!(" {} |", cell));
            }
            output.push('\n');
        }

        output
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TrendSeries {
    pub name: String,
    /// Aligned with [`TrendChart::x`]; `None` is a gap.
    pub values: Vec<Option<f64>>,
}

/// A line chart of selected ratios over the fiscal years.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TrendChart {
    pub title: String,
    pub group: RatioGroup,
    pub x: Vec<String>,
    pub series: Vec<TrendSeries>,
    /// Draw straight through gaps instead of breaking the line.
    pub connect_gaps: bool,
}

impl TrendChart {
    pub fn new(title: &str, group: RatioGroup, ratios: &[RatioId], report: &YearlyRatioReport) -> Self {
        let x = report.year_labels().into_iter().map(String::from).collect();
        let series = ratios
            .iter()
            .map(|id| TrendSeries {
                name: id.label().to_string(),
                values: report.series(*id).into_iter().map(|(_, v)| v).collect(),
            })
            .collect();

        Self {
            title: title.to_string(),
            group,
            x,
            series,
            connect_gaps: true,
        }
    }

    pub fn series(&self, name: &str) -> Option<&TrendSeries> {
        self.series.iter().find(|s| s.name == name)
    }

    /// True when no series has a single plotted point.
    pub fn is_blank(&self) -> bool {
        self.series
            .iter()
            .all(|s| s.values.iter().all(Option::is_none))
    }
}

/// The four standard trend charts.
pub fn trend_charts(report: &YearlyRatioReport) -> Vec<TrendChart> {
    vec![
        TrendChart::new(
            "Profitability",
            RatioGroup::Profitability,
            &[
                RatioId::Roe,
                RatioId::Roa,
                RatioId::NetMargin,
                RatioId::GrossMargin,
            ],
            report,
        ),
        TrendChart::new(
            "Capital Structure",
            RatioGroup::CapitalStructure,
            &[RatioId::DebtToEquity, RatioId::FinancialLeverage],
            report,
        ),
        TrendChart::new(
            "Liquidity",
            RatioGroup::Liquidity,
            &[
                RatioId::CurrentRatio,
                RatioId::QuickRatio,
                RatioId::CashRatio,
            ],
            report,
        ),
        TrendChart::new(
            "Working Capital Cycle (days)",
            RatioGroup::Liquidity,
            &[
                RatioId::Dso,
                RatioId::Dio,
                RatioId::Dpo,
                RatioId::CashConversionCycle,
            ],
            report,
        ),
    ]
}

pub fn methodology_markdown() -> String {
    let mut output = String::new();

    output.push_str("# Methodology\n\n");
    output.push_str(
        "Ratios use period-end balances. Margins and returns are decimal ratios, not percentages. \
         A ratio shows N/A when its inputs are missing or its denominator is zero.\n\n",
    );
    output.push_str("| Group | Ratio | Formula |\n");
    output.push_str("|:--|:--|:--|\n");

    for group in RatioGroup::ALL {
        for id in group.ratios() {
            output.push_str(&format!(
                "| {} | {} | {} |\n",
                group.label(),
                id.label(),
                id.formula()
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::{BaseVariables, RatioEngine};
    use crate::schema::AnalysisConfig;

    fn sample_report() -> YearlyRatioReport {
        let engine = RatioEngine::new(AnalysisConfig::default());
        let mut report = YearlyRatioReport::default();

        let year_2022 = BaseVariables {
            total_assets: Some(1000.0),
            equity: Some(400.0),
            net_income: Some(60.0),
            ..Default::default()
        };
        let year_2023 = BaseVariables {
            total_assets: Some(1_250_000.0),
            equity: Some(0.0),
            ..Default::default()
        };

        report.years.insert("2023".to_string(), engine.compute_year(&year_2023));
        report.years.insert("2022".to_string(), engine.compute_year(&year_2022));
        report
    }

    #[test]
    fn test_summary_table_layout() {
        let table = RatioSummaryTable::from_report(&sample_report());

        assert_eq!(table.years, vec!["2022", "2023"]);
        assert_eq!(table.rows.len(), RatioId::ALL.len());
        assert_eq!(table.rows[0].group, "A. Valuation");

        let leverage = table.row(RatioId::FinancialLeverage).unwrap();
        assert_eq!(leverage.cells, vec!["2.5000", "N/A"]);

        let roe = table.row(RatioId::Roe).unwrap();
        assert_eq!(roe.cells[0], "0.1500");
    }

    #[test]
    fn test_summary_table_exports() {
        let table = RatioSummaryTable::from_report(&sample_report());

        let csv = table.to_csv().unwrap();
        assert!(csv.starts_with("Group,Ratio,2022,2023\n"));
        assert!(csv.contains("D. Capital Structure,Financial Leverage,2.5000,N/A"));

        let markdown = table.to_markdown();
        assert!(markdown.contains("## B. Profitability & Efficiency"));
        assert!(markdown.contains("| Financial Leverage | 2.5000 | N/A |"));
    }

    #[test]
    fn test_trend_charts() {
        let charts = trend_charts(&sample_report());
        assert_eq!(charts.len(), 4);
        assert!(charts.iter().all(|c| c.connect_gaps));

        let capital = &charts[1];
        assert_eq!(capital.x, vec!["2022", "2023"]);
        assert_eq!(
            capital.series("Financial Leverage").unwrap().values,
            vec![Some(2.5), None]
        );

        let cycle = &charts[3];
        assert_eq!(cycle.series.len(), 4);
        assert!(cycle.is_blank());
    }

    #[test]
    fn test_empty_report() {
        let report = YearlyRatioReport::default();
        let table = RatioSummaryTable::from_report(&report);
        assert!(table.years.is_empty());
        assert!(table.rows.iter().all(|r| r.cells.is_empty()));
        assert!(trend_charts(&report).iter().all(|c| c.x.is_empty()));
    }

    #[test]
    fn test_methodology_lists_every_ratio() {
        let markdown = methodology_markdown();
        for id in RatioId::ALL {
            assert!(markdown.contains(id.formula()));
        }
        assert!(markdown.contains("| C. Liquidity & Cash Cycle | Cash Conversion Cycle | DIO + DSO - DPO |"));
    }
}
