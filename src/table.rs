use crate::error::Result;
use crate::schema::{CellValue, StatementSheet};
use crate::utils::is_fiscal_year;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line item after reshaping, with its cells keyed by year label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct LineItemRow {
    pub sheet: StatementSheet,
    pub name: String,
    pub values: BTreeMap<String, CellValue>,
}

impl LineItemRow {
    pub fn value(&self, year: &str) -> Option<&CellValue> {
        self.values.get(year)
    }
}

/// All reshaped statements in one table: `[sheet, line item, <year>...]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct UnifiedStatementTable {
    years: Vec<String>,
    rows: Vec<LineItemRow>,
}

impl UnifiedStatementTable {
    pub fn new(years: Vec<String>, rows: Vec<LineItemRow>) -> Self {
        Self { years, rows }
    }

    /// Year column labels in first-appearance order, including non-numeric labels.
    pub fn years(&self) -> &[String] {
        &self.years
    }

    /// Year columns whose label is all digits, in table order.
    pub fn fiscal_years(&self) -> Vec<String> {
        self.years
            .iter()
            .filter(|y| is_fiscal_year(y))
            .cloned()
            .collect()
    }

    pub fn rows(&self) -> &[LineItemRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Sheets present in the table, in row order.
    pub fn sheets(&self) -> Vec<StatementSheet> {
        let mut sheets = Vec::new();
        for row in &self.rows {
            if !sheets.contains(&row.sheet) {
                sheets.push(row.sheet);
            }
        }
        sheets
    }

    pub fn rows_for(&self, sheet: StatementSheet) -> impl Iterator<Item = &LineItemRow> {
        self.rows.iter().filter(move |row| row.sheet == sheet)
    }

    /// First row named exactly `name`. Case-sensitive, no normalization.
    pub fn find_row(&self, name: &str) -> Option<&LineItemRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    /// Numeric value of `name` in `year`.
    ///
    /// Absent when there is no such row or year, or the cell is empty or non-numeric.
    pub fn lookup(&self, name: &str, year: &str) -> Option<f64> {
        self.find_row(name)?.value(year)?.as_number()
    }

    /// Writes the raw view: `Sheet,Line Item,<year>...`.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["Sheet".to_string(), "Line Item".to_string()];
        header.extend(self.years.iter().cloned());
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.sheet.sheet_name().to_string(), row.name.clone()];
            record.extend(
                self.years
                    .iter()
                    .map(|year| row.value(year).map(|c| c.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> UnifiedStatementTable {
        let mut assets = BTreeMap::new();
        assets.insert("2022".to_string(), CellValue::Number(900.0));
        assets.insert("2023".to_string(), CellValue::Number(1000.0));

        let mut note = BTreeMap::new();
        note.insert("2023".to_string(), CellValue::Text("restated".to_string()));

        let mut duplicate = BTreeMap::new();
        duplicate.insert("2023".to_string(), CellValue::Number(-1.0));

        UnifiedStatementTable::new(
            vec!["2022".to_string(), "2023".to_string(), "TTM".to_string()],
            vec![
                LineItemRow {
                    sheet: StatementSheet::BalanceSheet,
                    name: "TỔNG TÀI SẢN".to_string(),
                    values: assets,
                },
                LineItemRow {
                    sheet: StatementSheet::BalanceSheet,
                    name: "Ghi chú".to_string(),
                    values: note,
                },
                LineItemRow {
                    sheet: StatementSheet::CashFlow,
                    name: "TỔNG TÀI SẢN".to_string(),
                    values: duplicate,
                },
            ],
        )
    }

    #[test]
    fn test_lookup_present_value() {
        let table = sample_table();
        assert_eq!(table.lookup("TỔNG TÀI SẢN", "2023"), Some(1000.0));
        assert_eq!(table.lookup("TỔNG TÀI SẢN", "2022"), Some(900.0));
    }

    #[test]
    fn test_lookup_absent_cases() {
        let table = sample_table();
        assert_eq!(table.lookup("Tổng tài sản", "2023"), None);
        assert_eq!(table.lookup("TỔNG TÀI SẢN", "2019"), None);
        assert_eq!(table.lookup("TỔNG TÀI SẢN", "TTM"), None);
        assert_eq!(table.lookup("Ghi chú", "2023"), None);
        assert_eq!(table.lookup("", ""), None);
    }

    #[test]
    fn test_lookup_first_match_wins_across_sheets() {
        let table = sample_table();
        assert_eq!(table.lookup("TỔNG TÀI SẢN", "2023"), Some(1000.0));
    }

    #[test]
    fn test_fiscal_years_filters_non_digit_labels() {
        let table = sample_table();
        assert_eq!(table.fiscal_years(), vec!["2022", "2023"]);
        assert_eq!(table.years().len(), 3);
    }

    #[test]
    fn test_sheet_views() {
        let table = sample_table();
        assert_eq!(
            table.sheets(),
            vec![StatementSheet::BalanceSheet, StatementSheet::CashFlow]
        );
        assert_eq!(table.rows_for(StatementSheet::BalanceSheet).count(), 2);
        assert_eq!(table.rows_for(StatementSheet::IncomeStatement).count(), 0);
    }

    #[test]
    fn test_to_csv() {
        let csv = sample_table().to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Sheet,Line Item,2022,2023,TTM"));
        assert_eq!(lines.next(), Some("BALANCE SHEEET,TỔNG TÀI SẢN,900,1000,"));
        assert_eq!(lines.next(), Some("BALANCE SHEEET,Ghi chú,,restated,"));
    }
}
