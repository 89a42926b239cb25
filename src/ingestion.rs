use crate::error::{Result, StatementAnalysisError};
use crate::schema::{CellValue, RawStatementTable, StatementSheet, YEAR_COLUMN};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Every worksheet of an uploaded file, keyed by exact sheet name.
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Workbook {
    pub sheets: BTreeMap<String, RawStatementTable>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sheet(&mut self, name: impl Into<String>, table: RawStatementTable) {
        self.sheets.insert(name.into(), table);
    }

    pub fn sheet(&self, name: &str) -> Option<&RawStatementTable> {
        self.sheets.get(name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Names of the standard statement sheets present in this workbook.
    pub fn standard_sheets(&self) -> Vec<StatementSheet> {
        StatementSheet::ALL
            .into_iter()
            .filter(|sheet| self.sheets.contains_key(sheet.sheet_name()))
            .collect()
    }

    /// Reads one sheet from CSV text whose first record is the header row.
    pub fn add_csv_sheet<R: Read>(&mut self, name: impl Into<String>, reader: R) -> Result<()> {
        let name = name.into();
        let table = read_csv_table(&name, reader)?;
        debug!(
            "Loaded sheet '{}' with {} columns and {} rows",
            name,
            table.headers.len(),
            table.rows.len()
        );
        self.insert_sheet(name, table);
        Ok(())
    }

    /// Loads every `*.csv` file in `dir`; the file stem is the sheet name.
    pub fn from_csv_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut workbook = Workbook::new();

        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let file = std::fs::File::open(&path)?;
            workbook.add_csv_sheet(stem.to_string(), file)?;
        }

        Ok(workbook)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let workbook: Workbook = serde_json::from_str(json)?;
        for (name, table) in &workbook.sheets {
            check_row_widths(name, table)?;
        }
        Ok(workbook)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Opens an `.xlsx`, `.xls` or `.ods` file. The first row of each worksheet is its header.
    #[cfg(feature = "xlsx")]
    pub fn open_spreadsheet<P: AsRef<Path>>(path: P) -> Result<Self> {
        use calamine::{open_workbook_auto, Reader};

        let mut source = open_workbook_auto(path)?;
        let mut workbook = Workbook::new();

        for name in source.sheet_names() {
            let range = source.worksheet_range(&name)?;
            let mut rows = range.rows();

            let Some(header_row) = rows.next() else {
                debug!("Sheet '{}' is empty; skipping", name);
                continue;
            };

            let mut table =
                RawStatementTable::new(header_row.iter().map(|cell| cell.to_string()).collect());
            for row in rows {
                table.rows.push(row.iter().map(cell_from_spreadsheet).collect());
            }

            workbook.insert_sheet(name, table);
        }

        Ok(workbook)
    }
}

#[cfg(feature = "xlsx")]
fn cell_from_spreadsheet(data: &calamine::Data) -> CellValue {
    use calamine::Data;

    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

fn read_csv_table<R: Read>(sheet: &str, reader: R) -> Result<RawStatementTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut table = RawStatementTable::new(headers);

    for record in rdr.records() {
        let record = record?;
        let mut row: Vec<CellValue> = record.iter().map(CellValue::from_raw).collect();
        if row.len() > table.headers.len() {
            return Err(StatementAnalysisError::MalformedSheet {
                sheet: sheet.to_string(),
                details: format!(
                    "row {} has {} fields but the header has {}",
                    table.rows.len() + 1,
                    row.len(),
                    table.headers.len()
                ),
            });
        }
        row.resize(table.headers.len(), CellValue::Empty);
        table.rows.push(row);
    }

    Ok(table)
}

fn check_row_widths(sheet: &str, table: &RawStatementTable) -> Result<()> {
    for (idx, row) in table.rows.iter().enumerate() {
        if row.len() > table.headers.len() {
            return Err(StatementAnalysisError::MalformedSheet {
                sheet: sheet.to_string(),
                details: format!(
                    "row {} has {} cells but the header has {}",
                    idx + 1,
                    row.len(),
                    table.headers.len()
                ),
            });
        }
    }
    Ok(())
}

/// A single long-form statement value, e.g. exported from an accounting system.
#[derive(Debug, Clone)]
pub struct StatementEntry {
    pub sheet: StatementSheet,
    pub line_item: String,
    pub year: i32,
    pub value: f64,
}

/// Lays long-form entries out as the per-sheet, year-per-row tables the reshaper expects.
pub fn convert_entries_to_workbook(entries: &[StatementEntry]) -> Workbook {
    let mut grouped: BTreeMap<StatementSheet, (Vec<String>, BTreeMap<i32, BTreeMap<String, f64>>)> =
        BTreeMap::new();

    for entry in entries {
        let (items, years) = grouped.entry(entry.sheet).or_default();
        if !items.contains(&entry.line_item) {
            items.push(entry.line_item.clone());
        }
        years
            .entry(entry.year)
            .or_default()
            .insert(entry.line_item.clone(), entry.value);
    }

    let mut workbook = Workbook::new();
    for (sheet, (items, years)) in grouped {
        let mut headers = vec![YEAR_COLUMN.to_string()];
        headers.extend(items.iter().cloned());
        let mut table = RawStatementTable::new(headers);

        for (year, values) in years {
            let mut row = vec![CellValue::Number(year as f64)];
            row.extend(items.iter().map(|item| {
                values
                    .get(item)
                    .map(|v| CellValue::Number(*v))
                    .unwrap_or(CellValue::Empty)
            }));
            table.rows.push(row);
        }

        workbook.insert_sheet(sheet.sheet_name(), table);
    }

    workbook
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_csv_sheet() {
        let csv = "Năm,TỔNG TÀI SẢN,VỐN CHỦ SỞ HỮU\n2022,900,350\n2023.0,1000,\n";
        let mut workbook = Workbook::new();
        workbook.add_csv_sheet("BALANCE SHEEET", csv.as_bytes()).unwrap();

        let sheet = workbook.sheet("BALANCE SHEEET").unwrap();
        assert_eq!(sheet.headers, vec!["Năm", "TỔNG TÀI SẢN", "VỐN CHỦ SỞ HỮU"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1][0], CellValue::Number(2023.0));
        assert_eq!(sheet.rows[1][2], CellValue::Empty);
        assert_eq!(workbook.standard_sheets(), vec![StatementSheet::BalanceSheet]);
    }

    #[test]
    fn test_short_csv_rows_are_padded() {
        let csv = "Năm,A,B\n2023,1\n";
        let mut workbook = Workbook::new();
        workbook.add_csv_sheet("INCOME STATEMENT", csv.as_bytes()).unwrap();
        let sheet = workbook.sheet("INCOME STATEMENT").unwrap();
        assert_eq!(sheet.rows[0].len(), 3);
        assert_eq!(sheet.rows[0][2], CellValue::Empty);
    }

    #[test]
    fn test_wide_csv_rows_are_rejected() {
        let csv = "Năm,A\n2023,1,2\n";
        let mut workbook = Workbook::new();
        let result = workbook.add_csv_sheet("INCOME STATEMENT", csv.as_bytes());
        assert!(matches!(
            result,
            Err(StatementAnalysisError::MalformedSheet { .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mut workbook = Workbook::new();
        workbook
            .add_csv_sheet("CASH FLOW STATEMENT", "Năm,Khấu hao\n2023,-50\n".as_bytes())
            .unwrap();

        let json = workbook.to_json().unwrap();
        let restored = Workbook::from_json_str(&json).unwrap();
        let sheet = restored.sheet("CASH FLOW STATEMENT").unwrap();
        assert_eq!(sheet.rows[0][1], CellValue::Number(-50.0));
    }

    #[test]
    fn test_convert_entries_to_workbook() {
        let entries = vec![
            StatementEntry {
                sheet: StatementSheet::BalanceSheet,
                line_item: "X".to_string(),
                year: 2023,
                value: 5.0,
            },
            StatementEntry {
                sheet: StatementSheet::BalanceSheet,
                line_item: "Y".to_string(),
                year: 2022,
                value: 7.0,
            },
        ];

        let workbook = convert_entries_to_workbook(&entries);
        let sheet = workbook.sheet("BALANCE SHEEET").unwrap();
        assert_eq!(sheet.headers, vec!["Năm", "X", "Y"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], CellValue::Number(2022.0));
        assert_eq!(sheet.rows[0][1], CellValue::Empty);
        assert_eq!(sheet.rows[1][1], CellValue::Number(5.0));
    }
}
