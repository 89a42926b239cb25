use crate::ingestion::Workbook;
use crate::schema::{RawStatementTable, StatementSheet, YEAR_COLUMN};
use crate::table::{LineItemRow, UnifiedStatementTable};
use crate::utils::normalize_year_label;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Turns year-per-row statement sheets into one line-item-per-row table.
pub struct StatementReshaper {
    year_column: String,
}

impl Default for StatementReshaper {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementReshaper {
    pub fn new() -> Self {
        Self {
            year_column: YEAR_COLUMN.to_string(),
        }
    }

    pub fn with_year_column(year_column: impl Into<String>) -> Self {
        Self {
            year_column: year_column.into(),
        }
    }

    /// Reshapes every standard sheet found in `workbook`.
    ///
    /// Returns `None` when none of the three statement sheets could be used.
    pub fn reshape(&self, workbook: &Workbook) -> Option<UnifiedStatementTable> {
        let mut years: Vec<String> = Vec::new();
        let mut rows: Vec<LineItemRow> = Vec::new();
        let mut used_sheets = 0;

        for sheet in StatementSheet::ALL {
            let Some(raw) = workbook.sheet(sheet.sheet_name()) else {
                debug!("Sheet '{}' not present; skipping", sheet);
                continue;
            };

            let Some((sheet_years, sheet_rows)) = self.reshape_sheet(sheet, raw) else {
                continue;
            };
            if sheet_rows.is_empty() {
                warn!("Sheet '{}' has no line item columns; skipping", sheet);
                continue;
            }

            for year in sheet_years {
                if !years.contains(&year) {
                    years.push(year);
                }
            }
            rows.extend(sheet_rows);
            used_sheets += 1;
        }

        if used_sheets == 0 {
            return None;
        }

        debug!(
            "Reshaped {} sheets into {} line items across {} year columns",
            used_sheets,
            rows.len(),
            years.len()
        );
        Some(UnifiedStatementTable::new(years, rows))
    }

    /// Pivots one sheet. `None` if the sheet has no year column.
    fn reshape_sheet(
        &self,
        sheet: StatementSheet,
        raw: &RawStatementTable,
    ) -> Option<(Vec<String>, Vec<LineItemRow>)> {
        let Some(year_idx) = raw.column_index(&self.year_column) else {
            warn!(
                "Sheet '{}' has no '{}' column; skipping",
                sheet, self.year_column
            );
            return None;
        };

        // (year label, source row index), first occurrence per year
        let mut year_rows: Vec<(String, usize)> = Vec::new();
        for row_idx in 0..raw.rows.len() {
            let Some(label) = normalize_year_label(raw.cell(row_idx, year_idx)) else {
                warn!(
                    "Sheet '{}' row {} has no year; skipping",
                    sheet,
                    row_idx + 1
                );
                continue;
            };

            if year_rows.iter().any(|(existing, _)| *existing == label) {
                warn!(
                    "Sheet '{}' repeats year {}; keeping the first row",
                    sheet, label
                );
                continue;
            }
            year_rows.push((label, row_idx));
        }

        let rows = raw
            .headers
            .iter()
            .enumerate()
            .filter(|(col_idx, _)| *col_idx != year_idx)
            .map(|(col_idx, name)| {
                let values: BTreeMap<String, _> = year_rows
                    .iter()
                    .map(|(year, row_idx)| (year.clone(), raw.cell(*row_idx, col_idx).clone()))
                    .collect();
                LineItemRow {
                    sheet,
                    name: name.clone(),
                    values,
                }
            })
            .collect();

        let years = year_rows.into_iter().map(|(year, _)| year).collect();
        Some((years, rows))
    }
}

/// Reshapes `workbook` with the default year column.
pub fn reshape_workbook(workbook: &Workbook) -> Option<UnifiedStatementTable> {
    StatementReshaper::new().reshape(workbook)
}
