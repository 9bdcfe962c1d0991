//! Tabular export of an analyzed series
//!
//! The export lists every row newest first and serializes to a single-sheet
//! `.xlsx` workbook with the trading date as the leading index column.

use crate::error::{Result, StockError};
use crate::metrics::{AnalyzedRow, AnalyzedSeries};
use calamine::{Data, DataType, Reader, Xlsx, open_workbook_from_rs};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::io::Cursor;

/// Worksheet holding the exported rows
pub const SHEET_NAME: &str = "Stock_Data";

/// Suffix appended to the company name for the download file
pub const FILE_SUFFIX: &str = "_주가데이터.xlsx";

/// MIME type of the exported workbook
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Column headers, date index first
pub const COLUMNS: [&str; 9] = [
    "Date", "Open", "High", "Low", "Close", "Volume", "MA20", "MA60", "MA120",
];

/// Download file name for `company`
pub fn file_name(company: &str) -> String {
    let safe: String = company
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '"') { '_' } else { c })
        .collect();
    format!("{safe}{FILE_SUFFIX}")
}

/// Analyzed rows in descending date order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularExport {
    rows: Vec<AnalyzedRow>,
}

impl TabularExport {
    pub fn from_series(series: &AnalyzedSeries) -> Self {
        let mut rows = series.rows().to_vec();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Self { rows }
    }

    /// Rows, newest first
    pub fn rows(&self) -> &[AnalyzedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize to an `.xlsx` workbook
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;
        worksheet.set_freeze_panes(1, 1)?;
        worksheet.set_column_width(0, 12)?;

        for (col, name) in (0u16..).zip(COLUMNS) {
            worksheet.write_string_with_format(0, col, name, &header)?;
        }

        for (row_idx, row) in (1u32..).zip(&self.rows) {
            worksheet.write_datetime_with_format(row_idx, 0, &row.date, &date_format)?;
            worksheet.write_number(row_idx, 1, row.open)?;
            worksheet.write_number(row_idx, 2, row.high)?;
            worksheet.write_number(row_idx, 3, row.low)?;
            worksheet.write_number(row_idx, 4, row.close)?;
            worksheet.write_number(row_idx, 5, row.volume as f64)?;
            // undefined averages stay blank
            for (col, value) in [(6u16, row.ma20), (7, row.ma60), (8, row.ma120)] {
                if let Some(value) = value {
                    worksheet.write_number(row_idx, col, value)?;
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    /// Re-read a workbook produced by [`TabularExport::to_xlsx`]
    pub fn read_xlsx(bytes: &[u8]) -> Result<Self> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
        let range = workbook.worksheet_range(SHEET_NAME)?;

        let mut rows = Vec::new();
        for (line, cells) in range.rows().enumerate().skip(1) {
            if cells.len() < COLUMNS.len() {
                return Err(StockError::ExportError(format!(
                    "row {line} has {} cells, expected {}",
                    cells.len(),
                    COLUMNS.len()
                )));
            }
            let required = |col: usize| {
                cells[col].as_f64().ok_or_else(|| {
                    StockError::ExportError(format!("row {line}: missing {}", COLUMNS[col]))
                })
            };

            rows.push(AnalyzedRow {
                date: read_date(&cells[0], line)?,
                open: required(1)?,
                high: required(2)?,
                low: required(3)?,
                close: required(4)?,
                volume: required(5)? as u64,
                ma20: cells[6].as_f64(),
                ma60: cells[7].as_f64(),
                ma120: cells[8].as_f64(),
            });
        }

        Ok(Self { rows })
    }
}

fn read_date(cell: &Data, line: usize) -> Result<NaiveDate> {
    cell.as_date()
        .ok_or_else(|| StockError::ExportError(format!("row {line}: invalid date cell {cell:?}")))
}
