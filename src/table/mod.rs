// src/table/mod.rs

use anyhow::{Context, Result};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::CheckerError;

pub mod cell;

pub use cell::Cell;

/// Where things sit on the cumulative-cases worksheet. Rows and columns are
/// 1-based, as shown in a spreadsheet application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub header_row: u32,
    pub date_col: u32,
    pub first_region_col: u32,
    pub last_region_col: u32,
    pub first_data_row: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header_row: 3,
            date_col: 1,
            first_region_col: 2,
            last_region_col: 16,
            first_data_row: 4,
        }
    }
}

/// One reporting date.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub date: Cell,
    pub counts: Vec<Cell>,
}

/// Cumulative counts per region, trimmed to the last row carrying a date.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseTable {
    regions: Vec<String>,
    first_row: u32,
    rows: Vec<DataRow>,
}

impl CaseTable {
    /// `rows[0]` sits on sheet row `first_row`. Trailing rows without a date
    /// are dropped; a table left with no rows is an error.
    pub fn from_parts(
        regions: Vec<String>,
        first_row: u32,
        mut rows: Vec<DataRow>,
    ) -> Result<Self, CheckerError> {
        while rows.last().is_some_and(|r| r.date.is_empty()) {
            rows.pop();
        }
        if rows.is_empty() {
            return Err(CheckerError::EmptyTable);
        }
        Ok(Self {
            regions,
            first_row,
            rows,
        })
    }

    /// Region names in column order.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Sheet row number of the newest row with a date.
    pub fn last_data_row(&self) -> u32 {
        self.first_row + self.rows.len() as u32 - 1
    }

    pub fn first_data_row(&self) -> u32 {
        self.first_row
    }

    pub fn row(&self, row: u32) -> Result<&DataRow, CheckerError> {
        row.checked_sub(self.first_row)
            .and_then(|i| self.rows.get(i as usize))
            .ok_or(CheckerError::RowOutOfTable(row))
    }

    /// Raw cell for region index `region` (0-based) on sheet row `row`.
    pub fn cell(&self, row: u32, region: usize) -> Result<&Cell, CheckerError> {
        static EMPTY: Cell = Cell::Empty;
        Ok(self.row(row)?.counts.get(region).unwrap_or(&EMPTY))
    }

    /// Integer value of a count cell, see [`Cell::coerce`].
    pub fn count(&self, row: u32, region: usize) -> Result<i64, CheckerError> {
        let cell = self.cell(row, region)?;
        cell.coerce().ok_or_else(|| CheckerError::NotANumber {
            row,
            region: self.regions.get(region).cloned().unwrap_or_default(),
            value: cell.to_string(),
        })
    }
}

/// Open `path` and read the worksheet named `title` into a [`CaseTable`].
///
/// Only cached cell values are read; formulas are never evaluated.
#[instrument(level = "info", skip(layout))]
pub fn load(path: &Path, title: &str, layout: &SheetLayout) -> Result<CaseTable> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).with_context(|| format!("opening workbook {}", path.display()))?;

    let available = workbook.sheet_names().to_owned();
    if !available.iter().any(|n| n == title) {
        return Err(CheckerError::WorksheetNotFound {
            title: title.to_string(),
            available,
        }
        .into());
    }

    let range = workbook
        .worksheet_range(title)
        .with_context(|| format!("reading worksheet `{}`", title))?;
    let table = table_from_range(&range, layout)?;
    info!(
        regions = table.regions().len(),
        last_row = table.last_data_row(),
        "loaded case table"
    );
    Ok(table)
}

fn table_from_range(range: &Range<Data>, layout: &SheetLayout) -> Result<CaseTable, CheckerError> {
    let at = |row: u32, col: u32| -> Cell {
        range
            .get_value((row - 1, col - 1))
            .map(Cell::from)
            .unwrap_or(Cell::Empty)
    };

    let mut regions: Vec<String> = (layout.first_region_col..=layout.last_region_col)
        .map(|col| at(layout.header_row, col).to_string().trim().to_string())
        .collect();
    while regions.last().is_some_and(|r| r.is_empty()) {
        regions.pop();
    }

    // The used range can extend past the data, so start from its reported
    // end and let `from_parts` walk back to the last dated row.
    let max_row = range.end().map(|(r, _)| r + 1).unwrap_or(0);
    debug!(max_row, "worksheet extent");
    let rows = (layout.first_data_row..=max_row)
        .map(|row| DataRow {
            date: at(row, layout.date_col),
            counts: (0..regions.len() as u32)
                .map(|i| at(row, layout.first_region_col + i))
                .collect(),
        })
        .collect();

    CaseTable::from_parts(regions, layout.first_data_row, rows)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use rust_xlsxwriter::Workbook;

    /// Write a workbook shaped like the published one: a decoy sheet first,
    /// header on row 3, dated rows from row 4, then `blank_tail` rows that
    /// carry counts but no date.
    pub(crate) fn write_workbook(
        path: &Path,
        title: &str,
        regions: &[&str],
        rows: &[Vec<f64>],
        blank_tail: u32,
    ) {
        let mut wb = Workbook::new();
        let decoy = wb.add_worksheet();
        decoy.set_name("Notes").unwrap();
        decoy.write_string(0, 0, "not this one").unwrap();

        let ws = wb.add_worksheet();
        ws.set_name(title).unwrap();
        ws.write_string(0, 0, "COVID-19 cumulative cases").unwrap();
        ws.write_string(2, 0, "Date").unwrap();
        for (i, name) in regions.iter().enumerate() {
            ws.write_string(2, 1 + i as u16, *name).unwrap();
        }
        for (r, values) in rows.iter().enumerate() {
            let row = 3 + r as u32;
            ws.write_string(row, 0, format!("2020-10-{:02}", r + 1))
                .unwrap();
            for (c, v) in values.iter().enumerate() {
                ws.write_number(row, 1 + c as u16, *v).unwrap();
            }
        }
        for t in 0..blank_tail {
            ws.write_number(3 + rows.len() as u32 + t, 1, 0.0).unwrap();
        }
        wb.save(path).unwrap();
    }
}
