//! XLSX encoding of tables.
//!
//! Workbooks are written with `rust_xlsxwriter` and read back with
//! `calamine`. Only the first worksheet is read.

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use rust_xlsxwriter::{Format, Workbook};

use crate::error::{Error, Result};

use super::{Cell, Table};

fn build(table: &Table, sheet_name: &str) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (col, name) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, column_index(col)?, name, &header)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        let row_index = u32::try_from(i + 1)
            .map_err(|_| Error::internal("too many rows for a worksheet"))?;
        for (col, cell) in row.iter().enumerate() {
            let col = column_index(col)?;
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    sheet.write_string(row_index, col, text)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row_index, col, *n)?;
                }
            }
        }
    }
    Ok(workbook)
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::internal("too many columns for a worksheet"))
}

/// Write `table` to an XLSX file with one worksheet named `sheet_name`.
///
/// # Errors
///
/// Returns an error if the sheet name is invalid or the file cannot be saved.
pub fn write_xlsx(table: &Table, path: &Path, sheet_name: &str) -> Result<()> {
    let mut workbook = build(table, sheet_name)?;
    workbook.save(path)?;
    Ok(())
}

/// Read the first worksheet of a spreadsheet file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not a spreadsheet.
pub fn read_xlsx(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    match workbook.worksheet_range_at(0) {
        Some(range) => Ok(range_to_table(&range?)),
        None => Ok(Table::default()),
    }
}

fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Table::default();
    };
    let headers = header_row
        .iter()
        .map(|value| match value {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    let rows = rows.map(|row| row.iter().map(to_cell).collect()).collect();
    Table { headers, rows }
}

#[allow(clippy::cast_precision_loss)]
fn to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::DateTime(_) => value.as_date().map_or_else(
            || Cell::Text(value.to_string()),
            |date| Cell::Text(date.format("%Y-%m-%d").to_string()),
        ),
        other => Cell::Text(other.to_string()),
    }
}
