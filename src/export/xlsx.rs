use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::{debug, warn};

use super::{export_file_name, fetch_tables, ExportError, ExportFile, TableData};
use crate::backend::Backend;
use crate::parser::{FieldValue, Row};
use crate::schema::TableDescriptor;
use crate::ui::Ui;

/// Longest string an Excel cell can hold
pub const MAX_CELL_CHARS: usize = 32_767;

/// Export the selected tables as one workbook, one sheet per non-empty table
pub fn export_xlsx(
    backend: &dyn Backend,
    tables: &[&TableDescriptor],
    now: DateTime<Utc>,
    ui: &mut impl Ui,
) -> Result<ExportFile, ExportError> {
    let data = fetch_tables(backend, tables, ui)?;
    let bytes = build_workbook(&data)?;

    Ok(ExportFile {
        file_name: export_file_name(now, "xlsx"),
        bytes,
    })
}

/// Build the workbook. Tables without rows get no sheet; if that leaves no
/// sheet at all the export fails.
pub fn build_workbook(data: &TableData) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let mut sheets = 0;

    for (table, rows) in data {
        if rows.is_empty() {
            debug!(table = table.as_str(), "no rows, sheet omitted");
            continue;
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name(table)?;
        sheet.set_right_to_left(true);
        write_rows(sheet, rows, &header_format)?;
        sheets += 1;
    }

    if sheets == 0 {
        return Err(ExportError::NothingToExport);
    }

    Ok(workbook.save_to_buffer()?)
}

/// Union of the keys of all rows, in first-seen order
pub fn header_columns(rows: &[Row]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for key in rows.iter().flat_map(|r| r.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }
    columns
}

fn write_rows(sheet: &mut Worksheet, rows: &[Row], header_format: &Format) -> Result<(), XlsxError> {
    let columns = header_columns(rows);

    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, header_format)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let excel_row = r as u32 + 1;
        for (col, name) in columns.iter().enumerate() {
            if let Some(value) = row.get(*name) {
                write_cell(sheet, excel_row, col as u16, value)?;
            }
        }
    }

    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &FieldValue) -> Result<(), XlsxError> {
    match value {
        FieldValue::Null => {}
        FieldValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        FieldValue::Integer(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        FieldValue::Real(f) => {
            sheet.write_number(row, col, *f)?;
        }
        FieldValue::Text(s) => write_text(sheet, row, col, s)?,
        FieldValue::Json(v) => write_text(sheet, row, col, &v.to_string())?,
    }
    Ok(())
}

fn write_text(sheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<(), XlsxError> {
    if text.chars().count() > MAX_CELL_CHARS {
        warn!(row, col, "text longer than an Excel cell allows, truncated");
        let truncated: String = text.chars().take(MAX_CELL_CHARS).collect();
        sheet.write_string(row, col, truncated)?;
    } else {
        sheet.write_string(row, col, text)?;
    }
    Ok(())
}
