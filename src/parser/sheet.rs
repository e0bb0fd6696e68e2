use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use thiserror::Error;

use super::record::{FieldValue, Row};

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("تعذر فتح ملف Excel: {0}")]
    Open(#[from] calamine::Error),
    #[error("ملف Excel لا يحتوي على أي ورقة")]
    NoSheet,
}

/// Read the first worksheet of a workbook as rows.
///
/// The first row holds the headers. Empty cells are left out of the row, so
/// rows with gaps have fewer fields; fully blank rows are dropped.
pub fn read_first_sheet(path: &Path) -> Result<Vec<Row>, SheetError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::NoSheet)??;
    Ok(range_to_rows(&range))
}

pub fn range_to_rows(range: &Range<Data>) -> Vec<Row> {
    let mut lines = range.rows();
    let headers: Vec<Option<String>> = match lines.next() {
        Some(cells) => cells
            .iter()
            .map(|cell| match cell {
                Data::Empty => None,
                other => Some(other.to_string().trim().to_string()).filter(|h| !h.is_empty()),
            })
            .collect(),
        None => return Vec::new(),
    };

    lines
        .filter_map(|cells| {
            let row: Row = headers
                .iter()
                .zip(cells)
                .filter_map(|(header, cell)| {
                    let header = header.as_ref()?;
                    cell_value(cell).map(|v| (header.clone(), v))
                })
                .collect();
            (!row.is_empty()).then_some(row)
        })
        .collect()
}

fn cell_value(cell: &Data) -> Option<FieldValue> {
    let value = match cell {
        Data::Empty => return None,
        Data::Int(i) => FieldValue::Integer(*i),
        Data::Float(f) => FieldValue::from_f64(*f),
        Data::Bool(b) => FieldValue::Bool(*b),
        Data::String(s) => FieldValue::Text(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => FieldValue::Text(ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => FieldValue::Real(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => FieldValue::Text(s.clone()),
        Data::Error(e) => FieldValue::Text(e.to_string()),
    };
    Some(value)
}
