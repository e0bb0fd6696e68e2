//! Validation of import payloads before anything is written.
//!
//! JSON bundles are kept whole (the caller decides how much to show).
//! Spreadsheets only keep a short sample; the file is read again on commit.

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::export::ExportBundle;
use crate::parser::{read_first_sheet, Row, SheetError};
use crate::ui::{Phase, Ui};

/// Rows shown when previewing a spreadsheet
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("خطأ في قراءة JSON: {0}")]
    Parse(String),
    #[error("تنسيق البيانات غير صالح. يجب أن يحتوي الملف على metadata (مع قائمة tables) و data")]
    InvalidFormat,
    #[error("تنسيق البيانات غير صالح. الجدول {0} موجود في data وغير مذكور في metadata.tables")]
    UndeclaredTable(String),
    #[error("الملف فارغ أو لا يحتوي على بيانات")]
    EmptySheet,
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// What the user is about to import
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPreview {
    Json(ExportBundle),
    Excel { sample: Vec<Row>, total_rows: usize },
}

impl ImportPreview {
    pub fn total_rows(&self) -> usize {
        match self {
            ImportPreview::Json(bundle) => bundle.total_rows(),
            ImportPreview::Excel { total_rows, .. } => *total_rows,
        }
    }
}

/// Parse and check a JSON export bundle
pub fn preview_json(text: &str) -> Result<ExportBundle, PreviewError> {
    let value: Value = serde_json::from_str(text).map_err(|e| PreviewError::Parse(e.to_string()))?;

    let has_tables = value
        .get("metadata")
        .and_then(|m| m.as_object())
        .and_then(|m| m.get("tables"))
        .is_some_and(|t| t.is_array());
    let has_data = value.get("data").is_some_and(|d| d.is_object());
    if !has_tables || !has_data {
        return Err(PreviewError::InvalidFormat);
    }

    // Shape checked above; what can still fail here is a table entry that
    // is not a list of objects, or a non-string table name
    let bundle: ExportBundle = serde_json::from_value(value).map_err(|_| PreviewError::InvalidFormat)?;

    if let Some(undeclared) = bundle
        .data
        .keys()
        .find(|name| !bundle.metadata.tables.contains(*name))
    {
        return Err(PreviewError::UndeclaredTable(undeclared.clone()));
    }

    Ok(bundle)
}

/// Read the first sheet of a workbook and keep a sample of its rows
pub fn preview_excel(path: &Path) -> Result<ImportPreview, PreviewError> {
    let rows = read_first_sheet(path)?;
    if rows.is_empty() {
        return Err(PreviewError::EmptySheet);
    }

    let total_rows = rows.len();
    let sample = rows.into_iter().take(PREVIEW_ROWS).collect();
    Ok(ImportPreview::Excel { sample, total_rows })
}

/// Preview a file, choosing the path by extension
pub fn preview_file(path: &Path, ui: &mut impl Ui) -> anyhow::Result<ImportPreview> {
    ui.set_phase(Phase::Previewing);
    let preview = if is_spreadsheet(path) {
        preview_excel(path)?
    } else {
        let text = std::fs::read_to_string(path)?;
        ImportPreview::Json(preview_json(&text)?)
    };
    ui.log(format!("{}: {} سجل", path.display(), preview.total_rows()));
    Ok(preview)
}

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "xlsx" | "xls" | "xlsm" | "ods"))
}
