//! Export of selected tables to a JSON bundle or an Excel workbook

pub mod json;
pub mod template;
pub mod xlsx;

pub use json::*;
pub use template::*;
pub use xlsx::*;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::backend::{Backend, BackendError};
use crate::parser::Row;
use crate::schema::TableDescriptor;
use crate::ui::{Phase, Ui};

/// Rows per table name, in selection order
pub type TableData = IndexMap<String, Vec<Row>>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("يرجى اختيار جدول واحد على الأقل للتصدير")]
    EmptySelection,
    #[error("لا توجد بيانات للتصدير في الجداول المختارة")]
    NothingToExport,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to build workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// A finished export, ready to be written or printed
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    /// The file content as text (JSON exports)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// `family-tree-export-<YYYY-MM-DD>.<ext>`
pub fn export_file_name(now: DateTime<Utc>, extension: &str) -> String {
    format!("family-tree-export-{}.{}", now.format("%Y-%m-%d"), extension)
}

/// Read every row of every selected table.
///
/// An empty selection fails before the backend is touched. The first failing
/// table aborts the whole export.
pub fn fetch_tables(
    backend: &dyn Backend,
    tables: &[&TableDescriptor],
    ui: &mut impl Ui,
) -> Result<TableData, ExportError> {
    if tables.is_empty() {
        return Err(ExportError::EmptySelection);
    }

    ui.set_phase(Phase::Exporting);
    let mut data = TableData::with_capacity(tables.len());

    for (idx, table) in tables.iter().enumerate() {
        ui.set_progress(idx as u64, tables.len() as u64, table.name);
        let rows = backend.select_all(table.name)?;
        info!(table = table.name, rows = rows.len(), "fetched");
        ui.log(format!("{}: {} سجل", table.name, rows.len()));
        data.insert(table.name.to_string(), rows);
    }

    ui.clear_progress();
    Ok(data)
}
