//! Batched upsert of imported rows.
//!
//! Batches are sent one after another. A failing batch stops the import;
//! tables finished before it stay imported.

use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::backend::{Backend, BackendError};
use crate::export::ExportBundle;
use crate::inventory::{load_inventory, TableSelection};
use crate::parser::{read_first_sheet, Row, SheetError};
use crate::schema::{get_table, TableDescriptor};
use crate::ui::{Phase, Ui};

/// Rows per upsert request
pub const BATCH_SIZE: usize = 100;

/// Columns the database fills in itself, in both naming conventions
pub const SERVER_MANAGED_FIELDS: &[&str] = &["تاريخ_الإنشاء", "تاريخ_التحديث", "created_at", "updated_at"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("الجدول {0} غير معروف")]
    UnknownTable(String),
    #[error("يرجى اختيار الجدول المستهدف")]
    MissingTarget,
    #[error("الملف فارغ أو لا يحتوي على بيانات")]
    EmptySheet,
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("فشل استيراد الدفعة {batch} من جدول {table}: {source}")]
    Batch {
        table: String,
        batch: usize,
        /// Tables fully imported before the failure
        completed: Vec<TableReport>,
        #[source]
        source: BackendError,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub rows: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub tables: Vec<TableReport>,
    /// Declared tables that had no rows to import
    pub skipped: Vec<String>,
}

impl ImportReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Drop the server-managed timestamp fields, keeping the order of the rest
pub fn clean_row(row: &mut Row) {
    for field in SERVER_MANAGED_FIELDS {
        row.shift_remove(*field);
    }
}

/// Upsert `rows` into `table` in batches of [`BATCH_SIZE`].
/// Returns the number of batches sent.
pub fn import_table(
    backend: &dyn Backend,
    table: &TableDescriptor,
    rows: Vec<Row>,
    ui: &mut impl Ui,
) -> Result<usize, ImportError> {
    if rows.is_empty() {
        info!(table = table.name, "no rows, skipped");
        return Ok(0);
    }

    let total = rows.len();
    let batch_count = total.div_ceil(BATCH_SIZE);
    let mut done = 0;

    for (idx, chunk) in rows.chunks(BATCH_SIZE).enumerate() {
        let batch: Vec<Row> = chunk
            .iter()
            .cloned()
            .map(|mut row| {
                clean_row(&mut row);
                row
            })
            .collect();

        debug!(table = table.name, batch = idx + 1, of = batch_count, rows = batch.len(), "upsert");
        backend
            .upsert(table.name, &batch, table.primary_key, false)
            .map_err(|source| ImportError::Batch {
                table: table.name.to_string(),
                batch: idx + 1,
                completed: Vec::new(),
                source,
            })?;

        done += batch.len();
        ui.set_progress(done as u64, total as u64, table.name);
    }

    info!(table = table.name, rows = total, batches = batch_count, "imported");
    ui.log(format!("{}: تم استيراد {} سجل", table.name, total));
    Ok(batch_count)
}

/// Import every table declared in a JSON bundle, in declaration order
pub fn import_bundle(
    backend: &dyn Backend,
    bundle: ExportBundle,
    ui: &mut impl Ui,
) -> Result<ImportReport, ImportError> {
    ui.set_phase(Phase::Importing);

    // Resolve every table first so an unknown name fails before any write
    let mut plan = Vec::with_capacity(bundle.metadata.tables.len());
    for name in &bundle.metadata.tables {
        let table = get_table(name).ok_or_else(|| ImportError::UnknownTable(name.clone()))?;
        plan.push(table);
    }

    let ExportBundle { mut data, .. } = bundle;
    let mut report = ImportReport::default();

    for table in plan {
        let rows = data.shift_remove(table.name).unwrap_or_default();
        if rows.is_empty() {
            info!(table = table.name, "no data in bundle, skipped");
            report.skipped.push(table.name.to_string());
            continue;
        }

        let count = rows.len();
        match import_table(backend, table, rows, ui) {
            Ok(batches) => report.tables.push(TableReport {
                table: table.name.to_string(),
                rows: count,
                batches,
            }),
            Err(ImportError::Batch {
                table, batch, source, ..
            }) => {
                return Err(ImportError::Batch {
                    table,
                    batch,
                    completed: report.tables,
                    source,
                })
            }
            Err(e) => return Err(e),
        }
    }

    ui.clear_progress();
    Ok(report)
}

/// Import the first sheet of a workbook into `target`.
/// The file is read again here rather than reusing the preview sample.
pub fn import_sheet(
    backend: &dyn Backend,
    target: Option<&str>,
    path: &Path,
    ui: &mut impl Ui,
) -> Result<ImportReport, ImportError> {
    let name = target.ok_or(ImportError::MissingTarget)?;
    let table = get_table(name).ok_or_else(|| ImportError::UnknownTable(name.to_string()))?;

    let rows = read_first_sheet(path)?;
    if rows.is_empty() {
        return Err(ImportError::EmptySheet);
    }

    ui.set_phase(Phase::Importing);
    let count = rows.len();
    let batches = import_table(backend, table, rows, ui)?;
    ui.clear_progress();

    Ok(ImportReport {
        tables: vec![TableReport {
            table: table.name.to_string(),
            rows: count,
            batches,
        }],
        skipped: Vec::new(),
    })
}

/// Import a bundle, then reload the inventory so counts reflect the import
pub fn commit_bundle(
    backend: &dyn Backend,
    bundle: ExportBundle,
    ui: &mut impl Ui,
) -> Result<(ImportReport, Vec<TableSelection>), ImportError> {
    let report = import_bundle(backend, bundle, ui)?;
    let inventory = load_inventory(backend, ui);
    Ok((report, inventory))
}

/// Import a sheet, then reload the inventory
pub fn commit_sheet(
    backend: &dyn Backend,
    target: Option<&str>,
    path: &Path,
    ui: &mut impl Ui,
) -> Result<(ImportReport, Vec<TableSelection>), ImportError> {
    let report = import_sheet(backend, target, path, ui)?;
    let inventory = load_inventory(backend, ui);
    Ok((report, inventory))
}
