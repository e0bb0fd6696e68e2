use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{export_file_name, fetch_tables, ExportError, ExportFile, TableData};
use crate::backend::Backend;
use crate::schema::TableDescriptor;
use crate::ui::Ui;

pub const FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadata {
    #[serde(default)]
    pub export_date: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub tables: Vec<String>,
}

/// Self-describing JSON export: metadata plus rows per table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub metadata: BundleMetadata,
    pub data: TableData,
}

impl ExportBundle {
    pub fn new(exported_at: DateTime<Utc>, data: TableData) -> Self {
        Self {
            metadata: BundleMetadata {
                export_date: Some(exported_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
                version: Some(FORMAT_VERSION.to_string()),
                tables: data.keys().cloned().collect(),
            },
            data,
        }
    }

    /// (table, row count) for every declared table; absent data counts as 0
    pub fn summary(&self) -> Vec<(String, usize)> {
        self.metadata
            .tables
            .iter()
            .map(|t| (t.clone(), self.data.get(t).map_or(0, |rows| rows.len())))
            .collect()
    }

    pub fn total_rows(&self) -> usize {
        self.data.values().map(|rows| rows.len()).sum()
    }
}

/// Export the selected tables as one pretty-printed JSON document
pub fn export_json(
    backend: &dyn Backend,
    tables: &[&TableDescriptor],
    now: DateTime<Utc>,
    ui: &mut impl Ui,
) -> Result<ExportFile, ExportError> {
    let data = fetch_tables(backend, tables, ui)?;
    let bundle = ExportBundle::new(now, data);
    let text = serde_json::to_string_pretty(&bundle)?;

    ui.log(format!(
        "تم تصدير {} سجل من {} جدول",
        bundle.total_rows(),
        bundle.metadata.tables.len()
    ));

    Ok(ExportFile {
        file_name: export_file_name(now, "json"),
        bytes: text.into_bytes(),
    })
}
