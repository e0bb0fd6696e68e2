//! End-to-end tests: export from one database, import into another, and
//! check the rows and the requests issued along the way.
//!
//! Everything runs against temporary SQLite files or the in-memory backend,
//! so no Supabase project is needed.
//!
//! Run with:
//! ```sh
//! cargo test --test integration_test
//! ```

use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

use family_archive::backend::{Backend, Call, MemoryBackend, SqliteBackend};
use family_archive::export::{build_workbook, export_json, ExportError, TableData};
use family_archive::importer::{commit_bundle, commit_sheet, import_bundle, import_table, BATCH_SIZE};
use family_archive::parser::{FieldValue, Row};
use family_archive::preview::{preview_excel, preview_json, ImportPreview, PREVIEW_ROWS};
use family_archive::schema::tables::{ALL_TABLES, BRANCHES, LOCATIONS, NEWS, PERSONS};
use family_archive::schema::TableDescriptor;
use family_archive::ui::SilentUi;

// =============================================================================
// Test Configuration
// =============================================================================

/// Random seed for reproducible fixtures
const RANDOM_SEED: u64 = 42;

/// Fields the database fills in on its own
const MANAGED: &[&str] = &["created_at", "updated_at"];

// =============================================================================
// Fixtures
// =============================================================================

/// Archive content shared by the round-trip tests, generated once
static ARCHIVE: Lazy<TableData> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    let mut data = TableData::new();

    let branches: Vec<Row> = (1..=4)
        .map(|id| {
            row(&[
                ("id", FieldValue::Integer(id)),
                ("اسم_الفرع", FieldValue::Text(format!("فرع {}", id))),
                ("الوصف", FieldValue::Null),
            ])
        })
        .collect();

    let locations: Vec<Row> = (1..=6)
        .map(|id| {
            row(&[
                ("id", FieldValue::Integer(id)),
                ("اسم_الموقع", FieldValue::Text(format!("موقع {}", id))),
                ("خط_العرض", FieldValue::Real(rng.gen_range(16.0..32.0))),
                ("خط_الطول", FieldValue::Real(rng.gen_range(34.0..56.0))),
            ])
        })
        .collect();

    let persons: Vec<Row> = (1..=rng.gen_range(120..260))
        .map(|id| person(&mut rng, id))
        .collect();

    data.insert(BRANCHES.name.to_string(), branches);
    data.insert(LOCATIONS.name.to_string(), locations);
    data.insert(PERSONS.name.to_string(), persons);
    data
});

fn row(fields: &[(&str, FieldValue)]) -> Row {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn person(rng: &mut StdRng, id: i64) -> Row {
    let father = if id > 1 && rng.gen_bool(0.7) {
        FieldValue::Integer(rng.gen_range(1..id))
    } else {
        FieldValue::Null
    };

    row(&[
        ("id", FieldValue::Integer(id)),
        ("الاسم_الأول", FieldValue::Text(format!("شخص {}", id))),
        ("تاريخ_الميلاد", FieldValue::Text(format!("19{:02}-01-01", rng.gen_range(0..100)))),
        ("الأب_id", father),
        ("الفرع_id", FieldValue::Integer(rng.gen_range(1..=4))),
    ])
}

/// A SQLite database in a temporary file, removed when dropped
struct TestDatabase {
    _temp_file: NamedTempFile,
    backend: SqliteBackend,
}

impl TestDatabase {
    fn new() -> Self {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let backend = SqliteBackend::open(temp_file.path()).expect("Failed to open database");
        Self {
            _temp_file: temp_file,
            backend,
        }
    }

    fn seeded(data: &TableData) -> Self {
        let db = Self::new();
        for (table, rows) in data {
            db.backend
                .upsert(table, rows, "id", false)
                .expect("Failed to seed table");
        }
        db
    }

    /// Rows without the server-managed timestamps
    fn user_rows(&self, table: &TableDescriptor) -> Vec<Row> {
        self.backend
            .select_all(table.name)
            .expect("Failed to read table")
            .into_iter()
            .map(|mut r| {
                for field in MANAGED {
                    r.shift_remove(*field);
                }
                r
            })
            .collect()
    }
}

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
}

/// Write `data` as an xlsx file and return its path
fn write_workbook(dir: &TempDir, data: &TableData) -> PathBuf {
    let path = dir.path().join("upload.xlsx");
    let bytes = build_workbook(data).expect("Failed to build workbook");
    std::fs::write(&path, bytes).expect("Failed to write workbook");
    path
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_json_round_trip_into_empty_database() {
    let source = TestDatabase::seeded(&ARCHIVE);
    let file = export_json(&source.backend, ALL_TABLES, fixed_now(), &mut SilentUi::new())
        .expect("Export failed");
    assert_eq!(file.file_name, "family-tree-export-2024-03-15.json");

    let bundle = preview_json(&file.text()).expect("Exported bundle must validate");
    assert_eq!(bundle.metadata.tables.len(), ALL_TABLES.len());

    let target = TestDatabase::new();
    let (report, inventory) =
        commit_bundle(&target.backend, bundle, &mut SilentUi::new()).expect("Import failed");

    assert_eq!(report.tables.len(), 3);
    for table in ALL_TABLES {
        assert_eq!(
            target.user_rows(table),
            source.user_rows(table),
            "rows differ for {}",
            table.name
        );
    }

    let persons = inventory
        .iter()
        .find(|t| t.table.name == PERSONS.name)
        .expect("persons in inventory");
    assert_eq!(persons.row_count as usize, ARCHIVE[PERSONS.name].len());
}

#[test]
fn test_import_twice_is_idempotent() {
    let source = TestDatabase::seeded(&ARCHIVE);
    let text = export_json(&source.backend, ALL_TABLES, fixed_now(), &mut SilentUi::new())
        .unwrap()
        .text();

    let target = TestDatabase::new();
    import_bundle(&target.backend, preview_json(&text).unwrap(), &mut SilentUi::new()).unwrap();
    let first: Vec<Vec<Row>> = ALL_TABLES.iter().map(|t| target.user_rows(t)).collect();

    import_bundle(&target.backend, preview_json(&text).unwrap(), &mut SilentUi::new()).unwrap();
    let second: Vec<Vec<Row>> = ALL_TABLES.iter().map(|t| target.user_rows(t)).collect();

    assert_eq!(first, second);
}

#[test]
fn test_reimport_overwrites_edited_rows() {
    let source = TestDatabase::seeded(&ARCHIVE);
    let text = export_json(&source.backend, &[&PERSONS], fixed_now(), &mut SilentUi::new())
        .unwrap()
        .text();

    source
        .backend
        .upsert(
            PERSONS.name,
            &[row(&[
                ("id", FieldValue::Integer(1)),
                ("الاسم_الأول", FieldValue::Text("معدل".into())),
            ])],
            "id",
            false,
        )
        .unwrap();

    import_bundle(&source.backend, preview_json(&text).unwrap(), &mut SilentUi::new()).unwrap();
    let restored = source.user_rows(&PERSONS);
    assert_eq!(restored[0]["الاسم_الأول"], FieldValue::Text("شخص 1".into()));
}

// =============================================================================
// Import behavior
// =============================================================================

#[test]
fn test_declared_but_absent_tables_are_skipped() {
    let text = format!(
        r#"{{
            "metadata": {{"exportDate": "2024-03-15T10:30:00.000Z", "version": "1.0", "tables": ["{}", "{}", "{}"]}},
            "data": {{
                "{}": [{{"id": 1, "اسم_الفرع": "الفرع الأول", "created_at": "2020-01-01"}}],
                "{}": []
            }}
        }}"#,
        BRANCHES.name, PERSONS.name, NEWS.name, BRANCHES.name, NEWS.name
    );

    let backend = MemoryBackend::new();
    let report = import_bundle(&backend, preview_json(&text).unwrap(), &mut SilentUi::new()).unwrap();

    assert_eq!(report.skipped, vec![PERSONS.name.to_string(), NEWS.name.to_string()]);
    assert_eq!(
        backend.calls(),
        vec![Call::Upsert {
            table: BRANCHES.name.to_string(),
            rows: 1
        }]
    );
    let stored = backend.rows(BRANCHES.name);
    assert!(!stored[0].contains_key("created_at"));
}

#[test]
fn test_batch_partition_for_random_sizes() {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);

    for _ in 0..10 {
        let total: usize = rng.gen_range(1..=450);
        let rows: Vec<Row> = (1..=total as i64).map(|id| person(&mut rng, id)).collect();

        let backend = MemoryBackend::new();
        let batches = import_table(&backend, &PERSONS, rows, &mut SilentUi::new()).unwrap();
        let calls = backend.upsert_calls(PERSONS.name);

        assert_eq!(batches, total.div_ceil(BATCH_SIZE), "total {}", total);
        assert_eq!(calls.len(), batches);
        assert!(calls[..calls.len() - 1].iter().all(|&n| n == BATCH_SIZE));
        let last = if total % BATCH_SIZE == 0 { BATCH_SIZE } else { total % BATCH_SIZE };
        assert_eq!(*calls.last().unwrap(), last);
        assert_eq!(calls.iter().sum::<usize>(), total);
    }
}

#[test]
fn test_server_managed_fields_never_reach_backend() {
    let rows: Vec<Row> = (1..=3)
        .map(|id| {
            row(&[
                ("id", FieldValue::Integer(id)),
                ("العنوان", FieldValue::Text("خبر".into())),
                ("تاريخ_الإنشاء", FieldValue::Text("2020-01-01".into())),
                ("تاريخ_التحديث", FieldValue::Text("2020-01-02".into())),
                ("created_at", FieldValue::Text("2020-01-01".into())),
                ("updated_at", FieldValue::Text("2020-01-02".into())),
            ])
        })
        .collect();

    let backend = MemoryBackend::new();
    import_table(&backend, &NEWS, rows, &mut SilentUi::new()).unwrap();

    for stored in backend.rows(NEWS.name) {
        assert_eq!(stored.keys().collect::<Vec<_>>(), vec!["id", "العنوان"]);
    }
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_bundle_without_metadata_is_rejected() {
    let err = preview_json(r#"{"foo": 1}"#).unwrap_err();
    assert!(err.to_string().starts_with("تنسيق البيانات غير صالح"));
}

#[test]
fn test_export_with_empty_selection_issues_no_calls() {
    let backend = MemoryBackend::new();
    let err = export_json(&backend, &[], fixed_now(), &mut SilentUi::new()).unwrap_err();

    assert!(matches!(err, ExportError::EmptySelection));
    assert!(backend.calls().is_empty());
}

// =============================================================================
// Spreadsheets
// =============================================================================

#[test]
fn test_excel_preview_shows_at_most_five_rows() {
    let dir = TempDir::new().unwrap();
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);

    for total in [3, PREVIEW_ROWS, rng.gen_range(6..60)] {
        let mut data = TableData::new();
        data.insert(
            PERSONS.name.to_string(),
            (1..=total as i64).map(|id| person(&mut rng, id)).collect(),
        );
        let path = write_workbook(&dir, &data);

        match preview_excel(&path).unwrap() {
            ImportPreview::Excel { sample, total_rows } => {
                assert_eq!(total_rows, total);
                assert_eq!(sample.len(), total.min(PREVIEW_ROWS));
                assert_eq!(sample[0]["id"], FieldValue::Integer(1));
            }
            other => panic!("unexpected preview {:?}", other),
        }
    }
}

#[test]
fn test_excel_import_into_database() {
    let dir = TempDir::new().unwrap();
    let mut rows: Vec<Row> = ARCHIVE[PERSONS.name].clone();
    for r in &mut rows {
        r.insert("created_at".into(), FieldValue::Text("1999-01-01".into()));
    }
    let mut data = TableData::new();
    data.insert(PERSONS.name.to_string(), rows);
    let path = write_workbook(&dir, &data);

    let target = TestDatabase::new();
    let (report, inventory) =
        commit_sheet(&target.backend, Some(PERSONS.name), &path, &mut SilentUi::new()).unwrap();

    let expected = ARCHIVE[PERSONS.name].len();
    assert_eq!(report.total_rows(), expected);
    assert_eq!(report.tables[0].batches, expected.div_ceil(BATCH_SIZE));

    let persons = inventory.iter().find(|t| t.table.name == PERSONS.name).unwrap();
    assert_eq!(persons.row_count as usize, expected);

    let stored = target.backend.select_all(PERSONS.name).unwrap();
    assert!(stored
        .iter()
        .all(|r| r.get("created_at") != Some(&FieldValue::Text("1999-01-01".into()))));
    assert_eq!(stored[0]["الاسم_الأول"], FieldValue::Text("شخص 1".into()));
}
