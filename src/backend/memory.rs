use indexmap::IndexMap;
use std::cell::RefCell;

use super::{Backend, BackendError};
use crate::parser::Row;

/// A backend call, as recorded by [`MemoryBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Count(String),
    SelectAll(String),
    Upsert { table: String, rows: usize },
}

#[derive(Debug, Clone)]
enum Failure {
    Count(String),
    Select(String),
    /// Fail the nth (1-based) upsert against a table
    Upsert { table: String, nth: usize },
}

/// In-process tables keyed by primary key, with a log of every call.
///
/// Unknown tables behave as empty tables. Useful for dry runs and for
/// checking exactly which requests an operation issued.
#[derive(Default)]
pub struct MemoryBackend {
    tables: RefCell<IndexMap<String, IndexMap<String, Row>>>,
    calls: RefCell<Vec<Call>>,
    failures: RefCell<Vec<Failure>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table without recording a call
    pub fn with_rows(self, table: &str, key: &str, rows: Vec<Row>) -> Self {
        {
            let mut tables = self.tables.borrow_mut();
            let stored = tables.entry(table.to_string()).or_default();
            for row in rows {
                let id = row.get(key).map(|v| v.to_string()).unwrap_or_default();
                stored.insert(id, row);
            }
        }
        self
    }

    pub fn fail_count(&self, table: &str) {
        self.failures
            .borrow_mut()
            .push(Failure::Count(table.to_string()));
    }

    pub fn fail_select(&self, table: &str) {
        self.failures
            .borrow_mut()
            .push(Failure::Select(table.to_string()));
    }

    pub fn fail_upsert(&self, table: &str, nth: usize) {
        self.failures.borrow_mut().push(Failure::Upsert {
            table: table.to_string(),
            nth,
        });
    }

    /// Stored rows of a table, in first-insert order
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .borrow()
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn upsert_calls(&self, table: &str) -> Vec<usize> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Upsert { table: t, rows } if t == table => Some(*rows),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Backend for MemoryBackend {
    fn count(&self, table: &str) -> Result<u64, BackendError> {
        self.record(Call::Count(table.to_string()));
        let failing = self
            .failures
            .borrow()
            .iter()
            .any(|f| matches!(f, Failure::Count(t) if t == table));
        if failing {
            return Err(BackendError::api(table, "count failed"));
        }
        Ok(self.tables.borrow().get(table).map_or(0, |t| t.len() as u64))
    }

    fn select_all(&self, table: &str) -> Result<Vec<Row>, BackendError> {
        self.record(Call::SelectAll(table.to_string()));
        let failing = self
            .failures
            .borrow()
            .iter()
            .any(|f| matches!(f, Failure::Select(t) if t == table));
        if failing {
            return Err(BackendError::api(table, "permission denied for table"));
        }
        Ok(self.rows(table))
    }

    fn upsert(
        &self,
        table: &str,
        rows: &[Row],
        conflict_key: &str,
        ignore_duplicates: bool,
    ) -> Result<(), BackendError> {
        self.record(Call::Upsert {
            table: table.to_string(),
            rows: rows.len(),
        });
        let nth = self.upsert_calls(table).len();
        let failing = self
            .failures
            .borrow()
            .iter()
            .any(|f| matches!(f, Failure::Upsert { table: t, nth: n } if t == table && *n == nth));
        if failing {
            return Err(BackendError::api(table, format!("batch {} rejected", nth)));
        }

        // A batch is all or nothing, so every key is checked before any write
        let keyed = rows
            .iter()
            .map(|row| {
                row.get(conflict_key)
                    .filter(|v| !v.is_null())
                    .map(|id| (id.to_string(), row))
                    .ok_or_else(|| {
                        BackendError::api(table, format!("null value in column \"{}\"", conflict_key))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = self.tables.borrow_mut();
        let stored = tables.entry(table.to_string()).or_default();
        for (id, row) in keyed {
            match stored.get_mut(&id) {
                Some(_) if ignore_duplicates => {}
                // Only the supplied columns are overwritten
                Some(existing) => {
                    for (column, value) in row {
                        existing.insert(column.clone(), value.clone());
                    }
                }
                None => {
                    stored.insert(id, row.clone());
                }
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FieldValue;

    fn row(id: i64) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), FieldValue::Integer(id));
        row
    }

    #[test]
    fn test_records_calls() {
        let backend = MemoryBackend::new();
        backend.upsert("t", &[row(1), row(2)], "id", false).unwrap();
        assert_eq!(backend.count("t").unwrap(), 2);
        assert_eq!(
            backend.calls(),
            vec![
                Call::Upsert { table: "t".into(), rows: 2 },
                Call::Count("t".into()),
            ]
        );
    }

    #[test]
    fn test_nth_upsert_fails() {
        let backend = MemoryBackend::new();
        backend.fail_upsert("t", 2);
        assert!(backend.upsert("t", &[row(1)], "id", false).is_ok());
        assert!(backend.upsert("t", &[row(2)], "id", false).is_err());
        assert_eq!(backend.rows("t").len(), 1);
    }

    #[test]
    fn test_missing_conflict_key_rejects_whole_batch() {
        let backend = MemoryBackend::new();
        let mut keyless = Row::new();
        keyless.insert("name".into(), FieldValue::Text("x".into()));
        assert!(backend.upsert("t", &[row(1), keyless], "id", false).is_err());
        assert!(backend.rows("t").is_empty());
    }

    #[test]
    fn test_conflict_merges_supplied_columns() {
        let mut original = row(1);
        original.insert("name".into(), FieldValue::Text("old".into()));
        original.insert("note".into(), FieldValue::Text("kept".into()));
        let backend = MemoryBackend::new().with_rows("t", "id", vec![original]);

        let mut update = row(1);
        update.insert("name".into(), FieldValue::Text("new".into()));
        backend.upsert("t", &[update], "id", false).unwrap();

        let stored = backend.rows("t");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["name"], FieldValue::Text("new".into()));
        assert_eq!(stored[0]["note"], FieldValue::Text("kept".into()));
    }

    #[test]
    fn test_ignore_duplicates_keeps_existing_row() {
        let mut original = row(1);
        original.insert("name".into(), FieldValue::Text("old".into()));
        let backend = MemoryBackend::new().with_rows("t", "id", vec![original]);

        let mut update = row(1);
        update.insert("name".into(), FieldValue::Text("new".into()));
        backend.upsert("t", &[update, row(2)], "id", true).unwrap();

        let stored = backend.rows("t");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["name"], FieldValue::Text("old".into()));
    }
}
