use rusqlite::Connection;
use std::path::{Path, PathBuf};

use super::schema_gen::{generate_create_table, generate_upsert, quote_ident};
use super::{Backend, BackendError};
use crate::parser::{FieldValue, Row};
use crate::schema::ALL_TABLES;

/// Local SQLite mirror of the archive tables
pub struct SqliteBackend {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Open (or create) a database file and make sure every registry table exists
    pub fn open(db_path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        let backend = Self {
            conn,
            path: Some(db_path.to_path_buf()),
        };
        backend.create_schema()?;
        Ok(backend)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let backend = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        backend.create_schema()?;
        Ok(backend)
    }

    /// Create all registry tables that do not exist yet
    pub fn create_schema(&self) -> rusqlite::Result<()> {
        for table in ALL_TABLES {
            self.conn.execute(&generate_create_table(table), [])?;
        }
        Ok(())
    }
}

fn sqlite_err(table: &str) -> impl FnOnce(rusqlite::Error) -> BackendError + '_ {
    move |source| BackendError::Sqlite {
        table: table.to_string(),
        source,
    }
}

impl Backend for SqliteBackend {
    fn count(&self, table: &str) -> Result<u64, BackendError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(sqlite_err(table))?;
        Ok(count.max(0) as u64)
    }

    fn select_all(&self, table: &str) -> Result<Vec<Row>, BackendError> {
        let sql = format!("SELECT * FROM {}", quote_ident(table));
        let mut stmt = self.conn.prepare(&sql).map_err(sqlite_err(table))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let rows = stmt
            .query_map([], |row| {
                let mut record = Row::with_capacity(columns.len());
                for (idx, name) in columns.iter().enumerate() {
                    record.insert(name.clone(), FieldValue::from(row.get_ref(idx)?));
                }
                Ok(record)
            })
            .map_err(sqlite_err(table))?;

        let records = rows.collect::<rusqlite::Result<Vec<_>>>();
        records.map_err(sqlite_err(table))
    }

    fn upsert(
        &self,
        table: &str,
        rows: &[Row],
        conflict_key: &str,
        ignore_duplicates: bool,
    ) -> Result<(), BackendError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(sqlite_err(table))?;

        for row in rows {
            let columns: Vec<&str> = row.keys().map(|k| k.as_str()).collect();
            let sql = generate_upsert(table, &columns, conflict_key, ignore_duplicates);
            let mut stmt = tx.prepare_cached(&sql).map_err(sqlite_err(table))?;

            for (idx, value) in row.values().enumerate() {
                value.bind_to(idx + 1, &mut stmt).map_err(sqlite_err(table))?;
            }
            stmt.raw_execute().map_err(sqlite_err(table))?;
        }

        tx.commit().map_err(sqlite_err(table))
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite {:?}", path),
            None => "sqlite (in memory)".to_string(),
        }
    }
}
