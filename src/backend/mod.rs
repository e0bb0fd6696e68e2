//! Access to the database that owns the archive tables.
//!
//! Every operation takes a `&dyn Backend`; nothing holds a global client.
//! A missing configuration is a [`Connection::Unavailable`] value that the
//! caller must turn into an error with [`Connection::require`].

pub mod memory;
pub mod schema_gen;
pub mod sqlite;
pub mod supabase;

pub use memory::*;
pub use sqlite::*;
pub use supabase::*;

use thiserror::Error;

use crate::config::Settings;
use crate::parser::Row;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend client not initialized: {0}")]
    Unavailable(String),
    #[error("{table}: {message}")]
    Api { table: String, message: String },
    #[error("{table}: transport error: {source}")]
    Transport {
        table: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{table}: {source}")]
    Sqlite {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl BackendError {
    pub fn api(table: &str, message: impl Into<String>) -> Self {
        BackendError::Api {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

/// The three capabilities the export/import facility needs from a database
pub trait Backend {
    /// Number of rows currently in `table`
    fn count(&self, table: &str) -> Result<u64, BackendError>;

    /// Every row of `table`, unpaginated
    fn select_all(&self, table: &str) -> Result<Vec<Row>, BackendError>;

    /// Insert `rows`, resolving conflicts on `conflict_key`.
    /// With `ignore_duplicates = false` a conflicting row is overwritten.
    fn upsert(
        &self,
        table: &str,
        rows: &[Row],
        conflict_key: &str,
        ignore_duplicates: bool,
    ) -> Result<(), BackendError>;

    /// Short label for logs
    fn describe(&self) -> String;
}

/// A backend that may not be configured
pub enum Connection {
    Available(Box<dyn Backend>),
    Unavailable(String),
}

impl Connection {
    /// Pick a backend from settings: a local SQLite file wins over Supabase
    pub fn from_settings(settings: &Settings) -> Self {
        if let Some(path) = &settings.sqlite_path {
            return match SqliteBackend::open(path) {
                Ok(backend) => Connection::Available(Box::new(backend)),
                Err(e) => Connection::Unavailable(format!("{:?}: {}", path, e)),
            };
        }

        match (&settings.supabase_url, &settings.supabase_key) {
            (Some(url), Some(key)) => match SupabaseBackend::new(url, key) {
                Ok(backend) => Connection::Available(Box::new(backend)),
                Err(e) => Connection::Unavailable(e.to_string()),
            },
            _ => Connection::Unavailable(
                "set SUPABASE_URL and SUPABASE_ANON_KEY, or pass --sqlite".to_string(),
            ),
        }
    }

    pub fn require(&self) -> Result<&dyn Backend, BackendError> {
        match self {
            Connection::Available(backend) => Ok(backend.as_ref()),
            Connection::Unavailable(reason) => Err(BackendError::Unavailable(reason.clone())),
        }
    }
}
