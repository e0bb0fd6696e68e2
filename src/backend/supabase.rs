use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{Backend, BackendError};
use crate::parser::Row;

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    code: Option<String>,
}

/// Supabase tables reached through the PostgREST endpoint (`/rest/v1`)
pub struct SupabaseBackend {
    client: Client,
    base: Url,
}

impl SupabaseBackend {
    pub fn new(project_url: &str, api_key: &str) -> Result<Self, BackendError> {
        let base = Url::parse(project_url)
            .map_err(|e| BackendError::Unavailable(format!("invalid Supabase URL: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::Unavailable(format!(
                "invalid Supabase URL: {}",
                project_url
            )));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| BackendError::Unavailable("invalid Supabase API key".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| BackendError::Unavailable("invalid Supabase API key".to_string()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .user_agent("family-archive")
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base })
    }

    fn table_url(&self, table: &str) -> Url {
        table_url(&self.base, table)
    }

    fn send(
        &self,
        table: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<Response, BackendError> {
        let response = request.send().map_err(|source| BackendError::Transport {
            table: table.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(BackendError::api(table, describe_failure(status, &body)))
    }
}

impl Backend for SupabaseBackend {
    fn count(&self, table: &str) -> Result<u64, BackendError> {
        let request = self
            .client
            .head(self.table_url(table))
            .query(&[("select", "*")])
            .header("Prefer", "count=exact");
        let response = self.send(table, request)?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| BackendError::api(table, "response carried no row count"))
    }

    fn select_all(&self, table: &str) -> Result<Vec<Row>, BackendError> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")]);
        let response = self.send(table, request)?;

        response.json().map_err(|source| BackendError::Transport {
            table: table.to_string(),
            source,
        })
    }

    fn upsert(
        &self,
        table: &str,
        rows: &[Row],
        conflict_key: &str,
        ignore_duplicates: bool,
    ) -> Result<(), BackendError> {
        let resolution = if ignore_duplicates {
            "resolution=ignore-duplicates,return=minimal"
        } else {
            "resolution=merge-duplicates,return=minimal"
        };

        let request = self
            .client
            .post(self.table_url(table))
            .query(&[
                ("on_conflict", conflict_key.to_string()),
                ("columns", union_columns(rows)),
            ])
            .header("Prefer", resolution)
            .json(rows);
        self.send(table, request)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("supabase {}", self.base)
    }
}

fn table_url(base: &Url, table: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(["rest", "v1", table]);
    }
    url
}

/// Total from a `Content-Range` header: `0-24/312` or `*/0`
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

/// Quoted union of the keys of every row, first-seen order.
/// Lets PostgREST accept batches whose rows do not share one key set.
fn union_columns(rows: &[Row]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for key in rows.iter().flat_map(|r| r.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }
    columns
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(",")
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    let Ok(err) = serde_json::from_str::<ApiError>(body) else {
        return if body.trim().is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, body.trim())
        };
    };

    let mut parts = Vec::new();
    if let Some(code) = err.code {
        parts.push(format!("[{}]", code));
    }
    parts.push(err.message.unwrap_or_else(|| status.to_string()));
    if let Some(details) = err.details {
        parts.push(details);
    }
    if let Some(hint) = err.hint {
        parts.push(format!("({})", hint));
    }
    parts.join(" ")
}
