//! Known field names of a query set, used to validate placeholders.
//!
//! Loads are tagged with a monotonically increasing token; only the result of
//! the most recently issued load may be applied, so a slow response for a
//! previously selected query set cannot overwrite a fresher one.
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::relevance::client::QuerySetSource;

/// Field names of the first query record, in document order, skipping
/// internal `_`-prefixed keys.
pub fn known_fields_from_query_set(query_set: &Value) -> AppResult<Vec<String>> {
    let queries = query_list(query_set)
        .ok_or_else(|| AppError::QuerySet("No query list found in query set".to_string()))?;
    let Some(first) = queries.first() else {
        return Ok(Vec::new());
    };
    let record = first
        .as_object()
        .ok_or_else(|| AppError::QuerySet("First query record is not an object".to_string()))?;
    Ok(record.keys().filter(|k| !k.starts_with('_')).cloned().collect())
}

fn query_list(v: &Value) -> Option<&Vec<Value>> {
    if let Some(arr) = v.as_array() {
        return Some(arr);
    }
    v.get("querySetQueries")
        .or_else(|| v.get("_source").and_then(|s| s.get("querySetQueries")))
        .or_else(|| v.pointer("/hits/hits/0/_source/querySetQueries"))
        .and_then(Value::as_array)
}

/// Ticket for one in-flight field load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLoadTicket {
    pub token: u64,
    pub query_set_id: Option<String>,
}

/// Outcome of a field load; `fields` is empty when the load failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLoad {
    pub token: u64,
    pub fields: Vec<String>,
}

#[derive(Debug, Default)]
pub struct KnownFieldLoader {
    issued: u64,
}

impl KnownFieldLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load for `query_set_id`, superseding every earlier ticket.
    pub fn begin(&mut self, query_set_id: Option<&str>) -> FieldLoadTicket {
        self.issued += 1;
        FieldLoadTicket {
            token: self.issued,
            query_set_id: query_set_id.map(str::to_string),
        }
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.issued
    }
}

/// Known fields of query set `id`. Never fails: any fetch or shape error is
/// logged and yields an empty field set, which leaves placeholders unconstrained.
pub async fn load_known_fields(source: &dyn QuerySetSource, id: &str) -> Vec<String> {
    match source.get_query_set(id).await.and_then(|qs| known_fields_from_query_set(&qs)) {
        Ok(fields) => {
            tracing::debug!(query_set = id, count = fields.len(), "Loaded known fields");
            fields
        }
        Err(e) => {
            tracing::warn!(query_set = id, "Failed to load query set fields: {}", e);
            Vec::new()
        }
    }
}

/// Resolve the fields for `ticket`; no query set means no fields.
pub async fn fetch_known_fields(source: &dyn QuerySetSource, ticket: &FieldLoadTicket) -> FieldLoad {
    let fields = match ticket.query_set_id.as_deref() {
        None => Vec::new(),
        Some(id) => load_known_fields(source, id).await,
    };
    FieldLoad { token: ticket.token, fields }
}
