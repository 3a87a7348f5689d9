//! Store data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored record with server-assigned metadata
///
/// Timestamps are set by the store on create and update; callers never
/// supply them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Read a field of the record's data
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Query filter
///
/// The platform's queries are equality-only; richer operators belong to
/// the backing database, not this boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Eq { field, value } => record.field(field) == Some(value),
        }
    }
}

/// One page of a paginated query
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<Record>,
    pub has_more: bool,
    /// Cursor for the next page; present only when `has_more`
    pub next_cursor: Option<String>,
}
