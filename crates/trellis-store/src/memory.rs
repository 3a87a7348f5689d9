//! In-memory store backend
//!
//! Reference implementation of [`Store`] used by tests and local
//! development. Collections are created on first write; records keep
//! creation order.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use crate::types::{Filter, Page, Record};

/// Process-local store keeping every collection in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Collection name to ordered records
    collections: DashMap<String, Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|records| records.len())
            .unwrap_or(0)
    }

    fn matching(&self, collection: &str, filters: &[Filter]) -> Vec<Record> {
        self.collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| filters.iter().all(|f| f.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create(&self, collection: &str, data: Value) -> StoreResult<String> {
        if !data.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4().to_string(),
            data,
            created_at: now,
            updated_at: now,
        };
        let id = record.id.clone();

        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(record);

        debug!("Created {}/{}", collection, id);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|records| records.iter().find(|r| r.id == id).cloned()))
    }

    async fn list(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Record>> {
        Ok(self.matching(collection, filters))
    }

    async fn update(&self, collection: &str, id: &str, partial: Value) -> StoreResult<()> {
        let partial = match partial {
            Value::Object(map) => map,
            _ => return Err(StoreError::NotAnObject),
        };

        let mut records =
            self.collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        if let Value::Object(data) = &mut record.data {
            for (key, value) in partial {
                data.insert(key, value);
            }
        }
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        if let Some(mut records) = self.collections.get_mut(collection) {
            records.retain(|r| r.id != id);
        }
        Ok(())
    }

    async fn paginate(
        &self,
        collection: &str,
        filters: &[Filter],
        page_size: usize,
        cursor: Option<&str>,
    ) -> StoreResult<Page> {
        let matching = self.matching(collection, filters);

        let start = match cursor {
            Some(cursor_id) => {
                let position = matching
                    .iter()
                    .position(|r| r.id == cursor_id)
                    .ok_or_else(|| StoreError::InvalidCursor(cursor_id.to_string()))?;
                position + 1
            }
            None => 0,
        };

        let remaining = &matching[start.min(matching.len())..];
        let records: Vec<Record> = remaining.iter().take(page_size).cloned().collect();
        let has_more = remaining.len() > page_size;
        let next_cursor = if has_more {
            records.last().map(|r| r.id.clone())
        } else {
            None
        };

        Ok(Page {
            records,
            has_more,
            next_cursor,
        })
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: f64,
    ) -> StoreResult<()> {
        let mut records =
            self.collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let current = match record.field(field) {
            None | Some(Value::Null) => 0.0,
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(_) => return Err(StoreError::NotANumber(field.to_string())),
        };

        let next = current + delta;
        let value = if next.fract() == 0.0 && next.abs() < i64::MAX as f64 {
            Value::from(next as i64)
        } else {
            Value::from(next)
        };

        if let Value::Object(data) = &mut record.data {
            data.insert(field.to_string(), value);
        }
        record.updated_at = Utc::now();
        Ok(())
    }
}
