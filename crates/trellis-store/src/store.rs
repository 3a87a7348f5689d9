//! # Store trait
//!
//! Boundary to the platform's document database. Collections hold JSON
//! records keyed by server-assigned ids; all timestamps are assigned by
//! the store.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;
use crate::types::{Filter, Page, Record};

/// Generic CRUD/query collaborator
#[async_trait]
pub trait Store: Send + Sync {
    /// Create a record; returns the new id
    async fn create(&self, collection: &str, data: Value) -> StoreResult<String>;

    /// Fetch a record by id
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Record>>;

    /// List records matching every filter, in creation order
    async fn list(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Record>>;

    /// Shallow-merge a partial object into a record's data
    async fn update(&self, collection: &str, id: &str, partial: Value) -> StoreResult<()>;

    /// Delete a record; deleting an absent record is a no-op
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Page through records matching the filters
    ///
    /// `cursor` is the id of the last record of the previous page.
    async fn paginate(
        &self,
        collection: &str,
        filters: &[Filter],
        page_size: usize,
        cursor: Option<&str>,
    ) -> StoreResult<Page>;

    /// Atomically add `delta` to a numeric field
    ///
    /// A missing field is treated as zero; a non-numeric field is an
    /// error.
    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: f64,
    ) -> StoreResult<()>;
}
