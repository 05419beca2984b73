pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp '{0}'")]
    Timestamp(String),
}

/// A stored document: the store-assigned id and timestamps plus the schema-less payload.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Address of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocRef {
    pub collection: &'static str,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: &'static str, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

/// Collections of JSON documents with store-assigned ids and timestamps.
///
/// Every method is a single round-trip. Multi-statement writes
/// (`delete_with_dependents`, `array_union`, `merge`) run in one transaction.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// All documents of a collection, newest first.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Documents whose top-level string `field` equals `value`, newest first.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError>;

    /// Writes a new document under a fresh id.
    async fn insert(&self, collection: &str, data: Map<String, Value>) -> Result<Document, StoreError>;

    /// Replaces the payload of an existing document. `None` when it does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError>;

    /// `false` when nothing was deleted.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Deletes `parent` and every dependent in one transaction. Returns `None`, with
    /// nothing deleted, when `parent` no longer exists.
    async fn delete_with_dependents(
        &self,
        parent: &DocRef,
        dependents: &[DocRef],
    ) -> Result<Option<u64>, StoreError>;

    /// Appends `value` to the array `field` of document `id` unless already present,
    /// creating the document when missing.
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError>;

    /// Overwrites the given top-level fields of document `id` and keeps the rest,
    /// creating the document when missing.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError>;
}
