use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use super::{DocRef, Document, DocumentStore, StoreError};

const SELECT_COLUMNS: &str = "id, data, created_at, updated_at";

/// How long a writer waits for another connection's write transaction to finish.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    data: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DocumentRow> for Document {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Document {
            id: row.id,
            data: serde_json::from_str(&row.data)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Document store keeping every collection in one SQLite table of JSON payloads.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the pool and applies migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("document store ready at {}", database_url);

        Ok(Self::new(pool))
    }

    /// Private in-memory database. A single connection that never expires, since
    /// every new SQLite connection to `:memory:` would see an empty database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("select 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM documents WHERE collection = ? ORDER BY created_at DESC, seq DESC"
        ))
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM documents WHERE collection = ? AND id = ?"
        ))
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Document::try_from)
        .transpose()
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM documents \
             WHERE collection = ? AND json_extract(data, ?) = ? \
             ORDER BY created_at DESC, seq DESC"
        ))
        .bind(collection)
        .bind(format!("$.{field}"))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn insert(&self, collection: &str, data: Map<String, Value>) -> Result<Document, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let (now, stamp) = now();
        let payload = serde_json::to_string(&data)?;

        sqlx::query(
            "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(collection)
        .bind(&id)
        .bind(payload)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?;

        debug!("inserted {}/{}", collection, id);

        Ok(Document {
            id,
            data,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let (_, stamp) = now();
        let payload = serde_json::to_string(&data)?;

        sqlx::query_as::<_, DocumentRow>(&format!(
            "UPDATE documents SET data = ?, updated_at = ? \
             WHERE collection = ? AND id = ? \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(payload)
        .bind(stamp)
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Document::try_from)
        .transpose()
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(result > 0)
    }

    async fn delete_with_dependents(
        &self,
        parent: &DocRef,
        dependents: &[DocRef],
    ) -> Result<Option<u64>, StoreError> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let mut deleted = delete_in(&mut tx, parent).await?;
        if deleted == 0 {
            tx.rollback().await?;
            debug!("{}/{} already gone, nothing deleted", parent.collection, parent.id);
            return Ok(None);
        }

        for doc in dependents {
            deleted += delete_in(&mut tx, doc).await?;
        }

        tx.commit().await?;
        debug!(
            "deleted {}/{} with {} of {} dependents",
            parent.collection,
            parent.id,
            deleted - 1,
            dependents.len()
        );

        Ok(Some(deleted))
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError> {
        self.modify(collection, id, |data| {
            let entry = data
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !entry.is_array() {
                *entry = Value::Array(Vec::new());
            }
            if let Value::Array(items) = entry {
                if !items.contains(&value) {
                    items.push(value);
                }
            }
        })
        .await
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        self.modify(collection, id, |data| data.extend(fields)).await
    }
}

impl SqliteStore {
    /// Read-modify-write of one document under a write lock taken up front.
    /// A deferred `BEGIN` would fail with "database is locked" when two writers
    /// race to upgrade their read locks.
    async fn modify<F>(&self, collection: &str, id: &str, apply: F) -> Result<Document, StoreError>
    where
        F: FnOnce(&mut Map<String, Value>) + Send,
    {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let existing = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM documents WHERE collection = ? AND id = ?"
        ))
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Document::try_from)
        .transpose()?;

        let (now, stamp) = now();

        let document = match existing {
            Some(mut doc) => {
                apply(&mut doc.data);

                sqlx::query(
                    "UPDATE documents SET data = ?, updated_at = ? WHERE collection = ? AND id = ?",
                )
                .bind(serde_json::to_string(&doc.data)?)
                .bind(&stamp)
                .bind(collection)
                .bind(id)
                .execute(&mut *tx)
                .await?;

                doc.updated_at = now;
                doc
            }
            None => {
                let mut data = Map::new();
                apply(&mut data);

                sqlx::query(
                    "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(collection)
                .bind(id)
                .bind(serde_json::to_string(&data)?)
                .bind(&stamp)
                .bind(&stamp)
                .execute(&mut *tx)
                .await?;

                Document {
                    id: id.to_string(),
                    data,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        tx.commit().await?;

        Ok(document)
    }
}

async fn delete_in(tx: &mut Transaction<'_, Sqlite>, doc: &DocRef) -> Result<u64, StoreError> {
    let affected = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
        .bind(doc.collection)
        .bind(&doc.id)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    Ok(affected)
}

fn now() -> (DateTime<Utc>, String) {
    let now = Utc::now();
    (now, now.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Parse RFC3339 timestamp
fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Timestamp(ts.to_string()))
}
