//! SQLite-backed [`VectorStore`].
//!
//! Records of one collection live in the `records` table (see
//! [`migrate`](crate::migrate)). Embeddings are stored as little-endian
//! `f32` blobs and nearest-neighbor search decodes every vector of the
//! collection and ranks by cosine distance in Rust, the same brute-force
//! scan the in-memory store does. Fine for a personal writing corpus.

use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::path::Path;

use voiceprint_core::embedding::{blob_to_vec, cosine_distance, vec_to_blob};
use voiceprint_core::filter::MetadataFilter;
use voiceprint_core::models::{ChunkMetadata, IndexRecord, QueryHit, StoredRecord};
use voiceprint_core::store::{check_dimensions, rank_hits, VectorStore};
use voiceprint_core::{Error, Result};

use crate::{db, migrate};

pub struct SqliteStore {
    pool: SqlitePool,
    collection: String,
}

fn sql_err(context: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
    move |e| Error::storage_with(context.to_string(), e)
}

fn decode_metadata(json: &str) -> Result<ChunkMetadata> {
    serde_json::from_str(json).map_err(|e| Error::storage_with("corrupt record metadata", e))
}

impl SqliteStore {
    /// Open the database at `path`, run migrations and bind to `collection`.
    pub async fn open(path: &Path, collection: &str) -> Result<Self> {
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self::with_pool(pool, collection))
    }

    pub fn with_pool(pool: SqlitePool, collection: &str) -> Self {
        Self {
            pool,
            collection: collection.to_string(),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn existing_dims(&self) -> Result<Option<usize>> {
        let dims: Option<i64> =
            sqlx::query_scalar("SELECT dims FROM records WHERE collection = ? LIMIT 1")
                .bind(&self.collection)
                .fetch_optional(&self.pool)
                .await
                .map_err(sql_err("failed to read collection dimension"))?;
        Ok(dims.map(|d| d as usize))
    }

    async fn upsert_records(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        records: &[IndexRecord],
    ) -> Result<()> {
        for record in records {
            let metadata_json = serde_json::to_string(&record.metadata)
                .map_err(|e| Error::storage_with("failed to encode record metadata", e))?;
            sqlx::query(
                r#"
                INSERT INTO records (collection, id, text, metadata_json, embedding, dims)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    text = excluded.text,
                    metadata_json = excluded.metadata_json,
                    embedding = excluded.embedding,
                    dims = excluded.dims
                "#,
            )
            .bind(&self.collection)
            .bind(&record.id)
            .bind(&record.text)
            .bind(metadata_json)
            .bind(vec_to_blob(&record.embedding))
            .bind(record.embedding.len() as i64)
            .execute(&mut **tx)
            .await
            .map_err(sql_err("failed to insert record"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn insert(&self, records: Vec<IndexRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        check_dimensions(self.existing_dims().await?, &records)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(sql_err("failed to begin transaction"))?;
        self.upsert_records(&mut tx, &records).await?;
        tx.commit()
            .await
            .map_err(sql_err("failed to commit records"))
    }

    async fn delete_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM records WHERE collection = ?")
            .bind(&self.collection)
            .execute(&self.pool)
            .await
            .map_err(sql_err("failed to clear collection"))?;
        Ok(())
    }

    async fn replace_all(&self, records: Vec<IndexRecord>) -> Result<()> {
        check_dimensions(None, &records)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(sql_err("failed to begin transaction"))?;
        sqlx::query("DELETE FROM records WHERE collection = ?")
            .bind(&self.collection)
            .execute(&mut *tx)
            .await
            .map_err(sql_err("failed to clear collection"))?;
        self.upsert_records(&mut tx, &records).await?;
        tx.commit()
            .await
            .map_err(sql_err("failed to commit replacement"))
    }

    async fn delete_matching(&self, filter: &MetadataFilter) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(sql_err("failed to begin transaction"))?;

        let rows = sqlx::query("SELECT seq, metadata_json FROM records WHERE collection = ?")
            .bind(&self.collection)
            .fetch_all(&mut *tx)
            .await
            .map_err(sql_err("failed to scan records"))?;

        let mut doomed = Vec::new();
        for row in &rows {
            let metadata = decode_metadata(row.get("metadata_json"))?;
            if filter.matches(&metadata) {
                doomed.push(row.get::<i64, _>("seq"));
            }
        }

        for seq in &doomed {
            sqlx::query("DELETE FROM records WHERE seq = ?")
                .bind(seq)
                .execute(&mut *tx)
                .await
                .map_err(sql_err("failed to delete record"))?;
        }

        tx.commit()
            .await
            .map_err(sql_err("failed to commit deletion"))?;
        Ok(doomed.len())
    }

    async fn get_all(&self) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            "SELECT id, text, metadata_json FROM records WHERE collection = ? ORDER BY seq",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(sql_err("failed to read records"))?;

        rows.iter()
            .map(|row| {
                Ok(StoredRecord {
                    id: row.get("id"),
                    text: row.get("text"),
                    metadata: decode_metadata(row.get("metadata_json"))?,
                })
            })
            .collect()
    }

    async fn ids(&self) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT id FROM records WHERE collection = ? ORDER BY seq")
            .bind(&self.collection)
            .fetch_all(&self.pool)
            .await
            .map_err(sql_err("failed to read record ids"))
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await
            .map_err(sql_err("failed to count records"))?;
        Ok(count as usize)
    }

    async fn nearest(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryHit>> {
        if let Some(d) = self.existing_dims().await? {
            if d != query.len() {
                return Err(Error::storage(format!(
                    "query dimension {} does not match collection dimension {}",
                    query.len(),
                    d
                )));
            }
        }

        // Fetch all vectors and compute cosine distance in Rust
        let rows = sqlx::query(
            "SELECT id, text, metadata_json, embedding FROM records WHERE collection = ?",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(sql_err("failed to scan records"))?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let metadata = decode_metadata(row.get("metadata_json"))?;
            if filter.is_some_and(|f| !f.matches(&metadata)) {
                continue;
            }
            let blob: Vec<u8> = row.get("embedding");
            hits.push(QueryHit {
                id: row.get("id"),
                text: row.get("text"),
                metadata,
                distance: cosine_distance(query, &blob_to_vec(&blob)),
            });
        }

        Ok(rank_hits(hits, k))
    }
}
