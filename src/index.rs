//! The similarity index: an owned handle over one collection.
//!
//! A [`SimilarityIndex`] ties an [`EmbeddingProvider`] to a
//! [`VectorStore`]. Chunks go in as text, get embedded in one batch per
//! call, and come back out through nearest-neighbor queries.
//!
//! # Record Ids
//!
//! Ids are `doc_<n>` from a monotonic counter. The counter starts past the
//! highest id already in the store and is advanced past every restored
//! id, so ids are never reused within a collection.
//!
//! # Concurrency
//!
//! Mutating calls (`add`, `replace_source`, `restore`, `clear`) hold an
//! async mutex for their whole duration. Queries do not take it and may
//! observe a write in progress.
//!
//! # Persistence
//!
//! [`persist`](SimilarityIndex::persist) writes a pretty-printed JSON array
//! of `{id, text, metadata}`. Embeddings are not saved;
//! [`restore`](SimilarityIndex::restore) re-embeds every text.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use voiceprint_core::embedding::{ensure_batch_len, EmbeddingProvider};
use voiceprint_core::filter::MetadataFilter;
use voiceprint_core::models::{Chunk, CollectionStats, IndexRecord, QueryHit, StoredRecord};
use voiceprint_core::store::memory::InMemoryStore;
use voiceprint_core::store::{check_dimensions, VectorStore};
use voiceprint_core::{Error, Result};

use crate::config::Config;
use crate::embedding::{create_provider, DisabledProvider};
use crate::sqlite_store::SqliteStore;

const ID_PREFIX: &str = "doc_";

pub struct SimilarityIndex {
    name: String,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    /// Next id number; guarded together with the write path.
    next_id: Mutex<u64>,
}

fn parse_id(id: &str) -> Option<u64> {
    id.strip_prefix(ID_PREFIX)?.parse().ok()
}

fn next_after<'a>(ids: impl IntoIterator<Item = &'a str>, floor: u64) -> u64 {
    ids.into_iter()
        .filter_map(parse_id)
        .map(|n| n + 1)
        .fold(floor, u64::max)
}

impl SimilarityIndex {
    /// Open a handle over `store`, seeding the id counter from its contents.
    pub async fn open(
        name: &str,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let ids = store.ids().await?;
        let next = next_after(ids.iter().map(String::as_str), 0);
        debug!(collection = name, records = ids.len(), next_id = next, "opened index");
        Ok(Self {
            name: name.to_string(),
            embedder,
            store,
            next_id: Mutex::new(next),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Embed and store `chunks`, returning their new ids in order.
    pub async fn add(&self, chunks: Vec<Chunk>) -> Result<Vec<String>> {
        let mut next_id = self.next_id.lock().await;
        self.add_locked(&mut *next_id, chunks).await
    }

    async fn add_locked(&self, next_id: &mut u64, chunks: Vec<Chunk>) -> Result<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        ensure_batch_len(&vectors, texts.len())?;

        let start = *next_id;
        let records: Vec<IndexRecord> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (chunk, embedding))| IndexRecord {
                id: format!("{}{}", ID_PREFIX, start + i as u64),
                text: chunk.text,
                metadata: chunk.metadata,
                embedding,
            })
            .collect();
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();

        self.store.insert(records).await?;
        *next_id = start + ids.len() as u64;

        debug!(collection = %self.name, added = ids.len(), "added chunks");
        Ok(ids)
    }

    /// Replace every record of `source_file` with `chunks`.
    ///
    /// Reprocessing a document is a full replacement. The old records are
    /// removed before the new ones are embedded, so an embedding failure
    /// leaves the document absent rather than duplicated.
    pub async fn replace_source(&self, source_file: &str, chunks: Vec<Chunk>) -> Result<Vec<String>> {
        let mut next_id = self.next_id.lock().await;
        let removed = self
            .store
            .delete_matching(&MetadataFilter::source_file(source_file))
            .await?;
        if removed > 0 {
            debug!(source_file, removed, "removed previous records");
        }
        self.add_locked(&mut *next_id, chunks).await
    }

    /// The `k` records nearest to `text`, optionally restricted by `filter`.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let filter = filter.filter(|f| !f.is_empty());
        let vector = self.embedder.embed_one(text).await?;
        self.store.nearest(&vector, k, filter).await
    }

    pub async fn stats(&self) -> Result<CollectionStats> {
        let records = self.store.get_all().await?;
        Ok(CollectionStats::from_records(
            records.iter().map(|r| &r.metadata),
        ))
    }

    /// Write every record as a JSON array to `path`.
    pub async fn persist(&self, path: &Path) -> Result<usize> {
        let records = self.store.get_all().await?;
        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| Error::storage_with("failed to encode collection", e))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::storage_with(format!("failed to create {}", parent.display()), e)
                })?;
            }
        }
        tokio::fs::write(path, json)
            .await
            .map_err(|e| Error::storage_with(format!("failed to write {}", path.display()), e))?;

        info!(collection = %self.name, records = records.len(), path = %path.display(), "saved collection");
        Ok(records.len())
    }

    /// Replace the collection with the contents of a persisted file.
    ///
    /// The file is parsed and re-embedded before anything is touched, and
    /// the swap itself is a single store operation, so a failed restore
    /// leaves the collection as it was.
    pub async fn restore(&self, path: &Path) -> Result<usize> {
        let mut next_id = self.next_id.lock().await;

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::storage_with(format!("failed to read {}", path.display()), e))?;
        let stored: Vec<StoredRecord> = serde_json::from_str(&content).map_err(|e| {
            Error::storage_with(format!("invalid collection file {}", path.display()), e)
        })?;

        let texts: Vec<String> = stored.iter().map(|r| r.text.clone()).collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&texts).await?
        };
        ensure_batch_len(&vectors, texts.len())?;

        let floor = next_after(stored.iter().map(|r| r.id.as_str()), *next_id);
        let records: Vec<IndexRecord> = stored
            .into_iter()
            .zip(vectors)
            .map(|(r, embedding)| IndexRecord {
                id: r.id,
                text: r.text,
                metadata: r.metadata,
                embedding,
            })
            .collect();
        let count = records.len();

        check_dimensions(None, &records)?;
        self.store.replace_all(records).await?;
        *next_id = floor;

        info!(collection = %self.name, records = count, path = %path.display(), "loaded collection");
        Ok(count)
    }

    /// Remove every record. The id counter is not reset.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.next_id.lock().await;
        self.store.delete_all().await?;
        info!(collection = %self.name, "cleared collection");
        Ok(())
    }
}

/// Build the store selected by `[index].backend`.
pub async fn open_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    match config.index.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "sqlite" => Ok(Arc::new(
            SqliteStore::open(&config.index.path, &config.index.collection).await?,
        )),
        other => Err(Error::config(format!("Unknown index backend: {}", other))),
    }
}

/// Open the configured collection with the configured embedding provider.
pub async fn open_index(config: &Config) -> Result<SimilarityIndex> {
    let embedder = create_provider(&config.embedding)?;
    let store = open_store(config).await?;
    SimilarityIndex::open(&config.index.collection, embedder, store).await
}

/// Open the configured collection for calls that never embed
/// (`stats`, `persist`, `clear`), so no API key is needed.
pub async fn open_index_without_embedder(config: &Config) -> Result<SimilarityIndex> {
    let store = open_store(config).await?;
    SimilarityIndex::open(&config.index.collection, Arc::new(DisabledProvider), store).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("doc_0"), Some(0));
        assert_eq!(parse_id("doc_42"), Some(42));
        assert_eq!(parse_id("chunk_3"), None);
        assert_eq!(parse_id("doc_x"), None);
    }

    #[test]
    fn test_next_after() {
        assert_eq!(next_after(["doc_0", "doc_7", "doc_3"], 0), 8);
        assert_eq!(next_after(["custom"], 5), 5);
        assert_eq!(next_after(std::iter::empty(), 0), 0);
        assert_eq!(next_after(["doc_2"], 10), 10);
    }
}
