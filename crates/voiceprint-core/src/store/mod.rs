//! Storage abstraction for indexed records.
//!
//! The [`VectorStore`] trait is the similarity storage engine: a collection
//! keyed by record id supporting insert, delete, full scan and
//! nearest-neighbor lookup with an optional metadata filter. The indexing
//! algorithm behind it is up to the implementation.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::filter::MetadataFilter;
use crate::models::{IndexRecord, QueryHit, StoredRecord};

/// Abstract similarity storage engine.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](VectorStore::insert) | Upsert records by id |
/// | [`delete_all`](VectorStore::delete_all) | Remove every record |
/// | [`replace_all`](VectorStore::replace_all) | Swap the whole collection in one step |
/// | [`delete_matching`](VectorStore::delete_matching) | Remove records matching a filter |
/// | [`get_all`](VectorStore::get_all) | All records, in insertion order, without embeddings |
/// | [`ids`](VectorStore::ids) | All record ids |
/// | [`count`](VectorStore::count) | Number of records |
/// | [`nearest`](VectorStore::nearest) | Top-k by ascending cosine distance |
///
/// Every vector in one collection has the same dimension; inserting a
/// vector of another dimension fails with [`Error::IndexStorage`].
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert records, replacing any existing record with the same id.
    async fn insert(&self, records: Vec<IndexRecord>) -> Result<()>;

    /// Remove every record.
    async fn delete_all(&self) -> Result<()>;

    /// Replace the whole collection with `records`. Either every old record
    /// is gone and every new one is stored, or nothing changes.
    async fn replace_all(&self, records: Vec<IndexRecord>) -> Result<()>;

    /// Remove records whose metadata matches `filter`; returns how many.
    async fn delete_matching(&self, filter: &MetadataFilter) -> Result<usize>;

    /// Every record in insertion order, without embeddings.
    async fn get_all(&self) -> Result<Vec<StoredRecord>>;

    /// Every record id.
    async fn ids(&self) -> Result<Vec<String>>;

    /// Number of records.
    async fn count(&self) -> Result<usize>;

    /// The `k` records closest to `query`, nearest first.
    ///
    /// Ties are broken by id so results are deterministic.
    async fn nearest(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryHit>>;
}

/// Check that all `records` share one dimension, and that it matches
/// `existing` when the collection already holds vectors.
pub fn check_dimensions(existing: Option<usize>, records: &[IndexRecord]) -> Result<Option<usize>> {
    let mut dims = existing;
    for record in records {
        match dims {
            None => dims = Some(record.embedding.len()),
            Some(d) if d != record.embedding.len() => {
                return Err(Error::storage(format!(
                    "embedding dimension mismatch for record {}: expected {}, got {}",
                    record.id,
                    d,
                    record.embedding.len()
                )));
            }
            Some(_) => {}
        }
    }
    Ok(dims)
}

/// Sort candidate hits nearest-first (ties by id) and keep the first `k`.
pub fn rank_hits(mut hits: Vec<QueryHit>, k: usize) -> Vec<QueryHit> {
    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(k);
    hits
}
