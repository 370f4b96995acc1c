//! In-memory [`VectorStore`] implementation for tests and ephemeral runs.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`, kept in insertion
//! order. Nearest-neighbor search is brute-force cosine distance over all
//! stored vectors.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::embedding::cosine_distance;
use crate::error::{Error, Result};
use crate::filter::MetadataFilter;
use crate::models::{IndexRecord, QueryHit, StoredRecord};

use super::{check_dimensions, rank_hits, VectorStore};

#[derive(Default)]
struct Inner {
    records: Vec<IndexRecord>,
    dims: Option<usize>,
}

/// In-memory store. Cloning is not supported; share it behind an `Arc`.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::storage("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::storage("in-memory store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert(records: &mut Vec<IndexRecord>, record: IndexRecord) {
    match records.iter_mut().find(|r| r.id == record.id) {
        Some(slot) => *slot = record,
        None => records.push(record),
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn insert(&self, records: Vec<IndexRecord>) -> Result<()> {
        let mut inner = self.write()?;
        let existing = if inner.records.is_empty() { None } else { inner.dims };
        inner.dims = check_dimensions(existing, &records)?;
        for record in records {
            upsert(&mut inner.records, record);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.records.clear();
        inner.dims = None;
        Ok(())
    }

    async fn replace_all(&self, records: Vec<IndexRecord>) -> Result<()> {
        let dims = check_dimensions(None, &records)?;
        let mut fresh = Vec::with_capacity(records.len());
        for record in records {
            upsert(&mut fresh, record);
        }

        let mut inner = self.write()?;
        inner.records = fresh;
        inner.dims = dims;
        Ok(())
    }

    async fn delete_matching(&self, filter: &MetadataFilter) -> Result<usize> {
        let mut inner = self.write()?;
        let before = inner.records.len();
        inner.records.retain(|r| !filter.matches(&r.metadata));
        Ok(before - inner.records.len())
    }

    async fn get_all(&self) -> Result<Vec<StoredRecord>> {
        Ok(self
            .read()?
            .records
            .iter()
            .map(|r| StoredRecord {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
            })
            .collect())
    }

    async fn ids(&self) -> Result<Vec<String>> {
        Ok(self.read()?.records.iter().map(|r| r.id.clone()).collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    async fn nearest(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryHit>> {
        let inner = self.read()?;
        if let Some(d) = inner.dims {
            if !inner.records.is_empty() && d != query.len() {
                return Err(Error::storage(format!(
                    "query dimension {} does not match collection dimension {}",
                    query.len(),
                    d
                )));
            }
        }
        let hits = inner
            .records
            .iter()
            .filter(|r| filter.map_or(true, |f| f.matches(&r.metadata)))
            .map(|r| QueryHit {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                distance: cosine_distance(query, &r.embedding),
            })
            .collect();
        Ok(rank_hits(hits, k))
    }
}
