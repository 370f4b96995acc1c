//! Core data models used throughout Voiceprint.
//!
//! These types represent the documents, chunks, index records, and query
//! hits that flow through the chunking and retrieval pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Coarse category of a document, guessed from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Essay,
    Reflection,
    Podcast,
    Newsletter,
    General,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Essay,
        ContentType::Reflection,
        ContentType::Podcast,
        ContentType::Newsletter,
        ContentType::General,
    ];

    /// Classify a base file name by case-insensitive substring match.
    ///
    /// Precedence: `essay`, `reflection`, `podcast`, then `substack` or
    /// `newsletter` (both map to [`ContentType::Newsletter`]). No match
    /// yields [`ContentType::General`].
    pub fn from_base_name(base_name: &str) -> Self {
        let lower = base_name.to_lowercase();
        if lower.contains("essay") {
            ContentType::Essay
        } else if lower.contains("reflection") {
            ContentType::Reflection
        } else if lower.contains("podcast") {
            ContentType::Podcast
        } else if lower.contains("substack") || lower.contains("newsletter") {
            ContentType::Newsletter
        } else {
            ContentType::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Essay => "essay",
            ContentType::Reflection => "reflection",
            ContentType::Podcast => "podcast",
            ContentType::Newsletter => "newsletter",
            ContentType::General => "general",
        }
    }

    /// Parse a label such as `"essay"`; unknown labels are a configuration error.
    pub fn parse(label: &str) -> Result<Self> {
        ContentType::ALL
            .iter()
            .copied()
            .find(|ct| ct.as_str() == label)
            .ok_or_else(|| {
                Error::config(format!(
                    "unknown content type '{}'. Must be essay, reflection, podcast, newsletter, or general",
                    label
                ))
            })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata derived from a document's file name, shared by all its chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub tags: Vec<String>,
    pub content_type: ContentType,
    pub source_file: String,
}

/// Per-chunk metadata as stored in the index and in the collection file.
///
/// `content_type` is optional only so hand-edited collection files without
/// it still load; the chunker always sets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    pub source_file: String,
    pub chunk_id: usize,
    pub word_count: usize,
}

impl ChunkMetadata {
    pub fn for_chunk(doc: &DocumentMetadata, chunk_id: usize, word_count: usize) -> Self {
        Self {
            title: doc.title.clone(),
            tags: doc.tags.clone(),
            content_type: Some(doc.content_type),
            source_file: doc.source_file.clone(),
            chunk_id,
            word_count,
        }
    }

    /// Content-type label used for grouping; `"unknown"` when absent.
    pub fn content_type_label(&self) -> &'static str {
        self.content_type.map(|ct| ct.as_str()).unwrap_or("unknown")
    }
}

/// A contiguous run of paragraphs from one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A chunk plus its embedding and identifier, as handed to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

/// The persisted form of a record. Embeddings are regenerated on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// One nearest-neighbor result. Lower `distance` is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

/// Record counts for a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total_count: usize,
    pub counts_by_content_type: BTreeMap<String, usize>,
}

impl CollectionStats {
    pub fn from_records<'a, I>(metadata: I) -> Self
    where
        I: IntoIterator<Item = &'a ChunkMetadata>,
    {
        let mut stats = CollectionStats::default();
        for meta in metadata {
            stats.total_count += 1;
            *stats
                .counts_by_content_type
                .entry(meta.content_type_label().to_string())
                .or_insert(0) += 1;
        }
        stats
    }
}
