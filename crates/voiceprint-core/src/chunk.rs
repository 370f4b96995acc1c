//! Paragraph-boundary text chunker.
//!
//! Splits document text into [`Chunk`]s whose word count stays near a
//! configurable `chunk_size`. Splitting happens only on paragraph
//! boundaries (one or more blank lines) so each chunk reads as a coherent
//! passage of the author's prose.
//!
//! # Algorithm
//!
//! 1. Split text on blank lines and drop whitespace-only paragraphs.
//!    Kept paragraphs are not trimmed, so indentation survives.
//! 2. Accumulate paragraphs into a buffer with a running word count.
//! 3. When the next paragraph would push the count past `chunk_size` and
//!    the buffer is non-empty, flush the buffer as a chunk.
//! 4. With overlap enabled, the next buffer starts with the last paragraph
//!    of the flushed one (only if it held more than one paragraph).
//! 5. Flush whatever remains at the end.
//!
//! `chunk_size` is a soft limit: a paragraph is never split, so a single
//! long paragraph becomes its own oversized chunk. The overlap value is
//! only checked for being non-zero.
//!
//! # Example
//!
//! ```rust
//! use voiceprint_core::chunk::{Chunker, ChunkerConfig};
//! use voiceprint_core::metadata::extract_metadata;
//!
//! let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//! let meta = extract_metadata("notes.txt");
//! let chunks = chunker.chunk("Hello world.\n\nSecond paragraph.", &meta);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].metadata.chunk_id, 0);
//! assert_eq!(chunks[0].metadata.word_count, 4);
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Chunk, ChunkMetadata, DocumentMetadata};

pub const DEFAULT_CHUNK_SIZE: usize = 750;
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

/// Chunking parameters, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<()> {
        // Overlap is an on/off switch, so any value is accepted.
        if self.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be > 0"));
        }
        Ok(())
    }
}

/// Splits document text into word-bounded, paragraph-aligned chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk `text`, stamping every chunk with `doc` plus its index and
    /// word count.
    ///
    /// # Guarantees
    ///
    /// - Chunk ids are contiguous: `0, 1, 2, …, N-1`.
    /// - A document with no non-blank paragraphs yields no chunks.
    /// - Output depends only on `text`, `doc` and the configuration.
    pub fn chunk(&self, text: &str, doc: &DocumentMetadata) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        let mut pending_words = 0usize;

        for para in split_paragraphs(text) {
            let para_words = word_count(para);

            if pending_words + para_words > self.config.chunk_size && !pending.is_empty() {
                chunks.push(make_chunk(doc, chunks.len(), &pending, pending_words));

                if self.config.chunk_overlap > 0 && pending.len() > 1 {
                    let last = pending[pending.len() - 1];
                    pending.clear();
                    pending.push(last);
                    pending_words = word_count(last);
                } else {
                    pending.clear();
                    pending_words = 0;
                }
            }

            pending.push(para);
            pending_words += para_words;
        }

        if !pending.is_empty() {
            chunks.push(make_chunk(doc, chunks.len(), &pending, pending_words));
        }

        chunks
    }
}

fn paragraph_break() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid paragraph pattern"))
}

/// Split on blank lines, keeping every paragraph that has non-whitespace
/// content exactly as written.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    paragraph_break()
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .collect()
}

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn make_chunk(doc: &DocumentMetadata, index: usize, paragraphs: &[&str], words: usize) -> Chunk {
    Chunk {
        text: paragraphs.join("\n\n"),
        metadata: ChunkMetadata::for_chunk(doc, index, words),
    }
}
