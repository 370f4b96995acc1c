#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use voiceprint::index::SimilarityIndex;
use voiceprint_core::chunk::{Chunker, ChunkerConfig};
use voiceprint_core::embedding::EmbeddingProvider;
use voiceprint_core::generation::Generator;
use voiceprint_core::metadata::extract_metadata;
use voiceprint_core::models::Chunk;
use voiceprint_core::store::memory::InMemoryStore;
use voiceprint_core::{Error, Result};

pub const DIMS: usize = 32;

/// Bag-of-words embedder: each lowercase word bumps one hashed bucket.
#[derive(Default)]
pub struct HashEmbedder {
    pub batch_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl HashEmbedder {
    pub fn embed(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMS];
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            let bucket = word
                .bytes()
                .fold(7u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32))
                as usize
                % DIMS;
            v[bucket] += 1.0;
        }
        v
    }

    pub fn calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-bow"
    }

    fn dims(&self) -> usize {
        DIMS
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::embedding("provider unavailable"));
        }
        Ok(texts.iter().map(|t| Self::embed(t)).collect())
    }
}

/// Generator that reports what it was given instead of calling a model.
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, context: &str, query: &str, style_hint: Option<&str>) -> Result<String> {
        let examples = context.matches("--- Example ").count();
        Ok(format!(
            "query={} examples={} style={}",
            query,
            examples,
            style_hint.unwrap_or("none")
        ))
    }
}

pub fn chunks(file_name: &str, text: &str) -> Vec<Chunk> {
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    chunker.chunk(text, &extract_metadata(file_name))
}

pub async fn memory_index() -> (SimilarityIndex, Arc<HashEmbedder>) {
    let embedder = Arc::new(HashEmbedder::default());
    let index = SimilarityIndex::open(
        "user_writings",
        embedder.clone(),
        Arc::new(InMemoryStore::new()),
    )
    .await
    .unwrap();
    (index, embedder)
}

/// A small corpus: two essays, a podcast and a newsletter.
pub async fn seeded_index() -> (SimilarityIndex, Arc<HashEmbedder>) {
    let (index, embedder) = memory_index().await;
    for (file, text) in [
        (
            "Essay - Gardens [nature].txt",
            "Tomatoes need sun and patience.\n\nMy garden taught me to wait.",
        ),
        (
            "Essay - Remote Work [work].txt",
            "Working from home changed my mornings.\n\nMeetings moved into the kitchen.",
        ),
        (
            "Podcast - Episode One.txt",
            "Welcome listeners to the first episode about cooking pasta.",
        ),
        (
            "Substack - March.txt",
            "This month in the newsletter: books, trains and rain.",
        ),
    ] {
        index.add(chunks(file, text)).await.unwrap();
    }
    (index, embedder)
}
