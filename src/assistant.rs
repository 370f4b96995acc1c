//! Retrieval-augmented drafting.
//!
//! [`WritingAssistant::draft`] retrieves the closest examples of the
//! user's own writing, renders them as a context block and asks the
//! configured [`Generator`] for a new piece in the same voice.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use voiceprint_core::filter::MetadataFilter;
use voiceprint_core::generation::{format_context, Generator};
use voiceprint_core::models::QueryHit;
use voiceprint_core::style::extract_style_hint;
use voiceprint_core::Result;

use crate::index::SimilarityIndex;

/// Generated text plus the examples it was conditioned on.
#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub text: String,
    pub style_hint: Option<String>,
    pub sources: Vec<QueryHit>,
}

pub struct WritingAssistant {
    index: Arc<SimilarityIndex>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl WritingAssistant {
    pub fn new(index: Arc<SimilarityIndex>, generator: Arc<dyn Generator>, top_k: usize) -> Self {
        Self {
            index,
            generator,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Draft a response to `query`.
    ///
    /// `k` overrides the configured example count. An explicit `style`
    /// wins over a hint embedded in the query text.
    pub async fn draft(
        &self,
        query: &str,
        k: Option<usize>,
        filter: Option<&MetadataFilter>,
        style: Option<&str>,
    ) -> Result<Draft> {
        let k = k.unwrap_or(self.top_k);
        let sources = self.index.query(query, k, filter).await?;
        let context = format_context(&sources);

        let style_hint = style
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| extract_style_hint(query));

        debug!(
            examples = sources.len(),
            style = style_hint.as_deref().unwrap_or(""),
            model = self.generator.model_name(),
            "drafting"
        );
        let text = self
            .generator
            .generate(&context, query, style_hint.as_deref())
            .await?;

        Ok(Draft {
            text,
            style_hint,
            sources,
        })
    }
}
