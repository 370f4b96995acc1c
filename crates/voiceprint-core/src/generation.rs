//! Text-generation trait and the prompt contract.
//!
//! The core only formats the context block and the request prompt; model
//! choice and transport belong to [`Generator`] implementations in the
//! `voiceprint` app crate.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::QueryHit;

/// A language model that drafts text from retrieved examples.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o"`).
    fn model_name(&self) -> &str;

    /// Draft a response to `query` in the voice shown by `context`.
    ///
    /// Makes a single upstream call; failures are
    /// [`Error::Generation`](crate::error::Error::Generation).
    async fn generate(&self, context: &str, query: &str, style_hint: Option<&str>)
        -> Result<String>;
}

/// Format retrieved hits as numbered examples.
///
/// Each hit renders as:
///
/// ```text
/// --- Example 1 (Content type: essay) ---
/// Title: Future of AI
///
/// <chunk text>
///
/// ```
pub fn format_context(hits: &[QueryHit]) -> String {
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let title = if hit.metadata.title.is_empty() {
            format!("Document {}", i + 1)
        } else {
            hit.metadata.title.clone()
        };
        out.push_str(&format!(
            "--- Example {} (Content type: {}) ---\n",
            i + 1,
            hit.metadata.content_type_label()
        ));
        out.push_str(&format!("Title: {}\n\n", title));
        out.push_str(&hit.text);
        out.push_str("\n\n");
    }
    out
}

/// Build the full prompt sent to the model.
pub fn build_prompt(context: &str, query: &str, style_hint: Option<&str>) -> String {
    let style_guidance = style_hint
        .map(|hint| format!("Style guidance: {}", hint))
        .unwrap_or_default();

    format!(
        "You are a writing assistant that mimics the style and voice of the user based on their previous writings.\n\
         Your goal is to generate new content that sounds authentically like the user wrote it.\n\
         \n\
         Here are relevant examples of the user's writing style:\n\
         \n\
         {context}\n\
         \n\
         Based on these examples, please write a response to the following request in the user's authentic voice:\n\
         \n\
         {query}\n\
         \n\
         {style_guidance}\n\
         \n\
         Remember to maintain the user's unique voice, vocabulary choices, sentence structures, and thematic preferences.\n"
    )
}
