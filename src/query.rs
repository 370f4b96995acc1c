//! `vp query` and `vp draft`: retrieval from the command line.

use anyhow::{bail, Result};

use voiceprint_core::filter::MetadataFilter;
use voiceprint_core::models::QueryHit;

use crate::assistant::WritingAssistant;
use crate::config::Config;
use crate::generation::create_generator;
use crate::index::open_index;
use std::sync::Arc;

fn require_embeddings(config: &Config, command: &str) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!(
            "'{}' requires embeddings. Set [embedding] provider in config.",
            command
        );
    }
    Ok(())
}

fn parse_filter(filters: &[String]) -> Result<Option<MetadataFilter>> {
    let filter = MetadataFilter::parse_pairs(filters)?;
    Ok((!filter.is_empty()).then_some(filter))
}

/// Print the `k` nearest chunks for `text`.
pub async fn run_query(config: &Config, text: &str, k: Option<usize>, filters: &[String]) -> Result<()> {
    if text.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }
    require_embeddings(config, "query")?;
    let filter = parse_filter(filters)?;

    let index = open_index(config).await?;
    let k = k.unwrap_or(config.generation.top_k);
    let hits = index.query(text, k, filter.as_ref()).await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    print_hits(&hits);
    Ok(())
}

fn print_hits(hits: &[QueryHit]) {
    for (i, hit) in hits.iter().enumerate() {
        let title = if hit.metadata.title.is_empty() {
            "(untitled)"
        } else {
            hit.metadata.title.as_str()
        };
        println!(
            "{}. [{:.3}] {} / {}",
            i + 1,
            hit.distance,
            hit.metadata.content_type_label(),
            title
        );
        println!("    source: {} (chunk {})", hit.metadata.source_file, hit.metadata.chunk_id);
        if !hit.metadata.tags.is_empty() {
            println!("    tags: {}", hit.metadata.tags.join(", "));
        }
        println!("    excerpt: \"{}\"", excerpt(&hit.text, 240));
        println!("    id: {}", hit.id);
        println!();
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat.to_string(),
    }
}

/// Draft text in the corpus author's voice and print it with its sources.
pub async fn run_draft(
    config: &Config,
    text: &str,
    k: Option<usize>,
    style: Option<&str>,
    filters: &[String],
) -> Result<()> {
    if text.trim().is_empty() {
        bail!("draft request must not be empty");
    }
    require_embeddings(config, "draft")?;
    let filter = parse_filter(filters)?;

    let index = Arc::new(open_index(config).await?);
    let generator = create_generator(&config.generation)?;
    let assistant = WritingAssistant::new(index, generator, config.generation.top_k);
    let draft = assistant.draft(text, k, filter.as_ref(), style).await?;

    println!("{}", draft.text.trim_end());
    println!();
    if let Some(hint) = &draft.style_hint {
        println!("--- Style: {} ---", hint);
    }
    println!("--- Sources ({}) ---", draft.sources.len());
    for hit in &draft.sources {
        println!("  [{:.3}] {} ({})", hit.distance, hit.metadata.title, hit.id);
    }
    Ok(())
}
