//! `vp save`, `vp load` and `vp clear`: whole-collection operations.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::index::{open_index, open_index_without_embedder};

/// Write the collection to a JSON file.
pub async fn run_save(config: &Config, path: &Path) -> Result<()> {
    let index = open_index_without_embedder(config).await?;
    let count = index
        .persist(path)
        .await
        .with_context(|| format!("Failed to save collection to {}", path.display()))?;
    println!("Saved {} records to {}", count, path.display());
    Ok(())
}

/// Replace the collection with a saved file, re-embedding every record.
pub async fn run_load(config: &Config, path: &Path) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("'load' requires embeddings. Set [embedding] provider in config.");
    }
    let index = open_index(config).await?;
    let count = index
        .restore(path)
        .await
        .with_context(|| format!("Failed to load collection from {}", path.display()))?;
    println!("Loaded {} records from {}", count, path.display());
    Ok(())
}

pub async fn run_clear(config: &Config) -> Result<()> {
    let index = open_index_without_embedder(config).await?;
    index.clear().await?;
    println!("Cleared collection {}", index.name());
    Ok(())
}
