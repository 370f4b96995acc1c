//! Corpus ingestion: files → chunks → index.
//!
//! [`process_directory`] walks the configured corpus root, chunks every
//! file that matches the include globs and records per-file read failures
//! without aborting the batch. [`run_ingest`] then replaces each
//! document's records in the index; [`run_chunk`] stops after chunking
//! and writes the chunks as JSON.
//!
//! Files are visited in sorted relative-path order so repeated runs
//! produce the same chunk sequence. A document is keyed by its path
//! relative to the corpus root (with `/` separators), so same-named files
//! in different subdirectories stay separate documents. Title, tags and
//! content type still come from the bare file name.

use anyhow::{bail, Context};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use voiceprint_core::chunk::Chunker;
use voiceprint_core::metadata::extract_metadata;
use voiceprint_core::models::Chunk;
use voiceprint_core::{Error, Result};

use crate::config::{Config, CorpusConfig};
use crate::index::{open_index, SimilarityIndex};

/// Chunks produced from one corpus file.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub path: PathBuf,
    /// Corpus-relative path; the replacement key in the index.
    pub source_file: String,
    pub chunks: Vec<Chunk>,
}

/// A file that could not be processed.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of processing a corpus directory.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<ProcessedDocument>,
    pub failures: Vec<FileFailure>,
}

impl IngestReport {
    pub fn chunk_count(&self) -> usize {
        self.documents.iter().map(|d| d.chunks.len()).sum()
    }

    /// All chunks in document order.
    pub fn into_chunks(self) -> Vec<Chunk> {
        self.documents.into_iter().flat_map(|d| d.chunks).collect()
    }
}

/// Read and chunk a single file. Metadata comes from the file name.
pub fn process_file(chunker: &Chunker, path: &Path) -> Result<Vec<Chunk>> {
    let name = file_name(path);
    process_file_as(chunker, path, &name)
}

/// Like [`process_file`], but records `source_file` as the chunks' source.
pub fn process_file_as(chunker: &Chunker, path: &Path, source_file: &str) -> Result<Vec<Chunk>> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    // Same line endings on every platform.
    let text = text.replace("\r\n", "\n");
    let mut metadata = extract_metadata(&file_name(path));
    metadata.source_file = source_file.to_string();
    Ok(chunker.chunk(&text, &metadata))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Corpus-relative key with `/` separators.
fn source_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Chunk every matching file under `corpus.root`.
///
/// Fails only on configuration problems (missing root, bad glob). Per-file
/// read errors are logged and collected in [`IngestReport::failures`].
pub fn process_directory(chunker: &Chunker, corpus: &CorpusConfig) -> Result<IngestReport> {
    let root = &corpus.root;
    if !root.is_dir() {
        return Err(Error::config(format!(
            "corpus root does not exist: {}",
            root.display()
        )));
    }

    let include_set = build_globset(&corpus.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string(), "**/.*".to_string()];
    default_excludes.extend(corpus.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&default_excludes)?;

    let mut report = IngestReport::default();
    let mut matched: Vec<(String, PathBuf)> = Vec::new();

    for entry in WalkDir::new(root).follow_links(corpus.follow_symlinks) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                report.failures.push(FileFailure {
                    error: Error::FileRead {
                        path: path.clone(),
                        source: e.into(),
                    },
                    path,
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = source_key(relative);

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        matched.push((rel_str, path.to_path_buf()));
    }

    // Sort for deterministic ordering
    matched.sort();

    for (rel_str, path) in matched {
        match process_file_as(chunker, &path, &rel_str) {
            Ok(chunks) => {
                debug!(file = %rel_str, chunks = chunks.len(), "chunked");
                report.documents.push(ProcessedDocument {
                    path,
                    source_file: rel_str,
                    chunks,
                });
            }
            Err(error) => {
                warn!(file = %rel_str, error = %error, "skipping file");
                report.failures.push(FileFailure { path, error });
            }
        }
    }

    Ok(report)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::config(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::config(format!("invalid glob set: {}", e)))
}

fn process_corpus(config: &Config) -> anyhow::Result<IngestReport> {
    let chunker = Chunker::new(config.chunking)?;
    let report = process_directory(&chunker, &config.corpus)
        .with_context(|| format!("Failed to process corpus {}", config.corpus.root.display()))?;
    info!(
        files = report.documents.len(),
        failed = report.failures.len(),
        chunks = report.chunk_count(),
        "processed corpus"
    );
    Ok(report)
}

/// Chunk the corpus and index every document.
///
/// Each document replaces whatever the index held for its corpus path. With
/// `dry_run` nothing is embedded; only counts are printed.
pub async fn run_ingest(config: &Config, dry_run: bool) -> anyhow::Result<()> {
    let report = process_corpus(config)?;

    if dry_run {
        println!("ingest (dry-run)");
        println!("  files found: {}", report.documents.len() + report.failures.len());
        println!("  files failed: {}", report.failures.len());
        println!("  chunks: {}", report.chunk_count());
        return Ok(());
    }

    if !config.embedding.is_enabled() {
        bail!("Ingest requires embeddings. Set [embedding] provider in config, or use --dry-run.");
    }

    let index = open_index(config).await?;
    let documents = report.documents.len();
    let failures = report.failures.len();
    let chunks_written = index_documents(&index, report.documents).await?;

    println!("ingest {}", index.name());
    println!("  documents: {}", documents);
    println!("  files failed: {}", failures);
    println!("  chunks written: {}", chunks_written);
    println!("ok");
    Ok(())
}

/// Replace each document's records in `index`, in order. Returns the
/// number of chunks written.
pub async fn index_documents(
    index: &SimilarityIndex,
    documents: Vec<ProcessedDocument>,
) -> anyhow::Result<usize> {
    let mut chunks_written = 0usize;
    for doc in documents {
        let ids = index
            .replace_source(&doc.source_file, doc.chunks)
            .await
            .with_context(|| format!("Failed to index {}", doc.path.display()))?;
        chunks_written += ids.len();
    }
    Ok(chunks_written)
}

/// Chunk the corpus and write `[{text, metadata}]` JSON to `output` or stdout.
pub fn run_chunk(config: &Config, output: Option<&Path>) -> anyhow::Result<()> {
    let report = process_corpus(config)?;
    let chunks = report.into_chunks();
    let json = serde_json::to_string_pretty(&chunks)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(chunks = chunks.len(), path = %path.display(), "wrote chunks");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}
