//! # Voiceprint
//!
//! Retrieval-augmented drafting in your own voice.
//!
//! Voiceprint chunks a personal corpus of plain-text writing at paragraph
//! boundaries, tags every chunk with metadata taken from its file name,
//! indexes the chunks by embedding similarity and hands the closest
//! examples to a language model as style exemplars.
//!
//! The pure pieces (chunking, metadata, filters, prompt format, the store
//! trait and an in-memory store) live in `voiceprint-core`. This crate adds
//! the providers, the SQLite store, the index handle and the surfaces.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌───────────────────┐
//! │  corpus/    │──▶│   Chunker   │──▶│  SimilarityIndex  │
//! │  *.txt      │   │ + metadata  │   │ embed + store     │
//! └─────────────┘   └─────────────┘   └────────┬──────────┘
//!                                              │ top-k
//!                      ┌───────────────────────┤
//!                      ▼                       ▼
//!                 ┌──────────┐          ┌─────────────┐
//!                 │   CLI    │          │ HTTP server │
//!                 │   (vp)   │          │   (axum)    │
//!                 └──────────┘          └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! vp chunk --output chunks.json        # inspect chunking, no API calls
//! vp ingest                            # chunk, embed and index the corpus
//! vp query "remote work" --filter content_type=essay
//! vp draft "A newsletter intro about spring [make this more casual]"
//! vp serve                             # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding providers (OpenAI, Ollama) |
//! | [`generation`] | Generation providers (OpenAI, Anthropic) |
//! | [`db`] | SQLite connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | Durable vector store |
//! | [`index`] | The collection handle |
//! | [`ingest`] | Corpus walking and chunking |
//! | [`assistant`] | Retrieval-augmented drafting |
//! | [`query`] | `vp query` / `vp draft` output |
//! | [`collection`] | `vp save` / `vp load` / `vp clear` |
//! | [`stats`] | `vp stats` output |
//! | [`server`] | HTTP API |

pub mod assistant;
pub mod collection;
pub mod config;
pub mod db;
pub mod embedding;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod migrate;
pub mod query;
pub mod server;
pub mod sqlite_store;
pub mod stats;
