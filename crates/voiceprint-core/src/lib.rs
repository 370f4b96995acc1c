//! # Voiceprint Core
//!
//! Runtime-free logic for Voiceprint: data models, filename metadata,
//! paragraph chunking, metadata filters, the storage and provider traits,
//! and the prompt contract.
//!
//! This crate contains no tokio, sqlx, filesystem walking, or network
//! code. Concrete providers and the SQLite store live in the `voiceprint`
//! app crate.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod generation;
pub mod metadata;
pub mod models;
pub mod store;
pub mod style;

pub use error::{Error, Result};
