//! Filename metadata extraction.
//!
//! Corpus files carry their metadata in the name:
//!
//! ```text
//! Essay - Future of AI [education, tech].txt
//! └────── title ─────┘ └──── tags ────┘
//! ```
//!
//! The content type is guessed from keywords anywhere in the base name
//! (see [`ContentType::from_base_name`]).
//!
//! # Example
//!
//! ```rust
//! use voiceprint_core::metadata::extract_metadata;
//! use voiceprint_core::models::ContentType;
//!
//! let meta = extract_metadata("Essay - Future of AI [education, tech].txt");
//! assert_eq!(meta.title, "Essay - Future of AI");
//! assert_eq!(meta.tags, vec!["education", "tech"]);
//! assert_eq!(meta.content_type, ContentType::Essay);
//! ```

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{ContentType, DocumentMetadata};

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.*?)\s*\[(.*?)\]").expect("valid tag pattern"))
}

/// Strip the final extension, keeping names like `.notes` intact.
fn base_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Derive title, tags and content type from a file name.
///
/// Only the first bracketed segment is read as tags; empty tag items are
/// dropped. Without brackets the whole base name is the title.
pub fn extract_metadata(file_name: &str) -> DocumentMetadata {
    let base = base_name(file_name);

    let (title, tags) = match tag_pattern().captures(base) {
        Some(caps) => {
            let title = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let tags = caps
                .get(2)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            (title.to_string(), tags)
        }
        None => (base.to_string(), Vec::new()),
    };

    DocumentMetadata {
        title,
        tags,
        content_type: ContentType::from_base_name(base),
        source_file: file_name.to_string(),
    }
}
