//! Exact-match metadata filters for nearest-neighbor queries.
//!
//! A [`MetadataFilter`] is a conjunction of `field = value` conditions over
//! [`ChunkMetadata`]. Keys and values are validated when the filter is
//! built, so a typo in a filter key fails loudly instead of silently
//! matching nothing.
//!
//! ```rust
//! use voiceprint_core::filter::MetadataFilter;
//!
//! let filter = MetadataFilter::parse_pairs(["content_type=essay", "tags=ai,ethics"]).unwrap();
//! assert_eq!(filter.len(), 2);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{ChunkMetadata, ContentType};

/// A filterable metadata key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataField {
    Title,
    Tags,
    ContentType,
    SourceFile,
    ChunkId,
    WordCount,
}

impl MetadataField {
    pub fn parse(key: &str) -> Result<Self> {
        match key {
            "title" => Ok(MetadataField::Title),
            "tags" => Ok(MetadataField::Tags),
            "content_type" => Ok(MetadataField::ContentType),
            "source_file" => Ok(MetadataField::SourceFile),
            "chunk_id" => Ok(MetadataField::ChunkId),
            "word_count" => Ok(MetadataField::WordCount),
            other => Err(Error::config(format!(
                "unknown filter key '{}'. Must be title, tags, content_type, source_file, chunk_id, or word_count",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataField::Title => "title",
            MetadataField::Tags => "tags",
            MetadataField::ContentType => "content_type",
            MetadataField::SourceFile => "source_file",
            MetadataField::ChunkId => "chunk_id",
            MetadataField::WordCount => "word_count",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value to compare a field against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Tags(Vec<String>),
    ContentType(ContentType),
    Integer(usize),
}

/// Conjunction of exact-match conditions. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    conditions: BTreeMap<MetadataField, FilterValue>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, parsing `value` according to the field's type.
    pub fn with(mut self, field: MetadataField, value: &str) -> Result<Self> {
        let parsed = match field {
            MetadataField::Title | MetadataField::SourceFile => FilterValue::Text(value.to_string()),
            MetadataField::Tags => FilterValue::Tags(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            MetadataField::ContentType => FilterValue::ContentType(ContentType::parse(value)?),
            MetadataField::ChunkId | MetadataField::WordCount => {
                FilterValue::Integer(value.trim().parse().map_err(|_| {
                    Error::config(format!("filter '{}' expects an integer, got '{}'", field, value))
                })?)
            }
        };
        self.conditions.insert(field, parsed);
        Ok(self)
    }

    /// Only records from `source_file`.
    pub fn source_file(source_file: &str) -> Self {
        let mut filter = Self::new();
        filter.conditions.insert(
            MetadataField::SourceFile,
            FilterValue::Text(source_file.to_string()),
        );
        filter
    }

    /// Parse a single `key=value` pair.
    pub fn parse_pair(pair: &str) -> Result<(MetadataField, String)> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::config(format!("invalid filter '{}': expected key=value", pair)))?;
        Ok((MetadataField::parse(key.trim())?, value.to_string()))
    }

    /// Build a filter from `key=value` pairs.
    pub fn parse_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for pair in pairs {
            let (field, value) = Self::parse_pair(pair.as_ref())?;
            filter = filter.with(field, &value)?;
        }
        Ok(filter)
    }

    /// Build a filter from a JSON object such as `{"content_type": "essay"}`.
    ///
    /// String values are parsed like CLI values; numbers are accepted for
    /// integer fields and arrays of strings for `tags`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::config("filter must be a JSON object"))?;
        let mut filter = Self::new();
        for (key, v) in obj {
            let field = MetadataField::parse(key)?;
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|i| {
                        i.as_str().map(str::to_string).ok_or_else(|| {
                            Error::config(format!("filter '{}' array items must be strings", key))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
                    .join(","),
                other => {
                    return Err(Error::config(format!(
                        "unsupported value for filter '{}': {}",
                        key, other
                    )))
                }
            };
            filter = filter.with(field, &text)?;
        }
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn matches(&self, meta: &ChunkMetadata) -> bool {
        self.conditions.iter().all(|(field, value)| match (field, value) {
            (MetadataField::Title, FilterValue::Text(t)) => &meta.title == t,
            (MetadataField::SourceFile, FilterValue::Text(s)) => &meta.source_file == s,
            (MetadataField::Tags, FilterValue::Tags(tags)) => &meta.tags == tags,
            (MetadataField::ContentType, FilterValue::ContentType(ct)) => {
                meta.content_type == Some(*ct)
            }
            (MetadataField::ChunkId, FilterValue::Integer(n)) => meta.chunk_id == *n,
            (MetadataField::WordCount, FilterValue::Integer(n)) => meta.word_count == *n,
            _ => false,
        })
    }
}

/// Serialized form used in HTTP requests: a flat JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(pub serde_json::Map<String, serde_json::Value>);

impl FilterSpec {
    pub fn into_filter(self) -> Result<MetadataFilter> {
        MetadataFilter::from_json(&serde_json::Value::Object(self.0))
    }
}
