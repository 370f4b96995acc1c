//! Error taxonomy shared by the chunking and indexing pipeline.
//!
//! Chunking-level failures ([`Error::FileRead`]) are isolated per file by
//! the caller. Indexing-level failures abort the current call and are
//! surfaced unmodified; nothing in this crate retries.

use std::path::PathBuf;

/// Boxed source error carried by provider and storage variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A corpus file could not be read. Non-fatal to a batch.
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The embedding provider failed (network, auth, malformed response).
    #[error("embedding provider error: {message}")]
    EmbeddingProvider {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The storage engine or the persisted collection file failed.
    #[error("index storage error: {message}")]
    IndexStorage {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Invalid chunking parameters, filter keys, or provider settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The text-generation collaborator failed.
    #[error("generation error: {message}")]
    Generation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl Error {
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingProvider {
            message: message.into(),
            source: None,
        }
    }

    pub fn embedding_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::EmbeddingProvider {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::IndexStorage {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::IndexStorage {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            source: None,
        }
    }

    pub fn generation_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Generation {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Short machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::FileRead { .. } => "file_read",
            Error::EmbeddingProvider { .. } => "embedding_provider",
            Error::IndexStorage { .. } => "index_storage",
            Error::Configuration(_) => "configuration",
            Error::Generation { .. } => "generation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_read_message_names_path() {
        let err = Error::FileRead {
            path: PathBuf::from("/corpus/missing.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/corpus/missing.txt"));
        assert!(msg.contains("no such file"));
        assert_eq!(err.code(), "file_read");
    }

    #[test]
    fn test_source_is_chained() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::storage_with("write failed", io);
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "disk full");
    }
}
