//! Read-only access to the decision tree document.
//!
//! The document is opaque to the server: whatever JSON the author wrote is
//! returned byte for byte. The bytes are only checked for well-formedness,
//! never re-encoded, so large integers, `-0` and key order survive. The file
//! is read from disk on every call so edits show up on the next request
//! without a restart.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::IgnoredAny;
use tracing::debug;

use crate::error::TreeError;

/// Handle to the decision tree file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TreeStore {
    path: Arc<PathBuf>,
}

/// A tree file's contents, known to be well-formed JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDocument {
    bytes: Vec<u8>,
}

impl TreeDocument {
    /// Raw document bytes, exactly as stored on disk.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the document has no bytes. Never true for a parsed document.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short name of the top-level JSON value's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self.bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => "object",
            Some(b'[') => "array",
            Some(b'"') => "string",
            Some(b't') | Some(b'f') => "boolean",
            Some(b'n') => "null",
            _ => "number",
        }
    }

    /// Consume the document, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl TreeStore {
    /// Create a store reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    /// Path of the tree file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the tree document and check that it is well-formed JSON.
    pub async fn load(&self) -> Result<TreeDocument, TreeError> {
        let bytes = self.read().await?;
        self.check(&bytes)?;
        Ok(TreeDocument { bytes })
    }

    /// Read the raw bytes of the tree document.
    pub async fn read(&self) -> Result<Vec<u8>, TreeError> {
        let bytes = tokio::fs::read(self.path.as_path())
            .await
            .map_err(|source| TreeError::DataUnavailable {
                path: self.path.to_path_buf(),
                source,
            })?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "read decision tree");
        Ok(bytes)
    }

    fn check(&self, bytes: &[u8]) -> Result<(), TreeError> {
        serde_json::from_slice::<IgnoredAny>(bytes)
            .map(|_| ())
            .map_err(|source| TreeError::DataMalformed {
                path: self.path.to_path_buf(),
                source,
            })
    }
}
