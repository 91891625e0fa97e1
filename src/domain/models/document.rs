//! Source document model.

use serde::{Deserialize, Serialize};

/// A textual policy document as read from disk, one per source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Full decoded text of the file.
    pub text: String,

    /// Path of the file relative to the loader root, `/`-separated.
    pub source_path: String,
}

impl RawDocument {
    pub fn new(text: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_path: source_path.into(),
        }
    }

    /// Length of the document in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
