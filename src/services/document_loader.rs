//! Reads policy documents from a directory tree.
//!
//! Files are read lazily, one per call to [`Iterator::next`]. Entries are
//! visited in sorted path order so repeated runs produce the same sequence.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::RawDocument;

/// Loads textual documents with matching extensions below a root directory.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DocumentLoader {
    /// `extensions` are matched case-insensitively and may include a leading
    /// dot. An empty list means `["txt"]`.
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        let mut extensions: Vec<String> = extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if extensions.is_empty() {
            extensions.push("txt".to_string());
        }
        extensions.sort();
        extensions.dedup();

        Self {
            root: root.into(),
            extensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Start a walk. Fails immediately if the root is missing or not a
    /// directory; nothing else is read until the iterator is advanced.
    pub fn load(&self) -> DomainResult<DocumentIter> {
        let metadata = fs::metadata(&self.root)
            .map_err(|_| DomainError::SourceDirectoryNotFound(self.root.clone()))?;
        if !metadata.is_dir() {
            return Err(DomainError::SourceNotADirectory(self.root.clone()));
        }

        Ok(DocumentIter {
            root: self.root.clone(),
            extensions: self.extensions.clone(),
            stack: vec![self.root.clone()],
            skipped: 0,
        })
    }

    fn matches(extensions: &[String], path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    }
}

/// Lazy depth-first walk yielding one [`RawDocument`] per readable file.
#[derive(Debug)]
pub struct DocumentIter {
    root: PathBuf,
    extensions: Vec<String>,
    /// Paths still to visit; the next one is at the end.
    stack: Vec<PathBuf>,
    skipped: usize,
}

impl DocumentIter {
    /// Files skipped so far because they could not be read or decoded.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn push_children(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                return;
            }
        };

        let mut children: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        children.sort();
        self.stack.extend(children.into_iter().rev());
    }

    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn read(&self, path: &Path) -> DomainResult<RawDocument> {
        let bytes = fs::read(path).map_err(|e| DomainError::DocumentUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let text = String::from_utf8(bytes).map_err(|e| DomainError::DocumentUnreadable {
            path: path.to_path_buf(),
            reason: format!("invalid UTF-8: {e}"),
        })?;

        Ok(RawDocument::new(text, self.relative_path(path)))
    }
}

impl Iterator for DocumentIter {
    type Item = RawDocument;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.stack.pop() {
            if path.is_dir() {
                self.push_children(&path);
                continue;
            }
            if !DocumentLoader::matches(&self.extensions, &path) {
                continue;
            }

            match self.read(&path) {
                Ok(document) => {
                    debug!(source = %document.source_path, chars = document.char_len(), "Loaded document");
                    return Some(document);
                }
                Err(e) => {
                    self.skipped += 1;
                    warn!(path = %path.display(), error = %e, "Skipping document");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, relative: &str, contents: &[u8]) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_missing_root_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new(dir.path().join("missing"), &[]);
        assert!(matches!(loader.load(), Err(DomainError::SourceDirectoryNotFound(_))));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "policy.txt", b"text");
        let loader = DocumentLoader::new(dir.path().join("policy.txt"), &[]);
        assert!(matches!(loader.load(), Err(DomainError::SourceNotADirectory(_))));
    }

    #[test]
    fn test_empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let docs: Vec<_> = DocumentLoader::new(dir.path(), &[]).load().unwrap().collect();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_recursive_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b_provider.txt", b"B");
        write(dir.path(), "a_provider.TXT", b"A");
        write(dir.path(), "nested/c_provider.txt", b"C");
        write(dir.path(), "notes.md", b"ignored");
        write(dir.path(), "image.png", &[0x89, 0x50]);

        let docs: Vec<_> = DocumentLoader::new(dir.path(), &["txt".to_string()])
            .load()
            .unwrap()
            .collect();
        let paths: Vec<_> = docs.iter().map(|d| d.source_path.as_str()).collect();
        assert_eq!(paths, vec!["a_provider.TXT", "b_provider.txt", "nested/c_provider.txt"]);
        assert_eq!(docs[2].text, "C");
    }

    #[test]
    fn test_extension_normalization() {
        let loader = DocumentLoader::new("data", &[".MD".to_string(), "txt".to_string(), " ".to_string()]);
        assert_eq!(loader.extensions(), &["md".to_string(), "txt".to_string()]);
    }

    #[test]
    fn test_invalid_utf8_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.txt", &[0xff, 0xfe, 0xfd]);
        write(dir.path(), "good.txt", "Refunds within 14 days – café".as_bytes());

        let mut iter = DocumentLoader::new(dir.path(), &[]).load().unwrap();
        let docs: Vec<_> = iter.by_ref().collect();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_path, "good.txt");
        assert_eq!(iter.skipped(), 1);
    }
}
