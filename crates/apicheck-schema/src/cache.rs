//! Per-build document cache.
//!
//! Keyed by canonical absolute path so that `./models/user.yaml` reached
//! from the spec file and `./user.yaml` reached from a sibling model file
//! share one entry. Failed loads are remembered too: a broken file is
//! reported once, not once per reference into it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use apicheck_core::{is_spec_file, load_document};
use serde_json::Value;

/// Loaded documents of one module build.
#[derive(Debug, Default)]
pub struct DocumentCache {
    documents: HashMap<PathBuf, Option<Arc<Value>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical form of `path`, or `None` if it does not exist.
    pub fn canonical(path: &Path) -> Option<PathBuf> {
        std::fs::canonicalize(path).ok()
    }

    /// Insert an already-parsed document under its canonical path, or
    /// under `path` itself when nothing exists on disk there.
    pub fn insert(&mut self, path: &Path, document: Value) -> Arc<Value> {
        let key = Self::canonical(path).unwrap_or_else(|| path.to_path_buf());
        let document = Arc::new(document);
        self.documents.insert(key, Some(Arc::clone(&document)));
        document
    }

    /// Return the document at `path`, loading it on first access.
    ///
    /// `None` if the file does not exist or failed to load.
    pub fn get_or_load(&mut self, path: &Path) -> Option<Arc<Value>> {
        if let Some(entry) = self.documents.get(path) {
            return entry.clone();
        }
        let key = Self::canonical(path)?;
        self.documents
            .entry(key)
            .or_insert_with_key(|key| load_document(key).map(Arc::new))
            .clone()
    }

    /// Eagerly load every spec-format file directly inside `dir`.
    ///
    /// Returns how many documents loaded successfully. A missing directory
    /// loads nothing.
    pub fn preload_dir(&mut self, dir: &Path) -> usize {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "no model directory to preload");
                return 0;
            }
        };

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_spec_file(path))
            .collect();
        files.sort();

        files
            .iter()
            .filter(|path| self.get_or_load(path).is_some())
            .count()
    }

    /// Number of paths seen, including failed loads.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether `path` is cached (loaded or failed).
    pub fn contains(&self, path: &Path) -> bool {
        Self::canonical(path).is_some_and(|key| self.documents.contains_key(&key))
    }
}
