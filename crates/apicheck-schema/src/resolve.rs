//! # Reference Resolution
//!
//! Dereferences OpenAPI `$ref` pointers across a graph of documents.
//!
//! Two reference shapes are understood:
//!
//! - intra-document: `#/components/schemas/User`, rooted at the document
//!   the reference was found in;
//! - cross-document: `./models/user.yaml#/components/schemas/User`, a path
//!   relative to the directory of the referring file plus a pointer into
//!   the target file. Without a `#` the whole target document is meant.
//!
//! Anything else (absolute paths, `http://` URLs) is unresolvable.
//!
//! ## File Context
//!
//! A pointer found inside a model file is relative to that model file, not
//! to the spec that pulled the model in. [`Resolver::resolve`] therefore
//! reports the file each resolved subtree came from, and
//! [`Resolver::resolve_tree`] continues walking in that file's context.
//!
//! ## Termination
//!
//! Reference chains are followed until the first non-reference node. A
//! chain that revisits a target is a cycle and resolves to nothing. During
//! full-tree resolution, a reference whose target is already being
//! expanded further up (a recursive schema such as a comment with
//! replies) is left in place and tagged with [`RECURSIVE_MARKER`], naming
//! the file and pointer it refers back to. A tagged node is never expanded
//! again, so resolving an already resolved tree changes nothing. Every
//! reference left in place is counted in [`Resolver::unresolved`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::cache::DocumentCache;

/// Member added to a reference node whose target encloses it.
pub const RECURSIVE_MARKER: &str = "x-recursive-ref";

/// A parsed `$ref` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `#/a/b`: a pointer into the current document.
    Local { pointer: &'a str },
    /// `./file.yaml#/a/b`: a relative file and a pointer into it.
    External { file: &'a str, pointer: &'a str },
}

impl<'a> Reference<'a> {
    /// Classify a raw `$ref` value. `None` if it has neither shape.
    pub fn parse(raw: &'a str) -> Option<Self> {
        if let Some(pointer) = raw.strip_prefix('#') {
            return Some(Self::Local { pointer });
        }
        let (file, pointer) = raw.split_once('#').unwrap_or((raw, ""));
        if file.is_empty() || file.contains("://") || Path::new(file).is_absolute() {
            return None;
        }
        Some(Self::External { file, pointer })
    }

    pub fn pointer(&self) -> &'a str {
        match self {
            Self::Local { pointer } | Self::External { pointer, .. } => *pointer,
        }
    }
}

/// The `$ref` string of a reference node.
///
/// Only a mapping whose `$ref` member is a string is a reference; a
/// property that happens to be named `$ref` is not.
pub fn reference_of(node: &Value) -> Option<&str> {
    node.as_object()?.get("$ref")?.as_str()
}

/// Walk a slash-delimited pointer from `document`.
///
/// Leading and trailing slashes are ignored and an empty pointer selects
/// the whole document. Segments are unescaped (`~1` is `/`, `~0` is `~`);
/// on a sequence a segment must be a decimal index.
pub fn pointer_get<'v>(document: &'v Value, pointer: &str) -> Option<&'v Value> {
    let trimmed = pointer.trim_matches('/');
    if trimmed.is_empty() {
        return Some(document);
    }
    trimmed.split('/').try_fold(document, |node, raw| {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        match node {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            _ => None,
        }
    })
}

/// A dereferenced subtree and where it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: Value,
    /// File the subtree was found in; the context for references inside it.
    pub file: PathBuf,
    /// Pointer of the subtree within `file`.
    pub pointer: String,
}

/// Identity of a reference target, for cycle detection.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    file: PathBuf,
    pointer: String,
}

impl Target {
    fn new(file: &Path, pointer: &str) -> Self {
        Self {
            file: file.to_path_buf(),
            pointer: pointer.trim_matches('/').to_string(),
        }
    }

    /// `node` tagged as a back-edge to this target.
    fn mark(&self, node: &Value) -> Value {
        let mut marked = node.as_object().cloned().unwrap_or_default();
        marked.insert(
            RECURSIVE_MARKER.to_string(),
            Value::String(format!("{}#/{}", self.file.display(), self.pointer)),
        );
        Value::Object(marked)
    }
}

/// The document a pointer is walked in.
enum Context<'d> {
    Supplied(&'d Value),
    Cached(Arc<Value>),
}

impl Context<'_> {
    fn document(&self) -> &Value {
        match self {
            Self::Supplied(doc) => *doc,
            Self::Cached(doc) => doc.as_ref(),
        }
    }
}

/// Resolves references against documents held in a [`DocumentCache`].
pub struct Resolver<'c> {
    cache: &'c mut DocumentCache,
    expanding: Vec<Target>,
    unresolved: usize,
}

impl<'c> Resolver<'c> {
    pub fn new(cache: &'c mut DocumentCache) -> Self {
        Self {
            cache,
            expanding: Vec::new(),
            unresolved: 0,
        }
    }

    /// Reference nodes left in place by [`resolve_tree`](Self::resolve_tree)
    /// so far.
    pub fn unresolved(&self) -> usize {
        self.unresolved
    }

    /// Dereference `reference` found in `current_file`.
    ///
    /// `current_document` is the already-parsed content of `current_file`;
    /// when `None` the file is loaded through the cache on first need.
    /// Chained references are followed, switching file context whenever a
    /// link crosses into another file. Returns `None` for a missing file, a
    /// missing pointer segment, an unrecognized reference shape, or a
    /// cyclic chain.
    pub fn resolve(
        &mut self,
        reference: &str,
        current_file: &Path,
        current_document: Option<&Value>,
    ) -> Option<Resolved> {
        let mut file = current_file.to_path_buf();
        let mut context = current_document.map(Context::Supplied);
        let mut chain: Vec<Target> = Vec::new();
        let mut raw = reference.to_string();

        loop {
            let Some(parsed) = Reference::parse(&raw) else {
                tracing::debug!(reference = %raw, file = %file.display(), "unrecognized reference");
                return None;
            };

            match parsed {
                Reference::Local { .. } => {
                    if context.is_none() {
                        context = Some(Context::Cached(self.cache.get_or_load(&file)?));
                    }
                }
                Reference::External { file: relative, .. } => {
                    let base = file.parent().unwrap_or_else(|| Path::new("."));
                    let Some(target) = DocumentCache::canonical(&base.join(relative)) else {
                        tracing::debug!(
                            reference = %raw,
                            file = %file.display(),
                            "referenced file does not exist"
                        );
                        return None;
                    };
                    let document = self.cache.get_or_load(&target)?;
                    file = target;
                    context = Some(Context::Cached(document));
                }
            }

            let pointer = parsed.pointer();
            let document = context.as_ref()?.document();
            let Some(node) = pointer_get(document, pointer) else {
                tracing::debug!(
                    reference = %raw,
                    file = %file.display(),
                    "reference target not found"
                );
                return None;
            };

            let target = Target::new(&file, pointer);
            if chain.contains(&target) {
                tracing::debug!(reference = %reference, file = %file.display(), "reference cycle");
                return None;
            }
            chain.push(target);

            match reference_of(node) {
                Some(next) => raw = next.to_string(),
                None => {
                    return Some(Resolved {
                        value: node.clone(),
                        file,
                        pointer: pointer.to_string(),
                    })
                }
            }
        }
    }

    /// Replace every reference node under `node` with its fully resolved
    /// value. Mappings and sequences keep their shape; scalars pass
    /// through. Unresolvable references stay as they are.
    pub fn resolve_tree(&mut self, node: &Value, current_file: &Path) -> Value {
        if let Some(reference) = reference_of(node) {
            return self.expand_reference(node, reference, current_file);
        }

        match node {
            Value::Object(map) => {
                let resolved: Map<String, Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), self.resolve_tree(v, current_file)))
                    .collect();
                Value::Object(resolved)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_tree(item, current_file))
                    .collect(),
            ),
            scalar => scalar.clone(),
        }
    }

    fn expand_reference(&mut self, node: &Value, reference: &str, current_file: &Path) -> Value {
        if node.get(RECURSIVE_MARKER).is_some() {
            self.unresolved += 1;
            return node.clone();
        }

        let Some(resolved) = self.resolve(reference, current_file, None) else {
            self.unresolved += 1;
            return node.clone();
        };

        let target = Target::new(&resolved.file, &resolved.pointer);
        if self.expanding.contains(&target) {
            tracing::debug!(
                reference = %reference,
                file = %current_file.display(),
                "recursive schema, leaving reference in place"
            );
            self.unresolved += 1;
            return target.mark(node);
        }

        self.expanding.push(target);
        let value = self.resolve_tree(&resolved.value, &resolved.file);
        self.expanding.pop();
        value
    }
}
