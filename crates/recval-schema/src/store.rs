//! # Schema Store
//!
//! Loads schema documents and memoizes them by absolute URI so that the
//! schema walker and the validation engine see the same documents.
//!
//! ## Schema Resolution
//!
//! Every document is keyed by the absolute URI it was loaded from:
//!
//! - files: `file:///abs/path/aaa.json` (JSON, or YAML by extension)
//! - in-memory schemas: `json-schema:///inline/<n>.json`
//!
//! Relative `$ref`s (`bbb.json`, `bbb.json#/definitions/x`) are joined
//! against the referring document's URI, so sibling files in one schema
//! directory resolve to each other. Documents not already registered are
//! fetched through a [`SchemaSource`]; there is no network access.
//!
//! ## Thread Safety
//!
//! `SchemaStore` is `Send + Sync`. Concurrent first loads of the same URI
//! may both fetch; the first insert wins and both callers get equal
//! documents.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jsonschema::{Retrieve, Uri};
use parking_lot::RwLock;
use recval_core::SchemaError;
use serde_json::Value;
use url::Url;

use crate::walker::SchemaNode;

/// Base URI for schemas registered from memory.
pub const INLINE_BASE: &str = "json-schema:///inline/";

/// Fetches a schema document the store has not seen yet.
pub trait SchemaSource: Send + Sync {
    /// Fetch and parse the document at `uri` (never carries a fragment).
    fn fetch(&self, uri: &Url) -> Result<Value, SchemaError>;
}

/// Reads `file://` documents from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl SchemaSource for FsSource {
    fn fetch(&self, uri: &Url) -> Result<Value, SchemaError> {
        if uri.scheme() != "file" {
            return Err(SchemaError::Load {
                uri: uri.to_string(),
                reason: format!("unsupported scheme '{}'", uri.scheme()),
            });
        }
        let path = uri.to_file_path().map_err(|()| SchemaError::Load {
            uri: uri.to_string(),
            reason: "not a local file path".to_string(),
        })?;
        read_document(&path)
    }
}

/// Source that knows no documents; everything must be registered up front.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSource;

impl SchemaSource for NoSource {
    fn fetch(&self, uri: &Url) -> Result<Value, SchemaError> {
        Err(SchemaError::Load {
            uri: uri.to_string(),
            reason: "document not registered".to_string(),
        })
    }
}

/// Memoizing store of schema documents keyed by absolute URI.
pub struct SchemaStore {
    source: Box<dyn SchemaSource>,
    documents: RwLock<HashMap<String, Arc<Value>>>,
    inline_count: AtomicUsize,
}

impl std::fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaStore")
            .field("documents", &self.document_count())
            .finish_non_exhaustive()
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new(FsSource)
    }
}

impl SchemaStore {
    /// Create an empty store that fetches unknown documents from `source`.
    pub fn new(source: impl SchemaSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            documents: RwLock::new(HashMap::new()),
            inline_count: AtomicUsize::new(0),
        }
    }

    /// Create an empty store that only knows registered documents.
    pub fn in_memory() -> Self {
        Self::new(NoSource)
    }

    /// Returns the number of loaded documents.
    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns the URIs of all loaded documents, sorted.
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.documents.read().keys().cloned().collect();
        uris.sort();
        uris
    }

    /// Fetch the document at `uri`, loading it through the source on first
    /// access. Any fragment on `uri` is ignored.
    pub fn document(&self, uri: &Url) -> Result<Arc<Value>, SchemaError> {
        let mut key = uri.clone();
        key.set_fragment(None);
        let key_str = key.to_string();

        if let Some(doc) = self.documents.read().get(&key_str) {
            return Ok(Arc::clone(doc));
        }

        let fetched = self.source.fetch(&key)?;
        tracing::trace!(uri = %key_str, "loaded schema document");
        let mut documents = self.documents.write();
        let doc = documents
            .entry(key_str)
            .or_insert_with(|| Arc::new(fetched));
        Ok(Arc::clone(doc))
    }

    /// Register an in-memory document under an absolute URI and return its
    /// root node.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidReference` if `uri` is not absolute and
    /// `SchemaError::Load` if a different document is already registered
    /// under it. Re-registering an identical document is a no-op.
    pub fn register(&self, uri: &str, document: Value) -> Result<SchemaNode, SchemaError> {
        let mut url = Url::parse(uri).map_err(|e| SchemaError::InvalidReference {
            reference: uri.to_string(),
            base: String::new(),
            reason: e.to_string(),
        })?;
        url.set_fragment(None);
        let key = url.to_string();

        let mut documents = self.documents.write();
        if let Some(existing) = documents.get(&key) {
            if **existing != document {
                return Err(SchemaError::Load {
                    uri: key,
                    reason: "a different document is already registered".to_string(),
                });
            }
            return Ok(SchemaNode::root(url, Arc::clone(existing)));
        }
        let doc = Arc::new(document);
        documents.insert(key, Arc::clone(&doc));
        Ok(SchemaNode::root(url, doc))
    }

    /// Register a schema that has no natural URI.
    pub fn register_inline(&self, document: Value) -> Result<SchemaNode, SchemaError> {
        let n = self.inline_count.fetch_add(1, Ordering::Relaxed);
        self.register(&format!("{INLINE_BASE}{n}.json"), document)
    }

    /// Load the document at an absolute URI and return its root node.
    pub fn load(&self, uri: &str) -> Result<SchemaNode, SchemaError> {
        let mut url = Url::parse(uri).map_err(|e| SchemaError::InvalidReference {
            reference: uri.to_string(),
            base: String::new(),
            reason: e.to_string(),
        })?;
        url.set_fragment(None);
        let doc = self.document(&url)?;
        Ok(SchemaNode::root(url, doc))
    }

    /// Load a schema file and return its root node. Relative paths are
    /// taken from the current directory.
    pub fn load_path(&self, path: &Path) -> Result<SchemaNode, SchemaError> {
        let url = file_url(path)?;
        let doc = self.document(&url)?;
        Ok(SchemaNode::root(url, doc))
    }

    /// Load every `*.json`, `*.yaml` and `*.yml` file in `dir`.
    ///
    /// Documents are keyed by their file URLs, so relative `$ref`s between
    /// files of the directory resolve without further configuration.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Load` if the directory cannot be read or any
    /// schema file cannot be parsed.
    pub fn preload_dir(&self, dir: &Path) -> Result<usize, SchemaError> {
        let entries = std::fs::read_dir(dir).map_err(|e| SchemaError::Load {
            uri: dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        let mut loaded = 0usize;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let is_schema = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| matches!(ext, "json" | "yaml" | "yml"));
            if is_schema && path.is_file() {
                self.load_path(&path)?;
                loaded += 1;
            }
        }
        tracing::debug!(dir = %dir.display(), loaded, "preloaded schema directory");
        Ok(loaded)
    }
}

/// Absolute `file://` URL for a path.
pub fn file_url(path: &Path) -> Result<Url, SchemaError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute).map_err(|()| SchemaError::Load {
        uri: absolute.display().to_string(),
        reason: "cannot express path as a file URL".to_string(),
    })
}

/// Read a JSON or YAML document, choosing the parser by file extension.
pub fn read_document(path: &Path) -> Result<Value, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Load {
        uri: path.display().to_string(),
        reason: format!("cannot read file: {e}"),
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yaml" | "yml" => {
            let yaml_value: serde_yaml::Value =
                serde_yaml::from_str(&content).map_err(|e| SchemaError::Load {
                    uri: path.display().to_string(),
                    reason: format!("invalid YAML: {e}"),
                })?;
            yaml_to_json_value(&yaml_value).map_err(|e| SchemaError::Load {
                uri: path.display().to_string(),
                reason: format!("YAML-to-JSON conversion failed: {e}"),
            })
        }
        _ => serde_json::from_str(&content).map_err(|e| SchemaError::Load {
            uri: path.display().to_string(),
            reason: format!("invalid JSON: {e}"),
        }),
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Schemas and records use only the JSON-compatible subset of YAML; tags
/// are dropped and scalar map keys are stringified.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

/// `jsonschema` retriever backed by a [`SchemaStore`].
///
/// Lets the validation engine resolve cross-document `$ref`s from the same
/// memoized documents the schema walker uses.
pub struct StoreRetriever {
    store: Arc<SchemaStore>,
}

impl StoreRetriever {
    pub fn new(store: Arc<SchemaStore>) -> Self {
        Self { store }
    }
}

impl Retrieve for StoreRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let url = Url::parse(uri.as_str())?;
        let doc = self.store.document(&url)?;
        Ok(Value::clone(&doc))
    }
}
