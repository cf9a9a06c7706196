//! # Record Validation
//!
//! [`RecordValidator`] ties the pieces together: the [`SchemaStore`] holds
//! the schema documents, the [`ValidationEngine`] runs the structural
//! check, the [`Interpreter`] turns the first failure into a
//! [`ValidationError`], and the [`DateNormalizer`] rewrites date leaves.
//!
//! ```no_run
//! use recval_schema::RecordValidator;
//! use serde_json::json;
//!
//! let validator = RecordValidator::new();
//! let schema = validator.load_schema("schemas/company.json")?;
//! match validator.validate(&schema, &json!({"name": "Acme"}))? {
//!     None => println!("valid"),
//!     Some(error) => println!("{error}"),
//! }
//! # Ok::<(), recval_core::SchemaError>(())
//! ```
//!
//! For one-off checks against an in-memory schema, the free functions
//! [`validate`] and [`convert_dates`] build a throwaway validator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use recval_core::{RecvalError, SchemaError, ValidationError};
use serde_json::Value;
use url::Url;

use crate::config::ValidatorConfig;
use crate::dates::DateNormalizer;
use crate::engine::{JsonSchemaEngine, ValidationEngine};
use crate::formats::FormatSet;
use crate::interpret::Interpreter;
use crate::store::SchemaStore;
use crate::walker::SchemaNode;

/// Validates records and normalizes their dates against loaded schemas.
#[derive(Clone)]
pub struct RecordValidator {
    store: Arc<SchemaStore>,
    engine: Arc<dyn ValidationEngine>,
    interpreter: Interpreter,
    normalizer: DateNormalizer,
    schema_dir: Option<PathBuf>,
}

impl std::fmt::Debug for RecordValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordValidator")
            .field("store", &self.store)
            .field("schema_dir", &self.schema_dir)
            .finish_non_exhaustive()
    }
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordValidator {
    /// A validator reading schemas from the filesystem, with the standard
    /// custom formats.
    pub fn new() -> Self {
        Self::with_store(Arc::new(SchemaStore::default()), FormatSet::standard())
    }

    /// A validator over an existing store.
    pub fn with_store(store: Arc<SchemaStore>, formats: FormatSet) -> Self {
        let engine = JsonSchemaEngine::new(Arc::clone(&store), formats.clone());
        Self {
            engine: Arc::new(engine),
            interpreter: Interpreter::new(Arc::clone(&store), formats),
            normalizer: DateNormalizer::new(Arc::clone(&store)),
            store,
            schema_dir: None,
        }
    }

    /// Build a validator from configuration, preloading the schema
    /// directory if one is set.
    ///
    /// # Errors
    ///
    /// Returns `RecvalError::Config` for an unknown format and
    /// `RecvalError::Schema` if the schema directory cannot be loaded.
    pub fn from_config(config: &ValidatorConfig) -> Result<Self, RecvalError> {
        let formats = config.format_set()?;
        let store = Arc::new(SchemaStore::default());
        if let Some(dir) = &config.schema_dir {
            store.preload_dir(dir)?;
        }

        let engine = JsonSchemaEngine::new(Arc::clone(&store), formats.clone())
            .with_format_validation(config.validate_formats)
            .with_fast_path(config.fast_path);

        let mut validator = Self::with_store(store, formats).with_engine(Arc::new(engine));
        validator.schema_dir = config.schema_dir.clone();
        Ok(validator)
    }

    /// Replace the validation engine.
    pub fn with_engine(mut self, engine: Arc<dyn ValidationEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn store(&self) -> &Arc<SchemaStore> {
        &self.store
    }

    pub fn schema_dir(&self) -> Option<&Path> {
        self.schema_dir.as_deref()
    }

    /// Load a schema by absolute URI or by file path. Relative paths are
    /// taken from the schema directory when one is configured.
    pub fn load_schema(&self, reference: &str) -> Result<SchemaNode, SchemaError> {
        // Single-letter schemes are Windows drive letters.
        if let Ok(url) = Url::parse(reference) {
            if url.scheme().len() > 1 {
                return self.store.load(url.as_str());
            }
        }

        let path = Path::new(reference);
        match &self.schema_dir {
            Some(dir) if path.is_relative() => self.store.load_path(&dir.join(path)),
            _ => self.store.load_path(path),
        }
    }

    /// Register an in-memory schema and return its root node.
    pub fn register_schema(&self, schema: Value) -> Result<SchemaNode, SchemaError> {
        self.store.register_inline(schema)
    }

    /// Validate `record`, reporting only the first failure.
    ///
    /// Returns `Ok(None)` when the record is valid.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` when the schema cannot be loaded or compiled;
    /// the record is not checked in that case.
    pub fn validate(
        &self,
        schema: &SchemaNode,
        record: &Value,
    ) -> Result<Option<ValidationError>, SchemaError> {
        let failures = self.engine.run_validation(schema, record)?;
        if failures.is_empty() {
            return Ok(None);
        }
        tracing::debug!(schema = %schema.uri(), failures = failures.len(), "record failed validation");
        Ok(self.interpreter.interpret(&failures, record, schema))
    }

    /// Return a copy of `record` with its `format: date` leaves in
    /// `YYYY-MM-DD` form.
    pub fn convert_dates(&self, schema: &SchemaNode, record: &Value) -> Result<Value, SchemaError> {
        self.normalizer.normalize(Some(schema), record)
    }
}

/// Validate `record` against an in-memory `schema`.
///
/// Absolute `$ref`s to `file://` documents are followed; relative ones
/// cannot be, since the schema has no location of its own.
pub fn validate(schema: &Value, record: &Value) -> Result<Option<ValidationError>, SchemaError> {
    let validator = RecordValidator::new();
    let root = validator.register_schema(schema.clone())?;
    validator.validate(&root, record)
}

/// Normalize the dates of `record` against an in-memory `schema`.
pub fn convert_dates(schema: &Value, record: &Value) -> Result<Value, SchemaError> {
    let validator = RecordValidator::new();
    let root = validator.register_schema(schema.clone())?;
    validator.convert_dates(&root, record)
}
