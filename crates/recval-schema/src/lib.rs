//! # recval-schema: Record Validation Against JSON Schema
//!
//! Validates JSON-like records against JSON Schema documents and reports
//! the first failure as one structured [`ValidationError`]. Also rewrites
//! date leaves into canonical `YYYY-MM-DD` form, guided by the same schema.
//!
//! ## Pipeline
//!
//! 1. [`SchemaStore`] loads schema documents (JSON or YAML) and memoizes
//!    them by absolute URI. Relative `$ref`s resolve between documents of
//!    the same directory.
//! 2. [`JsonSchemaEngine`] compiles draft-04 validators with the
//!    `jsonschema` crate and reports [`RawFailure`]s, including per-branch
//!    failures for `oneOf`/`anyOf`.
//! 3. [`Interpreter`] picks the `oneOf` branch the record was meant to
//!    satisfy (by runtime type, then by enum discriminator) and classifies
//!    the failure into one of eleven error kinds.
//! 4. [`DateNormalizer`] walks schema and record together and rewrites
//!    `format: date` leaves.
//!
//! [`RecordValidator`] is the entry point for all of the above.
//!
//! ## Crate Policy
//!
//! - Depends only on `recval-core` internally.
//! - Only the first failure of a record is reported.
//! - Schema load and compile failures are returned as
//!   [`recval_core::SchemaError`], never folded into a `ValidationError`.
//!
//! [`ValidationError`]: recval_core::ValidationError
//! [`RawFailure`]: recval_core::RawFailure

pub mod config;
pub mod dates;
pub mod engine;
pub mod formats;
pub mod interpret;
pub mod params;
pub mod store;
pub mod validate;
pub mod walker;

pub use config::ValidatorConfig;
pub use dates::DateNormalizer;
pub use engine::{JsonSchemaEngine, ValidationEngine};
pub use formats::{CustomFormat, FormatSet};
pub use interpret::{classify, Interpreter};
pub use store::{FsSource, NoSource, SchemaSource, SchemaStore, StoreRetriever};
pub use validate::{convert_dates, validate, RecordValidator};
pub use walker::{node_at_path, resolve_ref, value_at_path, SchemaNode};
