//! # recval-core: Foundational Types for recval
//!
//! This crate defines the vocabulary shared by every other crate in the
//! workspace. It depends on nothing internal.
//!
//! ## Key Types
//!
//! 1. **[`ValidationError`].** The single, structured result of a failed
//!    validation: a closed [`ErrorKind`], a dotted path from the record
//!    root, a rendered message and kind-specific parameters.
//!
//! 2. **[`RawFailure`] and [`Keyword`].** What the delegated validation
//!    engine reports before interpretation. `Keyword` is a closed enum;
//!    anything the interpreter does not understand lands in
//!    `Keyword::Other` and classifies as `unknown`.
//!
//! 3. **Fragment paths.** [`fragment_to_path`] turns a JSON pointer
//!    (`/aaa/0/bbb`) into the dotted path (`aaa.0.bbb`) used throughout the
//!    taxonomy.
//!
//! 4. **Canonical dates.** [`CanonicalDate`] parses a `YYYY-MM-DD` prefix
//!    and renders the canonical form.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `recval-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod keyword;
pub mod path;
pub mod report;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::{ConfigError, RecvalError, SchemaError};
pub use keyword::{Keyword, RawFailure};
pub use path::{escape_pointer_segment, fragment_to_path, join_path, pointer_segments};
pub use report::{ErrorDetail, ErrorKind, ValidationError, ERROR_KIND_COUNT};
pub use temporal::{CanonicalDate, CANONICAL_DATE_LABEL};
