//! # Error Types: Operational Failures
//!
//! Failures that prevent a record from being validated or normalized at
//! all. These are distinct from [`crate::ValidationError`], which describes
//! a record that was checked and found wanting.
//!
//! ## Design
//!
//! - Schema loading and document parsing failures are fatal and returned
//!   to the caller as-is.
//! - `CyclicReference` and `PathNotFound` are raised by the schema walker;
//!   the error interpreter treats both as "cannot disambiguate further".

use thiserror::Error;

/// Top-level error type for recval.
#[derive(Error, Debug)]
pub enum RecvalError {
    /// Schema loading, resolution or compilation failed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Validator configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Error raised while loading, resolving or compiling schemas.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema document could not be fetched or parsed.
    #[error("schema load error for '{uri}': {reason}")]
    Load {
        /// Absolute URI of the document.
        uri: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// A `$ref` or schema URI could not be turned into an absolute URI.
    #[error("invalid schema reference '{reference}' (base '{base}'): {reason}")]
    InvalidReference {
        /// The reference as written in the schema.
        reference: String,
        /// Base URI the reference was resolved against.
        base: String,
        /// Parse failure detail.
        reason: String,
    },

    /// Following `$ref` revisited a URI already seen in the same chain.
    #[error("cyclic schema reference at '{uri}' (chain: {})", chain.join(" -> "))]
    CyclicReference {
        /// The URI that was reached twice.
        uri: String,
        /// URIs visited before the repeat, in order.
        chain: Vec<String>,
    },

    /// The schema has no structure matching a record path.
    #[error("no schema structure for path '{path}'")]
    PathNotFound {
        /// Dotted path that could not be followed.
        path: String,
    },

    /// The validation engine rejected the schema.
    #[error("validator build error for schema '{uri}': {reason}")]
    ValidatorBuild {
        /// URI of the schema being compiled.
        uri: String,
        /// Reason reported by the engine.
        reason: String,
    },

    /// IO error reading a schema document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Whether the error only means the schema walker could not follow a
    /// path, as opposed to a broken schema set.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::CyclicReference { .. } | Self::PathNotFound { .. }
        )
    }
}

/// Error in validator configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config '{path}': {source}")]
    Read {
        /// Path to the configuration file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML/JSON for the expected shape.
    #[error("invalid config '{path}': {reason}")]
    Parse {
        /// Path to the configuration file.
        path: String,
        /// Parser error message.
        reason: String,
    },

    /// A custom format name that recval does not provide.
    #[error("unknown custom format '{0}' (known: date, non-blank)")]
    UnknownFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_reference_display_lists_chain() {
        let err = SchemaError::CyclicReference {
            uri: "file:///a.json".to_string(),
            chain: vec!["file:///a.json".to_string(), "file:///b.json".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("file:///a.json -> file:///b.json"), "{msg}");
    }

    #[test]
    fn test_navigation_errors() {
        assert!(SchemaError::PathNotFound { path: "aaa".into() }.is_navigation());
        assert!(!SchemaError::Load {
            uri: "file:///x.json".into(),
            reason: "missing".into()
        }
        .is_navigation());
    }
}
