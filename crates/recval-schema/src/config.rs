//! # Validator Configuration
//!
//! Settings for building a [`crate::RecordValidator`], loadable from a YAML
//! or JSON file:
//!
//! ```yaml
//! schema_dir: schemas
//! formats: [date, non-blank]
//! validate_formats: true
//! fast_path: true
//! ```
//!
//! Every field is optional; unknown fields are rejected.

use std::path::{Path, PathBuf};

use recval_core::ConfigError;
use serde::{Deserialize, Serialize};

use crate::formats::FormatSet;

/// Validator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Directory whose schema files are preloaded and against which
    /// relative schema paths are resolved.
    pub schema_dir: Option<PathBuf>,
    /// Custom formats to enable (`date`, `non-blank`).
    pub formats: Vec<String>,
    /// Whether `format` keywords are checked at all.
    pub validate_formats: bool,
    /// Run a boolean validity check before collecting failures.
    pub fast_path: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            schema_dir: None,
            formats: vec!["date".to_string(), "non-blank".to_string()],
            validate_formats: true,
            fast_path: true,
        }
    }
}

impl ValidatorConfig {
    /// Load settings from a file: JSON for `.json`, YAML otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if it does not describe a valid configuration.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        let config: Self = parsed.map_err(|reason| ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        })?;

        config.format_set()?;
        Ok(config)
    }

    /// Use `dir` as the schema directory.
    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    /// The custom formats named by `formats`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownFormat` for a name recval does not ship.
    pub fn format_set(&self) -> Result<FormatSet, ConfigError> {
        FormatSet::from_names(&self.formats)
    }
}
