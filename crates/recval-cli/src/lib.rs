//! # recval-cli: Command-Line Interface for recval
//!
//! Provides the `recval` binary on top of [`recval_schema::RecordValidator`].
//!
//! ## Subcommands
//!
//! - `recval validate`: check a record (or a JSON-Lines stream of records)
//!   against a schema and print `valid` or the structured error as JSON.
//! - `recval convert-dates`: rewrite the `format: date` leaves of a record
//!   into `YYYY-MM-DD` form.
//!
//! ```bash
//! recval validate --schema company.json record.json
//! recval validate --schema-dir schemas --schema company.json --lines < records.jsonl
//! recval convert-dates --schema company.json record.yaml
//! ```

pub mod convert;
pub mod input;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use recval_schema::{RecordValidator, SchemaNode, ValidatorConfig};

/// Schema selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Schema file path or absolute URI.
    #[arg(long)]
    pub schema: String,

    /// Directory of schema files. Every file is preloaded, and relative
    /// schema paths are resolved against it.
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,
}

/// Build a validator from an optional config file, with `--schema-dir`
/// taking precedence over the configured directory.
///
/// A relative `schema_dir` inside a config file is taken relative to the
/// file itself.
pub fn build_validator(args: &SchemaArgs, config: Option<&Path>) -> Result<RecordValidator> {
    let mut settings = match config {
        Some(path) => {
            let mut settings = ValidatorConfig::from_file(path)
                .with_context(|| format!("failed to load config: {}", path.display()))?;
            if let (Some(dir), Some(parent)) = (&settings.schema_dir, path.parent()) {
                if dir.is_relative() {
                    settings.schema_dir = Some(parent.join(dir));
                }
            }
            settings
        }
        None => ValidatorConfig::default(),
    };
    if let Some(dir) = &args.schema_dir {
        settings = settings.with_schema_dir(dir);
    }

    tracing::debug!(?settings, "building validator");
    RecordValidator::from_config(&settings).context("failed to build validator")
}

/// Load the schema named by `--schema`.
pub fn load_schema(validator: &RecordValidator, args: &SchemaArgs) -> Result<SchemaNode> {
    validator
        .load_schema(&args.schema)
        .with_context(|| format!("failed to load schema: {}", args.schema))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_args(schema: &str, schema_dir: Option<&Path>) -> SchemaArgs {
        SchemaArgs {
            schema: schema.to_string(),
            schema_dir: schema_dir.map(Path::to_path_buf),
        }
    }

    #[test]
    fn test_build_validator_defaults() {
        let validator = build_validator(&schema_args("x.json", None), None).unwrap();
        assert!(validator.schema_dir().is_none());
    }

    #[test]
    fn test_schema_dir_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let flagged = dir.path().join("flagged");
        std::fs::create_dir(&flagged).unwrap();
        let config = dir.path().join("recval.yaml");
        std::fs::write(&config, "schema_dir: configured\n").unwrap();

        let validator =
            build_validator(&schema_args("x.json", Some(&flagged)), Some(&config)).unwrap();
        assert_eq!(validator.schema_dir(), Some(flagged.as_path()));
    }

    #[test]
    fn test_config_schema_dir_relative_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("schemas")).unwrap();
        std::fs::write(
            dir.path().join("schemas").join("aaa.json"),
            r#"{"type": "object", "required": ["aaa"]}"#,
        )
        .unwrap();
        let config = dir.path().join("recval.yaml");
        std::fs::write(&config, "schema_dir: schemas\n").unwrap();

        let args = schema_args("aaa.json", None);
        let validator = build_validator(&args, Some(&config)).unwrap();
        assert_eq!(validator.schema_dir(), Some(dir.path().join("schemas").as_path()));
        assert!(load_schema(&validator, &args).is_ok());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("recval.yaml");
        std::fs::write(&config, "formats: [postcode]\n").unwrap();

        let err = build_validator(&schema_args("x.json", None), Some(&config)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load config"));
    }

    #[test]
    fn test_missing_schema_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = schema_args("absent.json", Some(dir.path()));
        let validator = build_validator(&args, None).unwrap();
        let err = load_schema(&validator, &args).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
