//! # Validate Subcommand
//!
//! Validates one record, or a JSON-Lines stream of records, against a
//! schema. Each record produces one output line: `valid`, or the
//! [`ValidationError`] serialized as JSON.
//!
//! Exit status is 0 when every record is valid and 1 otherwise.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use recval_core::ValidationError;
use recval_schema::{RecordValidator, SchemaNode};

use crate::input::{open_lines, read_record};
use crate::{build_validator, load_schema, SchemaArgs};

/// Arguments for `recval validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Record file (JSON, or YAML by extension). `-` reads stdin.
    #[arg(default_value = "-")]
    pub record: PathBuf,

    /// Read JSON Lines: one record per line, one result per line.
    #[arg(long)]
    pub lines: bool,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config: Option<&Path>) -> Result<u8> {
    let validator = build_validator(&args.schema, config)?;
    let schema = load_schema(&validator, &args.schema)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.lines {
        let reader = open_lines(&args.record)?;
        validate_lines(&validator, &schema, reader, &mut out)
    } else {
        let record = read_record(&args.record)?;
        validate_record(&validator, &schema, &record, &mut out)
    }
}

/// Validate a single record and write its result line.
pub fn validate_record<W: Write>(
    validator: &RecordValidator,
    schema: &SchemaNode,
    record: &Value,
    out: &mut W,
) -> Result<u8> {
    let outcome = validator
        .validate(schema, record)
        .context("validation could not run")?;
    write_outcome(out, outcome.as_ref())?;
    Ok(u8::from(outcome.is_some()))
}

/// Validate every non-empty line of `reader` as a JSON record.
///
/// A line that is not JSON aborts the run; earlier results have already
/// been written.
pub fn validate_lines<R: BufRead, W: Write>(
    validator: &RecordValidator,
    schema: &SchemaNode,
    reader: R,
    out: &mut W,
) -> Result<u8> {
    let mut total = 0usize;
    let mut invalid = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("failed to read line {number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(&line)
            .with_context(|| format!("line {number}: invalid JSON"))?;
        let outcome = validator
            .validate(schema, &record)
            .with_context(|| format!("line {number}: validation could not run"))?;

        total += 1;
        if let Some(error) = &outcome {
            invalid += 1;
            tracing::debug!(line = number, kind = %error.kind(), path = error.path(), "invalid record");
        }
        write_outcome(out, outcome.as_ref())?;
    }

    tracing::info!(total, invalid, "validated records");
    Ok(u8::from(invalid > 0))
}

fn write_outcome<W: Write>(out: &mut W, outcome: Option<&ValidationError>) -> Result<()> {
    match outcome {
        None => writeln!(out, "valid")?,
        Some(error) => writeln!(out, "{}", serde_json::to_string(error)?)?,
    }
    Ok(())
}
