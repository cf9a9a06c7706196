//! # Convert-Dates Subcommand
//!
//! Prints a record with every schema-declared `format: date` leaf rewritten
//! to `YYYY-MM-DD`. Values that do not start with a date are left alone.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::input::read_record;
use crate::{build_validator, load_schema, SchemaArgs};

/// Arguments for `recval convert-dates`.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Record file (JSON, or YAML by extension). `-` reads stdin.
    #[arg(default_value = "-")]
    pub record: PathBuf,

    /// Pretty-print the converted record.
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the convert-dates subcommand.
pub fn run_convert(args: &ConvertArgs, config: Option<&Path>) -> Result<u8> {
    let validator = build_validator(&args.schema, config)?;
    let schema = load_schema(&validator, &args.schema)?;
    let record = read_record(&args.record)?;

    let converted = validator
        .convert_dates(&schema, &record)
        .context("date conversion failed")?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&converted)?
    } else {
        serde_json::to_string(&converted)?
    };
    let stdout = std::io::stdout();
    writeln!(stdout.lock(), "{rendered}")?;
    Ok(0)
}
