//! # Record Input
//!
//! Records are read from a file or, for the path `-`, from stdin. Files
//! ending in `.yaml` or `.yml` are parsed as YAML; everything else is JSON.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use recval_schema::store::yaml_to_json_value;

/// Path that selects stdin.
pub const STDIN: &str = "-";

/// Whether `path` names stdin.
pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

/// Read one record.
pub fn read_record(path: &Path) -> Result<Value> {
    let content = if is_stdin(path) {
        std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read record: {}", path.display()))?
    };
    parse_record(&content, is_yaml(path))
        .with_context(|| format!("failed to parse record: {}", path.display()))
}

/// Parse record text as YAML or JSON.
pub fn parse_record(content: &str, yaml: bool) -> Result<Value> {
    if yaml {
        let document: serde_yaml::Value = serde_yaml::from_str(content)?;
        yaml_to_json_value(&document).map_err(anyhow::Error::msg)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

/// Open a line-oriented input stream.
pub fn open_lines(path: &Path) -> Result<Box<dyn BufRead>> {
    let reader: Box<dyn Read> = if is_stdin(path) {
        Box::new(std::io::stdin())
    } else {
        let file = File::open(path)
            .with_context(|| format!("failed to open input: {}", path.display()))?;
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}
