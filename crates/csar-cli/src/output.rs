//! Result rendering

use std::io::{self, Write};

use csar_definitions::ArchiveRoot;
use csar_parser::{ParsingError, ParsingResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct FatalReport<'a> {
    fatal: bool,
    file_name: &'a str,
    issue: &'a csar_parser::ParsingIssue,
}

/// Print a parsed archive: issues and an archive line in text form, or the
/// whole result as JSON. A summary always goes to stderr.
pub fn print_result(result: &ParsingResult<ArchiveRoot>, format: Format) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, result)?;
            writeln!(out)?;
        }
        Format::Text => {
            for issue in result.issues() {
                writeln!(out, "{issue}")?;
            }
            if let Some(root) = result.value() {
                let archive = &root.archive;
                writeln!(
                    out,
                    "archive: {} {} ({})",
                    archive.name.as_deref().unwrap_or("<unnamed>"),
                    archive.version.as_deref().unwrap_or("<unversioned>"),
                    archive.dialect.map_or("unknown dialect", |d| d.as_str()),
                )?;
                writeln!(
                    out,
                    "types: {} node, {} data",
                    root.node_types.len(),
                    root.data_types.len()
                )?;
            }
        }
    }
    eprintln!(
        "Parse summary: errors={}, warnings={}",
        result.error_count(),
        result.warning_count()
    );
    Ok(())
}

/// Print a fatal failure; JSON goes to stdout so callers can still parse it
pub fn print_fatal(error: &ParsingError, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Json => {
            let report = FatalReport {
                fatal: true,
                file_name: &error.file_name,
                issue: error.issue.as_ref(),
            };
            let stdout = io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
        Format::Text => eprintln!("ERROR: {error}"),
    }
    Ok(())
}
