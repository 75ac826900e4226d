//! Result export — write a tabular result to CSV and open it.
//!
//! The open step is best-effort and platform-dependent; its failure is
//! reported but never fatal.

use crate::db::TableResult;
use crate::error::QuillError;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Narrow interface so tests can capture exports in memory.
pub trait Exporter: Send + Sync {
    /// Write the result, returning the file path.
    fn export(&self, result: &TableResult, table: &str) -> Result<PathBuf, QuillError>;
}

/// CSV exporter writing timestamped files into a directory.
pub struct CsvExporter {
    dir: PathBuf,
    /// Whether to hand the file to the platform opener after writing.
    open_after: bool,
}

impl CsvExporter {
    pub fn new(dir: PathBuf, open_after: bool) -> Self {
        Self { dir, open_after }
    }
}

impl Exporter for CsvExporter {
    fn export(&self, result: &TableResult, table: &str) -> Result<PathBuf, QuillError> {
        fs::create_dir_all(&self.dir).map_err(QuillError::export)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("query_result_{table}_{timestamp}.csv"));
        fs::write(&path, render_csv(result)).map_err(QuillError::export)?;
        tracing::info!("exported {} rows to {}", result.row_count(), path.display());

        if self.open_after {
            if let Err(e) = open_file(&path) {
                // Reported, non-fatal.
                tracing::warn!("could not open {}: {e}", path.display());
            }
        }
        Ok(path)
    }
}

fn render_csv(result: &TableResult) -> String {
    let mut out = String::new();
    out.push_str(&join_row(result.columns.iter().map(String::as_str)));
    out.push('\n');
    for row in &result.rows {
        out.push_str(&join_row(row.iter().map(|v| v.as_deref().unwrap_or(""))));
        out.push('\n');
    }
    out
}

fn join_row<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields.map(csv_field).collect::<Vec<_>>().join(",")
}

/// RFC 4180 quoting: quote when the field contains a comma, quote, or
/// newline; double embedded quotes.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Hand a file to the platform opener.
fn open_file(path: &Path) -> anyhow::Result<()> {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(target_os = "windows")]
    let opener = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let opener = "xdg-open";

    which::which(opener)
        .map_err(|e| anyhow::anyhow!("no opener '{opener}' on this system: {e}"))?;
    Command::new(opener).arg(path).spawn()?;
    Ok(())
}
