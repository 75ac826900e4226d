//! JSONL interaction log — append-only record of every executed input.
//!
//! Records are never mutated or deleted by the core. The file rotates when
//! it exceeds `MAX_LOG_SIZE`; rotated files are named `.1`, `.2`, etc. with
//! at most `MAX_ROTATIONS` kept.

use crate::config;
use crate::error::QuillError;
use crate::session::store::ActiveContext;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Maximum log size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated log files to keep.
const MAX_ROTATIONS: u32 = 5;

/// How an input was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Raw,
    Natural,
    Structured,
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Natural => write!(f, "natural"),
            Self::Structured => write!(f, "structured"),
        }
    }
}

/// One logged interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: String,
    pub kind: InteractionKind,
    pub prompt: String,
    pub sql: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
}

/// Append-only JSONL logger with size-based rotation.
pub struct InteractionLog {
    file: File,
    path: PathBuf,
    /// Approximate current size; re-checked on rotation.
    current_size: u64,
}

impl InteractionLog {
    /// Open or create the log file.
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open interaction log: {}", path.display()))?;

        let current_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            file,
            path,
            current_size,
        })
    }

    /// Open the default log at `~/.quill/history.jsonl`.
    pub fn default_log() -> Result<Self> {
        Self::open(config::history_path())
    }

    /// Append one record. Failure to log never aborts the input being
    /// processed — callers treat this as best-effort.
    pub fn append(&mut self, record: &InteractionRecord) -> Result<()> {
        if self.current_size >= MAX_LOG_SIZE {
            self.rotate()?;
        }

        let json = serde_json::to_string(record)?;
        writeln!(self.file, "{json}")?;
        self.current_size += json.len() as u64 + 1;
        Ok(())
    }

    /// Append a record built from the current context.
    pub fn record(
        &mut self,
        kind: InteractionKind,
        prompt: &str,
        sql: Option<&str>,
        context: &ActiveContext,
    ) -> Result<()> {
        self.append(&InteractionRecord {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            prompt: prompt.to_string(),
            sql: sql.map(String::from),
            schema: context.schema.clone(),
            table: context.table.clone(),
        })
    }

    /// The last `n` records, newest first. Lines that fail to parse are
    /// skipped (the log may span format changes).
    pub fn tail(&self, n: usize) -> Result<Vec<InteractionRecord>, QuillError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).map_err(QuillError::state)?;
        let mut records: Vec<InteractionRecord> = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();

        let skip = records.len().saturating_sub(n);
        records.drain(..skip);
        records.reverse();
        Ok(records)
    }

    /// Rotate: history.jsonl → .1, .1 → .2, oldest dropped.
    fn rotate(&mut self) -> Result<()> {
        self.file.flush()?;

        for i in (1..MAX_ROTATIONS).rev() {
            let from = rotation_path(&self.path, i);
            let to = rotation_path(&self.path, i + 1);
            if from.exists() {
                let _ = std::fs::rename(&from, &to);
            }
        }
        let _ = std::fs::rename(&self.path, rotation_path(&self.path, 1));

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| "failed to reopen interaction log after rotation")?;
        self.current_size = 0;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn rotation_path(base: &Path, index: u32) -> PathBuf {
    let name = format!(
        "{}.{index}",
        base.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("history.jsonl")
    );
    base.with_file_name(name)
}
