//! Environment-driven configuration.
//!
//! Everything lives under the state directory (`~/.quill` by default,
//! overridable with `QUILL_HOME` for tests and sandboxes).
//!
//! Connection settings are resolved env-first:
//! 1. `QUILL_DATABASE_URL` — a full libpq connection string
//! 2. `PGHOST`/`PGPORT`/`PGUSER`/`PGPASSWORD`/`PGDATABASE` — assembled into one
//!
//! The translator reads `QUILL_OPENAI_API_KEY` (falling back to
//! `OPENAI_API_KEY`), with `QUILL_OPENAI_BASE_URL` and `QUILL_OPENAI_MODEL`
//! for OpenAI-compatible endpoints.

use anyhow::{bail, Result};
use std::path::PathBuf;

/// State directory: `$QUILL_HOME` or `~/.quill`.
pub fn state_dir() -> PathBuf {
    if let Ok(home) = std::env::var("QUILL_HOME") {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".quill")
}

/// Path of the persisted session state.
pub fn memory_path() -> PathBuf {
    state_dir().join("memory.json")
}

/// Path of the append-only interaction log.
pub fn history_path() -> PathBuf {
    state_dir().join("history.jsonl")
}

/// Path of the REPL readline history.
pub fn repl_history_path() -> PathBuf {
    state_dir().join("repl_history")
}

/// Directory for CSV exports: Downloads when known, else home.
pub fn export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve the Postgres connection string.
pub fn database_url() -> Result<String> {
    if let Ok(url) = std::env::var("QUILL_DATABASE_URL") {
        return Ok(url);
    }

    // Assemble from libpq-style variables when the host is given.
    if let Ok(host) = std::env::var("PGHOST") {
        let port = std::env::var("PGPORT").unwrap_or_else(|_| "5432".to_string());
        let user = std::env::var("PGUSER")
            .or_else(|_| std::env::var("USER"))
            .unwrap_or_else(|_| "postgres".to_string());
        let dbname = std::env::var("PGDATABASE").unwrap_or_else(|_| user.clone());
        let mut url = format!("host={host} port={port} user={user} dbname={dbname}");
        if let Ok(password) = std::env::var("PGPASSWORD") {
            url.push_str(&format!(" password={password}"));
        }
        return Ok(url);
    }

    bail!(
        "no database configured. Set QUILL_DATABASE_URL \
         (e.g. \"host=localhost user=me dbname=mydb\") or the PG* variables."
    )
}

/// Translator settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl TranslatorConfig {
    /// `None` when no API key is configured — `ask:` will report that.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("QUILL_OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()?;
        let base_url = std::env::var("QUILL_OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model =
            std::env::var("QUILL_OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        Some(Self {
            api_key,
            base_url,
            model,
        })
    }
}
