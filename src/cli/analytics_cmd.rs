//! `quill analytics` — column usage summary, most-used first.

use crate::cli::output;
use crate::session::{MemoryStore, Outcome};
use anyhow::Result;

pub fn run() -> Result<()> {
    let store = MemoryStore::default_store()?;
    let usage = &store.state.usage;
    let summary = usage
        .table_keys()
        .map(|key| (key.clone(), usage.ranked(key)))
        .collect();
    output::render(&Outcome::Analytics(summary));
    Ok(())
}
