//! `quill reset` — clear all remembered state.

use crate::cli::output;
use crate::session::{MemoryStore, Outcome};
use anyhow::Result;

pub fn run() -> Result<()> {
    let mut store = MemoryStore::default_store()?;
    store.reset();
    output::render(&Outcome::ResetDone);
    Ok(())
}
