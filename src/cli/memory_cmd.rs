//! `quill memory` — show the active context and remembered spec without
//! touching the database.

use crate::cli::output;
use crate::session::{MemoryStore, Outcome};
use anyhow::Result;

pub fn run() -> Result<()> {
    let store = MemoryStore::default_store()?;
    let outcome = Outcome::Memory {
        context: store.state.context.clone(),
        spec: store
            .active_spec()
            .map(|(key, spec)| (key, spec.clone())),
    };
    output::render(&outcome);
    Ok(())
}
