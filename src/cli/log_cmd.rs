//! `quill log` — recent interactions, newest first.

use crate::audit::InteractionLog;
use crate::cli::output;
use crate::session::Outcome;
use anyhow::Result;

pub fn run(count: usize) -> Result<()> {
    let log = InteractionLog::default_log()?;
    output::render(&Outcome::History(log.tail(count)?));
    Ok(())
}
