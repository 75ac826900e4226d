//! `quill exec "<line>"` — run one input line non-interactively.

use crate::cli::{connect_controller, output};
use anyhow::Result;

pub async fn run(line: &str) -> Result<()> {
    let mut controller = connect_controller().await?;
    let outcome = controller.handle_line(line).await?;
    output::render(&outcome);
    Ok(())
}
