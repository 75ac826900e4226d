//! CLI subcommand implementations for the quill binary.

pub mod analytics_cmd;
pub mod doctor;
pub mod exec_cmd;
pub mod log_cmd;
pub mod memory_cmd;
pub mod output;
pub mod repl;
pub mod reset_cmd;

use crate::audit::InteractionLog;
use crate::config;
use crate::db::PgDatabase;
use crate::export::CsvExporter;
use crate::nl::{OpenAiTranslator, SqlTranslator, UnconfiguredTranslator};
use crate::session::{Controller, MemoryStore};
use anyhow::Result;
use std::sync::Arc;

/// Wire up a controller against the live database.
pub async fn connect_controller() -> Result<Controller> {
    let store = MemoryStore::default_store()?;
    let log = InteractionLog::default_log()?;

    let url = config::database_url()?;
    let db = Arc::new(PgDatabase::connect(&url).await?);

    let translator: Arc<dyn SqlTranslator> = match config::TranslatorConfig::from_env() {
        Some(cfg) => Arc::new(OpenAiTranslator::new(cfg)),
        None => Arc::new(UnconfiguredTranslator),
    };

    let open_after = !output::is_quiet() && !output::is_json();
    let exporter = Arc::new(CsvExporter::new(config::export_dir(), open_after));

    Ok(Controller::new(store, log, db, translator, exporter))
}
