//! Session controller — routes each classified input line through the
//! parser, store, compiler, and external collaborators.
//!
//! One input is fully processed (parsed, merged, persisted, compiled,
//! executed, logged) before the next is read. A failure aborts only the
//! current input, never the session.

use crate::audit::{InteractionKind, InteractionLog, InteractionRecord};
use crate::compiler;
use crate::db::Database;
use crate::directive::{classify, InputKind};
use crate::error::QuillError;
use crate::export::Exporter;
use crate::nl::SqlTranslator;
use crate::session::store::{ActiveContext, MemoryStore, TableQuerySpec};
use crate::session::usage::UsageEntry;
use std::path::PathBuf;
use std::sync::Arc;

/// How many interactions `/log` shows.
const LOG_TAIL: usize = 5;

/// What a processed input produced, for display by the caller.
#[derive(Debug)]
pub enum Outcome {
    /// Context fields were set directly.
    ContextUpdated {
        schema: Option<String>,
        table: Option<String>,
    },
    /// A column-listing request.
    Columns {
        table: String,
        columns: Vec<String>,
    },
    /// A statement ran against the database.
    Executed {
        kind: InteractionKind,
        sql: String,
        rows: usize,
        export: Option<PathBuf>,
        warnings: Vec<String>,
    },
    /// `/memory`.
    Memory {
        context: ActiveContext,
        spec: Option<(String, TableQuerySpec)>,
    },
    /// `/log` — newest first.
    History(Vec<InteractionRecord>),
    /// `/analytics` — per table, columns by descending usage.
    Analytics(Vec<(String, Vec<UsageEntry>)>),
    /// `/reset`.
    ResetDone,
    /// `/help`.
    Help,
    /// Unrecognized meta-command.
    UnknownMeta(String),
}

type MetaHandler = fn(&mut Controller) -> Result<Outcome, QuillError>;

/// Statically registered meta-command handlers (name, description, handler).
pub const META_COMMANDS: &[(&str, &str, MetaHandler)] = &[
    ("help", "Show the directive grammar", Controller::meta_help),
    ("memory", "Show context and the remembered spec", Controller::meta_memory),
    ("log", "Show the last 5 interactions", Controller::meta_log),
    ("analytics", "Column usage summary", Controller::meta_analytics),
    ("reset", "Clear all remembered state", Controller::meta_reset),
];

pub struct Controller {
    store: MemoryStore,
    log: InteractionLog,
    db: Arc<dyn Database>,
    translator: Arc<dyn SqlTranslator>,
    exporter: Arc<dyn Exporter>,
}

impl Controller {
    pub fn new(
        store: MemoryStore,
        log: InteractionLog,
        db: Arc<dyn Database>,
        translator: Arc<dyn SqlTranslator>,
        exporter: Arc<dyn Exporter>,
    ) -> Self {
        Self {
            store,
            log,
            db,
            translator,
            exporter,
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Process one line of operator input.
    pub async fn handle_line(&mut self, line: &str) -> Result<Outcome, QuillError> {
        match classify(line) {
            InputKind::Natural { prompt } => self.handle_natural(&prompt).await,
            InputKind::ColumnListing { table } => self.handle_column_listing(&table).await,
            InputKind::RawSql { sql } => self.handle_raw(&sql).await,
            InputKind::ContextOnly { schema, table } => {
                self.store
                    .set_context(schema.as_deref(), table.as_deref())?;
                Ok(Outcome::ContextUpdated { schema, table })
            }
            InputKind::Meta { command, .. } => self.dispatch_meta(&command),
            InputKind::Structured { updates } => self.handle_structured(line, &updates).await,
        }
    }

    /// Structured directive: merge → reflect → compile → execute → account.
    async fn handle_structured(
        &mut self,
        line: &str,
        updates: &crate::directive::FieldUpdates,
    ) -> Result<Outcome, QuillError> {
        let resolved = self.store.apply(updates)?;

        let live_columns = self.db.reflect(&resolved.schema, &resolved.table).await?;
        let compiled = compiler::compile(
            &resolved.schema,
            &resolved.table,
            &resolved.spec,
            &live_columns,
        )?;

        self.log_interaction(InteractionKind::Structured, line, Some(&compiled.sql));

        let result = self.db.execute(&compiled.sql).await?;
        // Usage counts only after the compiled statement actually ran.
        self.store.record_usage(&resolved.key, &compiled.columns)?;

        let export = if result.is_empty() {
            None
        } else {
            Some(self.exporter.export(&result, &resolved.table)?)
        };

        Ok(Outcome::Executed {
            kind: InteractionKind::Structured,
            sql: compiled.sql,
            rows: result.row_count(),
            export,
            warnings: compiled.warnings,
        })
    }

    /// Raw SQL bypasses the compiler entirely — and the usage tracker, since
    /// its column set is unknown.
    async fn handle_raw(&mut self, sql: &str) -> Result<Outcome, QuillError> {
        self.log_interaction(InteractionKind::Raw, sql, Some(sql));
        let result = self.db.execute(sql).await?;

        let export = if result.is_empty() {
            None
        } else {
            let table = self
                .store
                .state
                .context
                .table
                .clone()
                .unwrap_or_else(|| "adhoc".to_string());
            Some(self.exporter.export(&result, &table)?)
        };

        Ok(Outcome::Executed {
            kind: InteractionKind::Raw,
            sql: sql.to_string(),
            rows: result.row_count(),
            export,
            warnings: Vec::new(),
        })
    }

    /// `ask:` — translate through the NL collaborator, then run as raw SQL.
    async fn handle_natural(&mut self, prompt: &str) -> Result<Outcome, QuillError> {
        let (schema, table) = match (
            self.store.state.context.schema.clone(),
            self.store.state.context.table.clone(),
        ) {
            (Some(s), Some(t)) => (s, t),
            _ => return Err(QuillError::IncompleteContext),
        };

        let columns = self.db.reflect(&schema, &table).await?;
        let schema_hint = format!("{table}({})", columns.join(", "));
        let sql = self.translator.translate(prompt, &schema_hint).await?;
        tracing::debug!("translated to: {sql}");

        self.log_interaction(InteractionKind::Natural, prompt, Some(&sql));

        let result = self.db.execute(&sql).await?;
        let export = if result.is_empty() {
            None
        } else {
            Some(self.exporter.export(&result, &table)?)
        };

        Ok(Outcome::Executed {
            kind: InteractionKind::Natural,
            sql,
            rows: result.row_count(),
            export,
            warnings: Vec::new(),
        })
    }

    /// "list all columns of <table>" — reflect and report. The captured
    /// table becomes the active table; the schema must already be set.
    async fn handle_column_listing(&mut self, table: &str) -> Result<Outcome, QuillError> {
        let schema = self
            .store
            .state
            .context
            .schema
            .clone()
            .ok_or(QuillError::IncompleteContext)?;
        self.store.set_context(None, Some(table))?;

        let columns = self.db.reflect(&schema, table).await?;
        Ok(Outcome::Columns {
            table: format!("{schema}.{table}"),
            columns,
        })
    }

    fn dispatch_meta(&mut self, command: &str) -> Result<Outcome, QuillError> {
        match META_COMMANDS.iter().find(|(name, _, _)| *name == command) {
            Some((_, _, handler)) => handler(self),
            None => Ok(Outcome::UnknownMeta(command.to_string())),
        }
    }

    fn meta_help(&mut self) -> Result<Outcome, QuillError> {
        Ok(Outcome::Help)
    }

    fn meta_memory(&mut self) -> Result<Outcome, QuillError> {
        Ok(Outcome::Memory {
            context: self.store.state.context.clone(),
            spec: self
                .store
                .active_spec()
                .map(|(key, spec)| (key, spec.clone())),
        })
    }

    fn meta_log(&mut self) -> Result<Outcome, QuillError> {
        Ok(Outcome::History(self.log.tail(LOG_TAIL)?))
    }

    fn meta_analytics(&mut self) -> Result<Outcome, QuillError> {
        let usage = &self.store.state.usage;
        let summary = usage
            .table_keys()
            .map(|key| (key.clone(), usage.ranked(key)))
            .collect();
        Ok(Outcome::Analytics(summary))
    }

    fn meta_reset(&mut self) -> Result<Outcome, QuillError> {
        self.store.reset();
        Ok(Outcome::ResetDone)
    }

    /// Best-effort append; a logging failure never aborts the input.
    fn log_interaction(&mut self, kind: InteractionKind, prompt: &str, sql: Option<&str>) {
        if let Err(e) = self
            .log
            .record(kind, prompt, sql, &self.store.state.context)
        {
            tracing::warn!("could not append interaction log: {e}");
        }
    }
}
