//! End-to-end session flows driven through the controller with in-memory
//! fakes for the database, translator, and exporter.

use async_trait::async_trait;
use quill::audit::{InteractionKind, InteractionLog};
use quill::db::{Database, TableResult};
use quill::error::QuillError;
use quill::export::Exporter;
use quill::nl::SqlTranslator;
use quill::session::{Controller, MemoryStore, Outcome};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Fixed-schema fake that records every executed statement.
struct FakeDatabase {
    columns: Vec<String>,
    executed: Mutex<Vec<String>>,
}

impl FakeDatabase {
    fn with_columns(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            columns: names.iter().map(|s| s.to_string()).collect(),
            executed: Mutex::new(Vec::new()),
        })
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn reflect(&self, _schema: &str, table: &str) -> Result<Vec<String>, QuillError> {
        if table == "missing" {
            return Err(QuillError::Reflection {
                table: table.to_string(),
                message: "table not found".to_string(),
            });
        }
        Ok(self.columns.clone())
    }

    async fn execute(&self, sql: &str) -> Result<TableResult, QuillError> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(TableResult {
            columns: self.columns.clone(),
            rows: vec![vec![Some("x".to_string()); self.columns.len()]],
        })
    }
}

/// Returns a canned statement and records the schema hints it was given.
struct FakeTranslator {
    sql: String,
    hints: Mutex<Vec<String>>,
}

impl FakeTranslator {
    fn returning(sql: &str) -> Arc<Self> {
        Arc::new(Self {
            sql: sql.to_string(),
            hints: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SqlTranslator for FakeTranslator {
    async fn translate(&self, _prompt: &str, schema_hint: &str) -> Result<String, QuillError> {
        self.hints.lock().unwrap().push(schema_hint.to_string());
        Ok(self.sql.clone())
    }
}

/// Captures exports instead of touching the filesystem.
struct FakeExporter {
    exports: Mutex<Vec<(String, usize)>>,
}

impl FakeExporter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            exports: Mutex::new(Vec::new()),
        })
    }

    fn exports(&self) -> Vec<(String, usize)> {
        self.exports.lock().unwrap().clone()
    }
}

impl Exporter for FakeExporter {
    fn export(&self, result: &TableResult, table: &str) -> Result<PathBuf, QuillError> {
        self.exports
            .lock()
            .unwrap()
            .push((table.to_string(), result.row_count()));
        Ok(PathBuf::from(format!("/fake/{table}.csv")))
    }
}

struct Harness {
    controller: Controller,
    db: Arc<FakeDatabase>,
    translator: Arc<FakeTranslator>,
    exporter: Arc<FakeExporter>,
    log_path: PathBuf,
    _dir: tempfile::TempDir,
}

fn harness(columns: &[&str]) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("history.jsonl");

    let store = MemoryStore::open(dir.path().join("memory.json")).unwrap();
    let log = InteractionLog::open(log_path.clone()).unwrap();
    let db = FakeDatabase::with_columns(columns);
    let translator = FakeTranslator::returning("SELECT salary FROM emp");
    let exporter = FakeExporter::new();

    let controller = Controller::new(
        store,
        log,
        db.clone(),
        translator.clone(),
        exporter.clone(),
    );
    Harness {
        controller,
        db,
        translator,
        exporter,
        log_path,
        _dir: dir,
    }
}

fn logged(h: &Harness) -> Vec<quill::audit::InteractionRecord> {
    InteractionLog::open(h.log_path.clone())
        .unwrap()
        .tail(100)
        .unwrap()
}

#[tokio::test]
async fn structured_directive_compiles_executes_and_exports() {
    let mut h = harness(&["id", "name", "salary"]);

    let outcome = h
        .controller
        .handle_line("schema: public, tablename: emp, columns: name, limit: 2")
        .await
        .unwrap();

    match outcome {
        Outcome::Executed {
            kind,
            sql,
            rows,
            export,
            warnings,
        } => {
            assert_eq!(kind, InteractionKind::Structured);
            assert_eq!(sql, "SELECT \"name\" FROM \"public\".\"emp\" LIMIT 2");
            assert_eq!(rows, 1);
            assert!(export.is_some());
            assert!(warnings.is_empty());
        }
        other => panic!("expected Executed, got {other:?}"),
    }

    assert_eq!(h.db.executed().len(), 1);
    assert_eq!(h.exporter.exports(), vec![("emp".to_string(), 1)]);

    let records = logged(&h);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, InteractionKind::Structured);
    assert_eq!(records[0].table.as_deref(), Some("emp"));
}

#[tokio::test]
async fn spec_merges_across_turns() {
    let mut h = harness(&["id", "name", "salary"]);

    h.controller
        .handle_line("schema: public, tablename: emp, columns: name")
        .await
        .unwrap();
    // Only the condition changes; columns are remembered.
    let outcome = h
        .controller
        .handle_line("condition: salary>100")
        .await
        .unwrap();

    match outcome {
        Outcome::Executed { sql, .. } => {
            assert_eq!(
                sql,
                "SELECT \"name\" FROM \"public\".\"emp\" WHERE salary>100"
            );
        }
        other => panic!("expected Executed, got {other:?}"),
    }
}

#[tokio::test]
async fn usage_counts_selected_columns_only() {
    let mut h = harness(&["a", "b", "c"]);

    h.controller
        .handle_line("schema: public, tablename: emp, columns: a")
        .await
        .unwrap();
    h.controller.handle_line("columns: c").await.unwrap();

    let ranked = h.controller.store().state.usage.ranked("public.emp");
    assert_eq!(ranked.len(), 2);
    assert!(ranked.iter().all(|e| e.count == 1));
    assert!(!ranked.iter().any(|e| e.column == "b"));
}

#[tokio::test]
async fn raw_sql_bypasses_compiler_and_usage() {
    let mut h = harness(&["id", "name"]);

    let outcome = h
        .controller
        .handle_line("select name from somewhere")
        .await
        .unwrap();

    match outcome {
        Outcome::Executed { kind, sql, .. } => {
            assert_eq!(kind, InteractionKind::Raw);
            assert_eq!(sql, "select name from somewhere");
        }
        other => panic!("expected Executed, got {other:?}"),
    }

    // No context set, so the export falls back to an ad-hoc name.
    assert_eq!(h.exporter.exports()[0].0, "adhoc");
    assert!(h.controller.store().state.usage.is_empty());
}

#[tokio::test]
async fn ask_requires_context_and_passes_schema_hint() {
    let mut h = harness(&["id", "salary"]);

    let err = h
        .controller
        .handle_line("ask: who earns the most")
        .await
        .unwrap_err();
    assert!(matches!(err, QuillError::IncompleteContext));

    h.controller.handle_line("schema: public").await.unwrap();
    h.controller.handle_line("tablename: emp").await.unwrap();
    let outcome = h
        .controller
        .handle_line("ask: who earns the most")
        .await
        .unwrap();

    match outcome {
        Outcome::Executed { kind, sql, .. } => {
            assert_eq!(kind, InteractionKind::Natural);
            assert_eq!(sql, "SELECT salary FROM emp");
        }
        other => panic!("expected Executed, got {other:?}"),
    }

    let hints = h.translator.hints.lock().unwrap().clone();
    assert_eq!(hints, vec!["emp(id, salary)".to_string()]);
    // Translated executions never touch the usage counters.
    assert!(h.controller.store().state.usage.is_empty());
}

#[tokio::test]
async fn incomplete_context_creates_no_spec() {
    let mut h = harness(&["id"]);

    let err = h.controller.handle_line("columns: id").await.unwrap_err();
    assert!(matches!(err, QuillError::IncompleteContext));
    assert!(h.controller.store().state.specs.is_empty());
    assert!(h.db.executed().is_empty());
    assert!(logged(&h).is_empty());
}

#[tokio::test]
async fn invalid_limit_warns_and_is_dropped() {
    let mut h = harness(&["id"]);

    let outcome = h
        .controller
        .handle_line("schema: public, tablename: emp, limit: ten")
        .await
        .unwrap();

    match outcome {
        Outcome::Executed { sql, warnings, .. } => {
            assert!(!sql.contains("LIMIT"));
            assert_eq!(warnings.len(), 1);
        }
        other => panic!("expected Executed, got {other:?}"),
    }
}

#[tokio::test]
async fn unresolvable_columns_are_a_hard_error() {
    let mut h = harness(&["id", "name"]);

    let err = h
        .controller
        .handle_line("schema: public, tablename: emp, columns: ghost")
        .await
        .unwrap_err();

    assert!(matches!(err, QuillError::NoColumnsResolved { .. }));
    assert!(h.db.executed().is_empty());
    assert!(logged(&h).is_empty());
}

#[tokio::test]
async fn reflection_failure_aborts_before_execution() {
    let mut h = harness(&["id"]);

    let err = h
        .controller
        .handle_line("schema: public, tablename: missing, columns: id")
        .await
        .unwrap_err();
    assert!(matches!(err, QuillError::Reflection { .. }));
    assert!(h.db.executed().is_empty());
    // The directive itself was still merged into memory.
    assert!(h.controller.store().state.specs.contains_key("public.missing"));
}

#[tokio::test]
async fn column_listing_sets_active_table() {
    let mut h = harness(&["id", "name"]);

    let err = h
        .controller
        .handle_line("list all columns of emp")
        .await
        .unwrap_err();
    assert!(matches!(err, QuillError::IncompleteContext));

    h.controller.handle_line("schema: public").await.unwrap();
    let outcome = h
        .controller
        .handle_line("show all columns of emp")
        .await
        .unwrap();

    match outcome {
        Outcome::Columns { table, columns } => {
            assert_eq!(table, "public.emp");
            assert_eq!(columns, vec!["id".to_string(), "name".to_string()]);
        }
        other => panic!("expected Columns, got {other:?}"),
    }
    assert_eq!(
        h.controller.store().state.context.table.as_deref(),
        Some("emp")
    );
}

#[tokio::test]
async fn meta_commands_roundtrip() {
    let mut h = harness(&["id", "name"]);

    h.controller
        .handle_line("schema: public, tablename: emp, columns: name")
        .await
        .unwrap();

    match h.controller.handle_line("/memory").await.unwrap() {
        Outcome::Memory { context, spec } => {
            assert_eq!(context.table.as_deref(), Some("emp"));
            let (key, spec) = spec.expect("spec remembered");
            assert_eq!(key, "public.emp");
            assert_eq!(spec.columns, "name");
        }
        other => panic!("expected Memory, got {other:?}"),
    }

    match h.controller.handle_line("/analytics").await.unwrap() {
        Outcome::Analytics(summary) => {
            assert_eq!(summary.len(), 1);
            assert_eq!(summary[0].0, "public.emp");
        }
        other => panic!("expected Analytics, got {other:?}"),
    }

    match h.controller.handle_line("/log").await.unwrap() {
        Outcome::History(records) => assert_eq!(records.len(), 1),
        other => panic!("expected History, got {other:?}"),
    }

    assert!(matches!(
        h.controller.handle_line("/reset").await.unwrap(),
        Outcome::ResetDone
    ));
    assert!(h.controller.store().state.specs.is_empty());
    assert!(h.controller.store().state.usage.is_empty());

    assert!(matches!(
        h.controller.handle_line("/bogus").await.unwrap(),
        Outcome::UnknownMeta(cmd) if cmd == "bogus"
    ));
}
