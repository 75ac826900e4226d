//! Context & memory store — the persistent session state.
//!
//! Holds the active schema/table context and, per table, the last-known
//! query specification. State is one JSON document, written synchronously
//! after every mutation and loaded once at startup; a missing file is empty
//! state. There are no process-wide singletons — the store is passed by
//! reference into each component call.
//!
//! The state file is not safe for concurrent multi-process writers; this is
//! an accepted limitation.

use crate::config;
use crate::directive::FieldUpdates;
use crate::error::QuillError;
use crate::session::usage::ColumnUsage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The currently selected schema and table, independent of any one table's
/// remembered query shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveContext {
    pub schema: Option<String>,
    pub table: Option<String>,
}

impl ActiveContext {
    /// `"schema.table"` key, available only when both halves are set.
    pub fn key(&self) -> Option<String> {
        match (&self.schema, &self.table) {
            (Some(s), Some(t)) => Some(format!("{s}.{t}")),
            _ => None,
        }
    }
}

/// Remembered query shape for one schema-qualified table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableQuerySpec {
    /// `"all"` or a comma list of column names.
    pub columns: String,
    /// Raw filter fragment, appended verbatim at compile time.
    pub condition: Option<String>,
    /// Raw ordering fragment, appended verbatim at compile time.
    pub order: Option<String>,
    /// Row limit, kept as text and parsed at compile time.
    pub limit: Option<String>,
}

impl Default for TableQuerySpec {
    fn default() -> Self {
        Self {
            columns: "all".to_string(),
            condition: None,
            order: None,
            limit: None,
        }
    }
}

/// The full persisted session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub context: ActiveContext,
    #[serde(default)]
    pub specs: BTreeMap<String, TableQuerySpec>,
    #[serde(default)]
    pub usage: ColumnUsage,
}

/// A directive resolved against the store — everything the compiler needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpec {
    pub schema: String,
    pub table: String,
    pub key: String,
    pub spec: TableQuerySpec,
}

/// Filesystem-backed session store.
pub struct MemoryStore {
    path: PathBuf,
    pub state: SessionState,
}

impl MemoryStore {
    /// Load state from the given file. A missing file is empty state.
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("failed to read state file: {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("corrupt state file: {}", path.display()))?
        } else {
            SessionState::default()
        };

        tracing::debug!(
            "memory store opened: {} table specs from {}",
            state.specs.len(),
            path.display()
        );

        Ok(Self { path, state })
    }

    /// Open the default store at `~/.quill/memory.json`.
    pub fn default_store() -> Result<Self> {
        Self::open(config::memory_path())
    }

    /// Merge a directive's field updates into the session state.
    ///
    /// `schema`/`tablename` update the active context first and persist
    /// independently of any spec. If either half of the context is still
    /// unset afterwards, the directive fails with `IncompleteContext` and no
    /// spec is created. Otherwise the table's spec is created with defaults
    /// on first reference, the fields present in `updates` overwrite it
    /// (merge-by-presence — absent fields keep their last value), and the
    /// full state is persisted synchronously.
    pub fn apply(&mut self, updates: &FieldUpdates) -> Result<ResolvedSpec, QuillError> {
        let context_touched = updates.schema.is_some() || updates.tablename.is_some();
        if let Some(schema) = &updates.schema {
            self.state.context.schema = Some(schema.clone());
        }
        if let Some(table) = &updates.tablename {
            self.state.context.table = Some(table.clone());
        }

        let key = match self.state.context.key() {
            Some(key) => key,
            None => {
                // Supplied context fields stay applied (and persisted), but
                // there is no table to attach the rest of the directive to.
                if context_touched {
                    self.persist()?;
                }
                return Err(QuillError::IncompleteContext);
            }
        };

        let spec = self.state.specs.entry(key.clone()).or_default();
        if let Some(columns) = &updates.columns {
            spec.columns = columns.clone();
        }
        if let Some(condition) = &updates.condition {
            spec.condition = Some(condition.clone());
        }
        if let Some(order) = &updates.order {
            spec.order = Some(order.clone());
        }
        if let Some(limit) = &updates.limit {
            spec.limit = Some(limit.clone());
        }

        let resolved = ResolvedSpec {
            schema: self.state.context.schema.clone().unwrap_or_default(),
            table: self.state.context.table.clone().unwrap_or_default(),
            key: key.clone(),
            spec: spec.clone(),
        };

        self.persist()?;
        Ok(resolved)
    }

    /// Set context fields directly (a lone `schema:`/`tablename:` line).
    pub fn set_context(
        &mut self,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> Result<(), QuillError> {
        if let Some(s) = schema {
            self.state.context.schema = Some(s.to_string());
        }
        if let Some(t) = table {
            self.state.context.table = Some(t.to_string());
        }
        self.persist()
    }

    /// Record column usage for a compiled execution and persist.
    pub fn record_usage(&mut self, key: &str, columns: &[String]) -> Result<(), QuillError> {
        self.state.usage.record(key, columns);
        self.persist()
    }

    /// The spec currently remembered for the active table, if any.
    pub fn active_spec(&self) -> Option<(String, &TableQuerySpec)> {
        let key = self.state.context.key()?;
        let spec = self.state.specs.get(&key)?;
        Some((key, spec))
    }

    /// Clear everything and remove the state file. Idempotent, never fails.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
        tracing::info!("session memory reset");
    }

    /// Write the full state to disk synchronously.
    pub fn persist(&self) -> Result<(), QuillError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(QuillError::state)?;
        }
        let data = serde_json::to_string_pretty(&self.state).map_err(QuillError::state)?;
        fs::write(&self.path, data).map_err(QuillError::state)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> MemoryStore {
        MemoryStore::open(dir.path().join("memory.json")).unwrap()
    }

    fn updates(pairs: &[(&str, &str)]) -> FieldUpdates {
        let mut u = FieldUpdates::default();
        for (name, value) in pairs {
            let value = Some(value.to_string());
            match *name {
                "schema" => u.schema = value,
                "tablename" => u.tablename = value,
                "columns" => u.columns = value,
                "condition" => u.condition = value,
                "order" => u.order = value,
                "limit" => u.limit = value,
                _ => unreachable!(),
            }
        }
        u
    }

    #[test]
    fn test_incomplete_context_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let err = store.apply(&updates(&[("columns", "a,b")])).unwrap_err();
        assert!(matches!(err, QuillError::IncompleteContext));
        assert!(store.state.specs.is_empty(), "no spec may be created");
    }

    #[test]
    fn test_partial_context_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let err = store.apply(&updates(&[("schema", "public")])).unwrap_err();
        assert!(matches!(err, QuillError::IncompleteContext));
        // The supplied half of the context stays applied and persisted.
        assert_eq!(store.state.context.schema.as_deref(), Some("public"));

        let reopened = MemoryStore::open(store.path().to_path_buf()).unwrap();
        assert_eq!(reopened.state.context.schema.as_deref(), Some("public"));
    }

    #[test]
    fn test_merge_by_presence() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store
            .apply(&updates(&[
                ("schema", "public"),
                ("tablename", "emp"),
                ("columns", "name,email"),
            ]))
            .unwrap();
        // Later directive touches only the condition.
        let resolved = store
            .apply(&updates(&[("condition", "city='Chennai'")]))
            .unwrap();

        assert_eq!(resolved.key, "public.emp");
        assert_eq!(resolved.spec.columns, "name,email");
        assert_eq!(resolved.spec.condition.as_deref(), Some("city='Chennai'"));
        assert!(resolved.spec.order.is_none());

        // Most recent explicit value wins.
        let resolved = store.apply(&updates(&[("columns", "id")])).unwrap();
        assert_eq!(resolved.spec.columns, "id");
        assert_eq!(resolved.spec.condition.as_deref(), Some("city='Chennai'"));
    }

    #[test]
    fn test_defaults_on_first_reference() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let resolved = store
            .apply(&updates(&[("schema", "public"), ("tablename", "emp")]))
            .unwrap();
        assert_eq!(resolved.spec.columns, "all");
        assert!(resolved.spec.condition.is_none());
        assert!(resolved.spec.limit.is_none());
    }

    #[test]
    fn test_context_switch_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store
            .apply(&updates(&[
                ("schema", "public"),
                ("tablename", "a"),
                ("columns", "x"),
            ]))
            .unwrap();
        store
            .apply(&updates(&[("tablename", "b"), ("columns", "y")]))
            .unwrap();
        // Switch back — a's spec is untouched.
        let resolved = store.apply(&updates(&[("tablename", "a")])).unwrap();
        assert_eq!(resolved.spec.columns, "x");
        assert_eq!(store.state.specs["public.b"].columns, "y");
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        let mut store = MemoryStore::open(path.clone()).unwrap();
        store
            .apply(&updates(&[
                ("schema", "public"),
                ("tablename", "emp"),
                ("columns", "name"),
                ("limit", "5"),
            ]))
            .unwrap();
        store
            .record_usage("public.emp", &["name".to_string()])
            .unwrap();
        let saved = store.state.clone();

        // Simulated restart.
        let reloaded = MemoryStore::open(path).unwrap();
        assert_eq!(reloaded.state, saved);
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("nope.json")).unwrap();
        assert_eq!(store.state, SessionState::default());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store
            .apply(&updates(&[("schema", "public"), ("tablename", "emp")]))
            .unwrap();
        assert!(store.path().exists());

        store.reset();
        let after_once = store.state.clone();
        assert!(!store.path().exists());

        store.reset();
        assert_eq!(store.state, after_once);
        assert_eq!(store.state, SessionState::default());
    }
}
