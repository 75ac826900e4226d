//! Column usage accounting — how often each column was selected per table.
//!
//! Counts are incremented once per column per successful compiled execution.
//! Raw-SQL and natural-language executions never touch these counters (their
//! column set is unknown).
//!
//! Per-table entries are stored as an ordered list rather than a JSON object
//! so that first-seen order survives a persistence round-trip — `ranked`
//! breaks count ties by first-seen order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One column's usage count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub column: String,
    pub count: u64,
}

/// Per-table column usage, keyed by `"schema.table"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnUsage {
    tables: BTreeMap<String, Vec<UsageEntry>>,
}

impl ColumnUsage {
    /// Increment each column's count for the table key by one.
    pub fn record(&mut self, key: &str, columns: &[String]) {
        let entries = self.tables.entry(key.to_string()).or_default();
        for column in columns {
            match entries.iter_mut().find(|e| &e.column == column) {
                Some(entry) => entry.count += 1,
                None => entries.push(UsageEntry {
                    column: column.clone(),
                    count: 1,
                }),
            }
        }
    }

    /// Columns for a table, ordered by descending count. Ties keep
    /// first-seen order (the sort is stable over insertion order).
    pub fn ranked(&self, key: &str) -> Vec<UsageEntry> {
        let mut entries = self.tables.get(key).cloned().unwrap_or_default();
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }

    /// All table keys with recorded usage.
    pub fn table_keys(&self) -> impl Iterator<Item = &String> {
        self.tables.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}
