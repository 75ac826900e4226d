//! Output helpers — global flag checks and outcome rendering.
//!
//! Global flags are propagated via environment variables so every module
//! can check them without threading a config through.

use crate::session::store::TableQuerySpec;
use crate::session::Outcome;

pub fn is_json() -> bool {
    std::env::var("QUILL_JSON").is_ok()
}

pub fn is_quiet() -> bool {
    std::env::var("QUILL_QUIET").is_ok()
}

pub fn is_verbose() -> bool {
    std::env::var("QUILL_VERBOSE").is_ok()
}

pub fn print_json(value: &serde_json::Value) {
    println!("{value}");
}

/// Render a controller outcome for the operator.
pub fn render(outcome: &Outcome) {
    if is_json() {
        print_json(&outcome_json(outcome));
        return;
    }

    match outcome {
        Outcome::ContextUpdated { schema, table } => {
            if let Some(s) = schema {
                eprintln!("  Schema set to: {s}");
            }
            if let Some(t) = table {
                eprintln!("  Table set to: {t}");
            }
        }
        Outcome::Columns { table, columns } => {
            eprintln!("  Columns in {table}:");
            for column in columns {
                eprintln!("    - {column}");
            }
        }
        Outcome::Executed {
            kind,
            sql,
            rows,
            export,
            warnings,
        } => {
            for warning in warnings {
                eprintln!("  Warning: {warning}");
            }
            if !is_quiet() {
                eprintln!("  [{kind}] {sql}");
            }
            if *rows == 0 {
                eprintln!("  No rows returned.");
            } else {
                eprintln!("  {rows} row(s).");
            }
            if let Some(path) = export {
                eprintln!("  Saved: {}", path.display());
            }
        }
        Outcome::Memory { context, spec } => {
            eprintln!("  Schema: {}", context.schema.as_deref().unwrap_or("-"));
            eprintln!("  Table : {}", context.table.as_deref().unwrap_or("-"));
            match spec {
                Some((key, spec)) => {
                    eprintln!("  Spec for {key}:");
                    render_spec(spec);
                }
                None => eprintln!("  No remembered spec for the active table."),
            }
        }
        Outcome::History(records) => {
            if records.is_empty() {
                eprintln!("  No interactions logged yet.");
            }
            for r in records {
                eprintln!("  [{}] {} -> {}", r.timestamp, r.kind, r.prompt);
            }
        }
        Outcome::Analytics(summary) => {
            if summary.is_empty() {
                eprintln!("  No column usage recorded yet.");
            }
            for (table, entries) in summary {
                eprintln!("  {table}");
                for e in entries {
                    eprintln!("    {:<24} {}", e.column, e.count);
                }
            }
        }
        Outcome::ResetDone => eprintln!("  Memory reset."),
        Outcome::Help => print_help(),
        Outcome::UnknownMeta(command) => {
            eprintln!("  Unknown command '/{command}'. Type /help for commands.");
        }
    }
}

fn render_spec(spec: &TableQuerySpec) {
    eprintln!("    columns  : {}", spec.columns);
    eprintln!("    condition: {}", spec.condition.as_deref().unwrap_or("-"));
    eprintln!("    order    : {}", spec.order.as_deref().unwrap_or("-"));
    eprintln!("    limit    : {}", spec.limit.as_deref().unwrap_or("-"));
}

fn outcome_json(outcome: &Outcome) -> serde_json::Value {
    match outcome {
        Outcome::ContextUpdated { schema, table } => serde_json::json!({
            "context": { "schema": schema, "table": table }
        }),
        Outcome::Columns { table, columns } => serde_json::json!({
            "table": table, "columns": columns
        }),
        Outcome::Executed {
            kind,
            sql,
            rows,
            export,
            warnings,
        } => serde_json::json!({
            "kind": kind.to_string(),
            "sql": sql,
            "rows": rows,
            "export": export.as_ref().map(|p| p.display().to_string()),
            "warnings": warnings,
        }),
        Outcome::Memory { context, spec } => serde_json::json!({
            "schema": context.schema,
            "table": context.table,
            "spec": spec.as_ref().map(|(key, s)| serde_json::json!({
                "key": key,
                "columns": s.columns,
                "condition": s.condition,
                "order": s.order,
                "limit": s.limit,
            })),
        }),
        Outcome::History(records) => serde_json::json!({
            "log": records.iter().map(|r| serde_json::json!({
                "timestamp": r.timestamp,
                "kind": r.kind.to_string(),
                "prompt": r.prompt,
                "sql": r.sql,
            })).collect::<Vec<_>>()
        }),
        Outcome::Analytics(summary) => serde_json::json!({
            "usage": summary.iter().map(|(table, entries)| serde_json::json!({
                "table": table,
                "columns": entries.iter().map(|e| serde_json::json!({
                    "column": e.column, "count": e.count
                })).collect::<Vec<_>>(),
            })).collect::<Vec<_>>()
        }),
        Outcome::ResetDone => serde_json::json!({ "reset": true }),
        Outcome::Help => serde_json::json!({ "help": true }),
        Outcome::UnknownMeta(command) => serde_json::json!({
            "error": "unknown_command", "command": command
        }),
    }
}

/// The directive grammar, operator-facing.
pub fn print_help() {
    eprintln!();
    eprintln!("  Directives (comma-separated key:value, remembered per table):");
    eprintln!("    schema:public, tablename:employees");
    eprintln!("    columns:name,email      columns:all");
    eprintln!("    condition:city='Chennai'");
    eprintln!("    order:salary");
    eprintln!("    limit:50");
    eprintln!();
    eprintln!("  Other input:");
    eprintln!("    ask: <natural language prompt>");
    eprintln!("    select ...              raw SQL, passed through");
    eprintln!("    list all columns of <table>");
    eprintln!();
    eprintln!("  Commands:");
    for (name, desc, _) in crate::session::controller::META_COMMANDS {
        eprintln!("    /{name:<12} {desc}");
    }
    eprintln!();
}
