//! Query compiler — resolves a table's remembered specification plus live
//! reflected column metadata into an executable SQL statement.
//!
//! Column resolution keeps only requested names that exactly match a
//! reflected column; non-matching tokens are silently dropped (directives
//! are expected to be redundant and exploratory, so this is deliberate,
//! tested behavior rather than an error). An empty resolved set is the hard
//! error `NoColumnsResolved`, distinct from an unresolved context.
//!
//! `condition` and `order` are appended verbatim — no structural validation.
//! That trust boundary is a confirmed design choice for an operator tool;
//! see DESIGN.md.

use crate::error::QuillError;
use crate::session::store::TableQuerySpec;

/// An executable query description.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Final SQL text.
    pub sql: String,
    /// Columns resolved against the reflected schema, in selection order.
    pub columns: Vec<String>,
    /// Parsed row limit, when one applied.
    pub limit: Option<u64>,
    /// Non-fatal degradations (e.g. an unparseable limit that was dropped).
    pub warnings: Vec<String>,
}

/// Compile a spec against the live column list for `schema.table`.
pub fn compile(
    schema: &str,
    table: &str,
    spec: &TableQuerySpec,
    live_columns: &[String],
) -> Result<CompiledQuery, QuillError> {
    let mut warnings = Vec::new();

    let columns = resolve_columns(&spec.columns, live_columns);
    if columns.is_empty() {
        return Err(QuillError::NoColumnsResolved {
            table: format!("{schema}.{table}"),
            requested: spec.columns.clone(),
        });
    }

    let limit = match &spec.limit {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                // A single malformed field degrades gracefully.
                tracing::warn!("invalid limit '{raw}', skipping");
                warnings.push(format!("invalid limit '{raw}', skipping"));
                None
            }
        },
        None => None,
    };

    let select_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "SELECT {select_list} FROM {}.{}",
        quote_ident(schema),
        quote_ident(table)
    );
    if let Some(condition) = &spec.condition {
        sql.push_str(" WHERE ");
        sql.push_str(condition);
    }
    if let Some(order) = &spec.order {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {n}"));
    }

    Ok(CompiledQuery {
        sql,
        columns,
        limit,
        warnings,
    })
}

/// Resolve a columns spec against the reflected column list.
///
/// `"all"` (case-insensitive) selects every reflected column in the table's
/// natural order. Otherwise the spec is split on commas and only exact
/// matches are kept, in requested order.
fn resolve_columns(spec: &str, live_columns: &[String]) -> Vec<String> {
    if spec.eq_ignore_ascii_case("all") {
        return live_columns.to_vec();
    }
    spec.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter(|token| live_columns.iter().any(|c| c == token))
        .map(String::from)
        .collect()
}

/// Double-quote an identifier, escaping embedded quotes.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
