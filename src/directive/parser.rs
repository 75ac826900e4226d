//! Directive parser — classifies a raw input line and extracts `key:value`
//! field updates.
//!
//! Grammar (operator-facing):
//! ```text
//! line      := "ask:" free_text
//!            | listing
//!            | raw_sql                 (first word is SELECT, any case)
//!            | "/" meta_command
//!            | directive
//! listing   := ("list"|"show"|"print") "all" "column"["s"] [("of"|"from")] table
//! directive := pair (',' pair)*
//! pair      := name ':' value          (value = run of non-colon, non-comma chars)
//! name      := schema | tablename | columns | condition | order | limit
//! ```
//!
//! Parsing never fails: unknown field names and unmatched tokens are dropped,
//! never partially applied.

use regex::Regex;
use std::sync::OnceLock;

/// Classification of one line of operator input, in priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    /// `ask:` prefix — free-text prompt for the NL-to-SQL translator.
    Natural { prompt: String },
    /// "list all columns of <table>" style request.
    ColumnListing { table: String },
    /// Bare SQL starting with `select` — passed through untouched.
    RawSql { sql: String },
    /// A lone `schema:` or `tablename:` line — context update only.
    ContextOnly {
        schema: Option<String>,
        table: Option<String>,
    },
    /// `/reset`, `/memory`, `/log`, `/analytics`, `/help`, ...
    Meta { command: String, args: String },
    /// Comma-separated `key:value` directive.
    Structured { updates: FieldUpdates },
}

/// Typed partial-update record extracted from a structured directive.
///
/// Each field is `Some` only when the directive explicitly mentioned it, so
/// the store can merge by presence rather than by replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    pub schema: Option<String>,
    pub tablename: Option<String>,
    pub columns: Option<String>,
    pub condition: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
}

impl FieldUpdates {
    /// True when no recognized field was present at all.
    pub fn is_empty(&self) -> bool {
        self.schema.is_none()
            && self.tablename.is_none()
            && self.columns.is_none()
            && self.condition.is_none()
            && self.order.is_none()
            && self.limit.is_none()
    }
}

fn pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+):([^:,]+)").expect("pair regex is valid"))
}

fn listing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:list|show|print)\s+all\s+columns?\s+(?:of|from)?\s*(\w+)\s*$")
            .expect("listing regex is valid")
    })
}

/// Classify a line of input. Never fails.
pub fn classify(line: &str) -> InputKind {
    let trimmed = line.trim();
    let lower = trimmed.to_lowercase();

    if let Some(prompt) = trimmed.strip_prefix("ask:") {
        return InputKind::Natural {
            prompt: prompt.trim().to_string(),
        };
    }

    if let Some(caps) = listing_regex().captures(&lower) {
        return InputKind::ColumnListing {
            table: caps[1].to_string(),
        };
    }

    if lower.starts_with("select") {
        return InputKind::RawSql {
            sql: trimmed.to_string(),
        };
    }

    // A lone schema:/tablename: line updates context directly. A comma means
    // more fields follow, which makes it a structured directive instead.
    if !trimmed.contains(',') {
        if let Some(value) = strip_prefix_ci(trimmed, "schema:") {
            return InputKind::ContextOnly {
                schema: Some(value.trim().to_string()),
                table: None,
            };
        }
        if let Some(value) = strip_prefix_ci(trimmed, "tablename:") {
            return InputKind::ContextOnly {
                schema: None,
                table: Some(value.trim().to_string()),
            };
        }
    }

    if let Some(rest) = trimmed.strip_prefix('/') {
        let mut parts = rest.splitn(2, ' ');
        let command = parts.next().unwrap_or("").to_lowercase();
        let args = parts.next().unwrap_or("").trim().to_string();
        return InputKind::Meta { command, args };
    }

    InputKind::Structured {
        updates: parse_fields(trimmed),
    }
}

/// Case-insensitive prefix strip.
fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Extract recognized `name:value` pairs from a structured directive.
///
/// All whitespace is stripped first, then `name:value` tokens are scanned.
/// Unknown names are ignored for forward compatibility.
pub fn parse_fields(line: &str) -> FieldUpdates {
    let squeezed: String = line.chars().filter(|c| !c.is_whitespace()).collect();

    let mut updates = FieldUpdates::default();
    for caps in pair_regex().captures_iter(&squeezed) {
        let value = caps[2].to_string();
        match caps[1].to_lowercase().as_str() {
            "schema" => updates.schema = Some(value),
            "tablename" => updates.tablename = Some(value),
            "columns" => updates.columns = Some(value),
            "condition" => updates.condition = Some(value),
            "order" => updates.order = Some(value),
            "limit" => updates.limit = Some(value),
            _ => {} // unknown field — dropped
        }
    }
    updates
}
