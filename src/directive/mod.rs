//! Directive parsing — classify operator input and extract field updates.

pub mod parser;

pub use parser::{classify, parse_fields, FieldUpdates, InputKind};
