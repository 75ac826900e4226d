//! Append-only interaction log.

pub mod logger;

pub use logger::{InteractionKind, InteractionLog, InteractionRecord};
