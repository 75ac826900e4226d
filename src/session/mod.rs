//! Session state — active context, per-table query memory, column usage,
//! and the controller that routes operator input through them.

pub mod controller;
pub mod store;
pub mod usage;

pub use controller::{Controller, Outcome};
pub use store::{ActiveContext, MemoryStore, ResolvedSpec, SessionState, TableQuerySpec};
pub use usage::{ColumnUsage, UsageEntry};
