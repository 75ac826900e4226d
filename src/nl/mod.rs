//! Natural-language-to-SQL translation collaborator.

pub mod translator;

pub use translator::{OpenAiTranslator, SqlTranslator, UnconfiguredTranslator};
