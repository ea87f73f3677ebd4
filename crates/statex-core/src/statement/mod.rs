//! Statement transaction extraction.

pub mod banks;
pub mod generic;
pub mod metadata;
mod parser;
pub mod reconcile;
pub mod refine;
pub mod rules;

pub use parser::{HybridStatementParser, StatementParser};
