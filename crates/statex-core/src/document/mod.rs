//! Document-level preprocessing: text cleanup and classification.

mod classifier;
mod normalize;

pub use classifier::classify_document;
pub use normalize::{normalize_text, unify_line_endings};
