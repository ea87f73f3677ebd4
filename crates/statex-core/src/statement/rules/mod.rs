//! Rule-based field extractors for statement text.

pub mod account;
pub mod amounts;
pub mod dates;
pub mod institution;
pub mod patterns;

pub use account::{extract_account_info, mask_account_number, AccountNumberExtractor};
pub use amounts::{detect_currency, parse_amount_text, AmountExtractor, Money};
pub use dates::{parse_date_with_format, DateExtractor, DateValue};
pub use institution::{extract_institution, InstitutionExtractor};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0 - 100).
    pub confidence: u8,
    /// Byte span in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: u8, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence: confidence.min(100),
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Whether this match shares any byte with the given span.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.position
            .is_some_and(|(s, e)| s < end && start < e)
    }
}
