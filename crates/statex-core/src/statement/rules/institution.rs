//! Financial institution detection.

use lazy_static::lazy_static;
use regex::Regex;

use super::{ExtractionMatch, FieldExtractor};

/// Known Canadian banks and card networks, in priority order.
const INSTITUTIONS: &[(&str, &str)] = &[
    ("royal bank of canada", "Royal Bank of Canada"),
    ("rbc", "Royal Bank of Canada"),
    ("td canada trust", "TD Canada Trust"),
    ("toronto-dominion", "TD Canada Trust"),
    ("td bank", "TD Canada Trust"),
    ("scotiabank", "Scotiabank"),
    ("bank of nova scotia", "Scotiabank"),
    ("bank of montreal", "BMO Bank of Montreal"),
    ("bmo", "BMO Bank of Montreal"),
    ("cibc", "CIBC"),
    ("canadian imperial bank", "CIBC"),
    ("national bank", "National Bank of Canada"),
    ("banque nationale", "National Bank of Canada"),
    ("desjardins", "Desjardins"),
    ("tangerine", "Tangerine"),
    ("simplii", "Simplii Financial"),
    ("eq bank", "EQ Bank"),
    ("hsbc", "HSBC Bank Canada"),
    ("laurentian bank", "Laurentian Bank"),
    ("atb financial", "ATB Financial"),
    ("american express", "American Express"),
    ("amex", "American Express"),
    ("mastercard", "Mastercard"),
    ("visa", "Visa"),
];

lazy_static! {
    static ref INSTITUTION_PATTERNS: Vec<(Regex, &'static str)> = INSTITUTIONS
        .iter()
        .map(|(keyword, name)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
            (Regex::new(&pattern).unwrap(), *name)
        })
        .collect();
}

/// Institution name extractor.
pub struct InstitutionExtractor;

impl InstitutionExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InstitutionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InstitutionExtractor {
    type Output = ExtractionMatch<String>;

    /// The first list entry present anywhere in the text wins.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        INSTITUTION_PATTERNS.iter().find_map(|(pattern, name)| {
            pattern.find(text).map(|m| {
                ExtractionMatch::new(name.to_string(), 90, m.as_str())
                    .with_position(m.start(), m.end())
            })
        })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();
        for (pattern, name) in INSTITUTION_PATTERNS.iter() {
            if results.iter().any(|r| r.value == *name) {
                continue;
            }
            if let Some(m) = pattern.find(text) {
                results.push(
                    ExtractionMatch::new(name.to_string(), 90, m.as_str())
                        .with_position(m.start(), m.end()),
                );
            }
        }
        results
    }
}

/// Canonical name of the first known institution mentioned in the text.
pub fn extract_institution(text: &str) -> Option<String> {
    InstitutionExtractor::new().extract(text).map(|m| m.value)
}
