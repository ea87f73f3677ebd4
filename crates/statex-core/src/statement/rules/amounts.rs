//! Amount extraction for statement text.

use std::str::FromStr;

use regex::Match;
use rust_decimal::Decimal;

use super::patterns::{AMOUNT_BARE, AMOUNT_MARKER_AFTER, AMOUNT_MARKER_BEFORE};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::statement::{Currency, ExtractedAmount};

/// Base confidence for scanned amounts.
pub const AMOUNT_CONFIDENCE: u8 = 80;

/// A parsed amount with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl From<ExtractionMatch<Money>> for ExtractedAmount {
    fn from(m: ExtractionMatch<Money>) -> Self {
        let amount = ExtractedAmount::new(m.source, m.value.amount, m.value.currency, m.confidence);
        match m.position {
            Some((start, _)) => amount.with_offset(start),
            None => amount,
        }
    }
}

/// Amount field extractor.
///
/// All three patterns contribute candidates; overlapping spans keep the
/// candidate from the earlier pattern so a currency marker is not lost to
/// the bare-number pattern. Zero and unparseable values are dropped.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// A raw match awaiting numeric filtering.
struct Candidate<'t> {
    full: Match<'t>,
    number: Match<'t>,
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Money>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut candidates: Vec<Candidate> = Vec::new();

        for caps in AMOUNT_MARKER_BEFORE.captures_iter(text) {
            push_candidate(&mut candidates, caps.get(0).unwrap(), caps.get(2).unwrap());
        }

        for caps in AMOUNT_MARKER_AFTER.captures_iter(text) {
            push_candidate(&mut candidates, caps.get(0).unwrap(), caps.get(1).unwrap());
        }

        for caps in AMOUNT_BARE.captures_iter(text) {
            let full = caps.get(0).unwrap();
            if !is_embedded_number(text, full.start(), full.end()) {
                push_candidate(&mut candidates, full, caps.get(1).unwrap());
            }
        }

        candidates.sort_by_key(|c| c.full.start());

        candidates
            .into_iter()
            .filter_map(|c| {
                let amount = parse_amount_text(c.number.as_str())?;
                if amount <= Decimal::ZERO {
                    return None;
                }
                let money = Money {
                    amount,
                    currency: detect_currency(c.full.as_str()),
                };
                Some(
                    ExtractionMatch::new(money, AMOUNT_CONFIDENCE, c.full.as_str())
                        .with_position(c.full.start(), c.full.end()),
                )
            })
            .collect()
    }
}

fn push_candidate<'t>(candidates: &mut Vec<Candidate<'t>>, full: Match<'t>, number: Match<'t>) {
    let overlaps = candidates
        .iter()
        .any(|c| c.full.start() < full.end() && full.start() < c.full.end());
    if !overlaps {
        candidates.push(Candidate { full, number });
    }
}

/// Parse an amount token such as `$1,234.56`, `-45.00`, `(12.00)` or `7.50 CR`.
///
/// Leading/trailing minus signs and parentheses yield a negative value.
pub fn parse_amount_text(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    let negative =
        trimmed.contains('-') || (trimmed.starts_with('(') && trimmed.ends_with(')'));

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

/// Decide the currency of a matched amount.
///
/// `USD`, `US$`, or a `$` not preceded by `C` means US dollars; everything
/// else, including bare numbers, is Canadian.
pub fn detect_currency(matched: &str) -> Currency {
    let upper = matched.to_uppercase();
    if upper.contains("USD") || upper.contains("US$") {
        return Currency::Usd;
    }
    if upper.contains("CAD") || upper.contains("C$") || upper.contains("CA$") {
        return Currency::Cad;
    }
    if upper.contains('$') {
        Currency::Usd
    } else {
        Currency::Cad
    }
}

/// A bare number that is really part of a dotted date, a ratio, or a percentage.
fn is_embedded_number(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let mut after = text[end..].chars();
    let next = after.next();
    let next_digit = after.next().is_some_and(|c| c.is_ascii_digit());

    matches!(before, Some('.' | '/'))
        || matches!(next, Some('%'))
        || (matches!(next, Some('.' | '/')) && next_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_dollar_sign_is_usd() {
        let result = AmountExtractor::new().extract("$45.00").unwrap();
        assert_eq!(result.value.amount, dec("45.00"));
        assert_eq!(result.value.currency, Currency::Usd);
        assert_eq!(result.confidence, AMOUNT_CONFIDENCE);
    }

    #[test]
    fn test_canadian_marker_is_cad() {
        let results = AmountExtractor::new().extract_all("C$45.00");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value.currency, Currency::Cad);
        assert_eq!(results[0].source, "C$45.00");
    }

    #[test]
    fn test_bare_number_defaults_to_cad() {
        let result = AmountExtractor::new().extract("45.00").unwrap();
        assert_eq!(result.value.currency, Currency::Cad);
    }

    #[test]
    fn test_marker_after_number() {
        let results = AmountExtractor::new().extract_all("paid 12.50 USD and 1,000.00 CAD");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].value.currency, Currency::Usd);
        assert_eq!(results[1].value.amount, dec("1000.00"));
        assert_eq!(results[1].value.currency, Currency::Cad);
    }

    #[test]
    fn test_thousands_separators_stripped() {
        let result = AmountExtractor::new().extract("Balance 1,234,567.89").unwrap();
        assert_eq!(result.value.amount, dec("1234567.89"));
    }

    #[test]
    fn test_zero_rejected() {
        assert!(AmountExtractor::new().extract("$0.00").is_none());
    }

    #[test]
    fn test_embedded_numbers_skipped() {
        assert!(AmountExtractor::new().extract("Rate 2.50% on 03.04.2024").is_none());
    }

    #[test]
    fn test_results_in_text_order_with_offsets() {
        let results = AmountExtractor::new().extract_all("4.50 then $7.25");
        let offsets: Vec<Option<(usize, usize)>> = results.iter().map(|r| r.position).collect();
        assert_eq!(offsets, vec![Some((0, 4)), Some((10, 15))]);

        let extracted: ExtractedAmount = results[1].clone().into();
        assert_eq!(extracted.source_offset, Some(10));
    }

    #[test]
    fn test_parse_amount_text() {
        assert_eq!(parse_amount_text("$1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount_text("-45.00"), Some(dec("-45.00")));
        assert_eq!(parse_amount_text("(12.00)"), Some(dec("-12.00")));
        assert_eq!(parse_amount_text("7.50 CR"), Some(dec("7.50")));
        assert_eq!(parse_amount_text("abc"), None);
    }
}
