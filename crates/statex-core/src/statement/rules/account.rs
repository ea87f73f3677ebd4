//! Account number and account detail extraction.
//!
//! Account numbers are masked as soon as they are matched; the unmasked
//! digits never leave this module, not even as match source text.

use regex::Regex;

use super::amounts::AmountExtractor;
use super::dates::DateExtractor;
use super::institution::extract_institution;
use super::patterns::{ACCOUNT_GROUPED, ACCOUNT_HOLDER, ACCOUNT_LABEL, BRANCH, COLUMN_GAP};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::statement::AccountInfo;

/// Keyword to account type, checked in order.
const ACCOUNT_TYPES: &[(&str, &str)] = &[
    ("line of credit", "Line of Credit"),
    ("marge de crédit", "Line of Credit"),
    ("credit card", "Credit Card"),
    ("carte de crédit", "Credit Card"),
    ("chequing", "Chequing"),
    ("checking", "Chequing"),
    ("compte chèques", "Chequing"),
    ("savings", "Savings"),
    ("épargne", "Savings"),
    ("business account", "Business"),
];

/// Account number extractor producing masked numbers.
pub struct AccountNumberExtractor;

impl AccountNumberExtractor {
    pub fn new() -> Self {
        Self
    }

    fn patterns() -> [(&'static Regex, u8); 2] {
        [(&*ACCOUNT_LABEL, 90), (&*ACCOUNT_GROUPED, 70)]
    }
}

impl Default for AccountNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AccountNumberExtractor {
    type Output = ExtractionMatch<String>;

    /// First acceptable number of the first pattern that yields one.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let claimed = claimed_spans(text);

        for (pattern, confidence) in Self::patterns() {
            for caps in pattern.captures_iter(text) {
                let number = caps.get(1).unwrap();
                if overlaps_any(&claimed, number.start(), number.end()) {
                    continue;
                }
                if let Some(masked) = mask_if_account(number.as_str()) {
                    return Some(
                        ExtractionMatch::new(masked.clone(), confidence, masked)
                            .with_position(number.start(), number.end()),
                    );
                }
            }
        }
        None
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let claimed = claimed_spans(text);
        let mut results: Vec<Self::Output> = Vec::new();

        for (pattern, confidence) in Self::patterns() {
            for caps in pattern.captures_iter(text) {
                let number = caps.get(1).unwrap();
                if overlaps_any(&claimed, number.start(), number.end())
                    || results.iter().any(|r| r.overlaps(number.start(), number.end()))
                {
                    continue;
                }
                if let Some(masked) = mask_if_account(number.as_str()) {
                    results.push(
                        ExtractionMatch::new(masked.clone(), confidence, masked)
                            .with_position(number.start(), number.end()),
                    );
                }
            }
        }

        results.sort_by_key(|r| r.position.map(|(start, _)| start));
        results
    }
}

/// Spans already read as dates or amounts; digits there are never account numbers.
fn claimed_spans(text: &str) -> Vec<(usize, usize)> {
    let dates = DateExtractor::new().extract_all(text).into_iter().filter_map(|m| m.position);
    let amounts = AmountExtractor::new().extract_all(text).into_iter().filter_map(|m| m.position);
    dates.chain(amounts).collect()
}

fn overlaps_any(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| s < end && start < e)
}

fn mask_if_account(raw: &str) -> Option<String> {
    let digit_count = raw.chars().filter(|c| c.is_ascii_digit()).count();
    (3..=16)
        .contains(&digit_count)
        .then(|| mask_account_number(raw))
}

/// Mask an account number down to its last four digits.
///
/// Separators are dropped; one `*` replaces each hidden digit. Numbers of
/// four digits or fewer are returned as-is.
pub fn mask_account_number(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 4 {
        return digits.into_iter().collect();
    }

    let hidden = digits.len() - 4;
    let mut masked = "*".repeat(hidden);
    masked.extend(&digits[hidden..]);
    masked
}

/// Gather every account detail found in the text.
pub fn extract_account_info(text: &str) -> AccountInfo {
    let lower = text.to_lowercase();

    AccountInfo {
        account_number_masked: AccountNumberExtractor::new().extract(text).map(|m| m.value),
        institution_name: extract_institution(text),
        account_type: ACCOUNT_TYPES
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, account_type)| account_type.to_string()),
        account_holder: labelled_value(&ACCOUNT_HOLDER, text),
        branch: labelled_value(&BRANCH, text),
    }
}

/// Value after a label, cut at the next column gap.
fn labelled_value(pattern: &Regex, text: &str) -> Option<String> {
    let caps = pattern.captures(text)?;
    let value = COLUMN_GAP.split(caps.get(1)?.as_str()).next()?.trim();
    (value.chars().count() >= 2).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_ten_digits() {
        assert_eq!(mask_account_number("1234567890"), "******7890");
        assert_eq!(mask_account_number("1234-567890"), "******7890");
    }

    #[test]
    fn test_short_numbers_unmasked() {
        assert_eq!(mask_account_number("123"), "123");
        assert_eq!(mask_account_number("1234"), "1234");
    }

    #[test]
    fn test_labelled_account() {
        let result = AccountNumberExtractor::new()
            .extract("Account Number: 1234-567890  Page 1")
            .unwrap();
        assert_eq!(result.value, "******7890");
        assert_eq!(result.source, "******7890");
        assert_eq!(result.confidence, 90);
    }

    #[test]
    fn test_three_digit_account_returned_as_is() {
        let result = AccountNumberExtractor::new().extract("Account: 123").unwrap();
        assert_eq!(result.value, "123");
    }

    #[test]
    fn test_grouped_digits_without_label() {
        let result = AccountNumberExtractor::new()
            .extract("Your chequing 01234 5678901 summary")
            .unwrap();
        assert_eq!(result.value, "********8901");
        assert_eq!(result.confidence, 70);
    }

    #[test]
    fn test_dates_are_not_account_numbers() {
        let extractor = AccountNumberExtractor::new();
        assert!(
            extractor
                .extract("Monthly account statement\n2024-02-01 E-TRANSFER TO JOHN 150.00")
                .is_none()
        );
        assert!(extractor.extract_all("Posted 2024-02-01 and 2024-02-15").is_empty());
    }

    #[test]
    fn test_label_does_not_cross_lines() {
        let info = extract_account_info("Savings Account\n2024-02-01 DEPOSIT 150.00");
        assert_eq!(info.account_number_masked, None);
        assert_eq!(info.account_type.as_deref(), Some("Savings"));
    }

    #[test]
    fn test_store_number_beside_amount_ignored() {
        assert!(
            AccountNumberExtractor::new()
                .extract("POS PURCHASE LOBLAWS #1234 85.20")
                .is_none()
        );
    }

    #[test]
    fn test_too_long_rejected() {
        assert!(
            AccountNumberExtractor::new()
                .extract("Account: 12345678901234567")
                .is_none()
        );
    }

    #[test]
    fn test_extract_account_info() {
        let text = "TD Canada Trust\nEvery Day Chequing Account\nAccount holder: JANE DOE\nBranch: 01234  Main St\nAccount: 9876543210";
        let info = extract_account_info(text);
        assert_eq!(info.account_number_masked.as_deref(), Some("******3210"));
        assert_eq!(info.institution_name.as_deref(), Some("TD Canada Trust"));
        assert_eq!(info.account_type.as_deref(), Some("Chequing"));
        assert_eq!(info.account_holder.as_deref(), Some("JANE DOE"));
        assert_eq!(info.branch.as_deref(), Some("01234"));
    }
}
