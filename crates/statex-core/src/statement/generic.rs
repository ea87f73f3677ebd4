//! Layout-agnostic transaction parsing.
//!
//! Every line is scanned independently for a date, an amount, and whatever
//! text remains once those are cut out. Lines that do not yield all the
//! required pieces are dropped.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use super::rules::patterns::{REFERENCE, WHITESPACE};
use super::rules::{AmountExtractor, DateExtractor, FieldExtractor};
use crate::models::statement::{
    clamp_confidence, ExtractedAmount, ExtractedDate, Transaction, TransactionType,
};

/// Lines this short never hold a transaction.
const MIN_LINE_LEN: usize = 10;

/// Descriptions shorter than this carry too little signal.
const MIN_DESCRIPTION_LEN: usize = 3;

lazy_static! {
    /// Line keywords to transaction type, checked in order.
    static ref TYPE_KEYWORDS: Vec<(Regex, TransactionType)> = vec![
        (Regex::new(r"(?i)\b(?:deposits?|credits?|dépôts?)\b").unwrap(), TransactionType::Deposit),
        (Regex::new(r"(?i)\b(?:withdrawals?|debits?|retraits?)\b").unwrap(), TransactionType::Withdrawal),
        (Regex::new(r"(?i)transfer|virement").unwrap(), TransactionType::Transfer),
        (Regex::new(r"(?i)\b(?:payments?|paiement)\b").unwrap(), TransactionType::Payment),
        (Regex::new(r"(?i)\b(?:fees?|charges?|frais)\b").unwrap(), TransactionType::Fee),
        (Regex::new(r"(?i)\b(?:interest|intérêts?)\b").unwrap(), TransactionType::Interest),
    ];
}

/// Generic line-by-line transaction parser.
pub struct GenericTransactionParser {
    /// Reject lines without a date.
    strict_mode: bool,
    dates: DateExtractor,
    amounts: AmountExtractor,
}

impl GenericTransactionParser {
    pub fn new() -> Self {
        Self {
            strict_mode: false,
            dates: DateExtractor::new(),
            amounts: AmountExtractor::new(),
        }
    }

    /// Require a date on every transaction line.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Parse every line of the text, keeping document order.
    pub fn parse(&self, text: &str) -> Vec<Transaction> {
        text.lines()
            .map(str::trim)
            .filter(|line| line.chars().count() > MIN_LINE_LEN)
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    /// Parse a single line into a transaction.
    pub fn parse_line(&self, line: &str) -> Option<Transaction> {
        let dates = self.dates.extract_all(line);
        if self.strict_mode && dates.is_empty() {
            trace!("Dropping line without date: {}", line);
            return None;
        }

        let amounts = self.amounts.extract_all(line);
        if amounts.is_empty() {
            trace!("Dropping line without amount: {}", line);
            return None;
        }

        let mut spans: Vec<(usize, usize)> = dates
            .iter()
            .filter_map(|d| d.position)
            .chain(amounts.iter().filter_map(|a| a.position))
            .collect();
        spans.sort_unstable();

        let description = strip_spans(line, &spans);
        if description.chars().count() < MIN_DESCRIPTION_LEN {
            trace!("Dropping line with short description: {}", line);
            return None;
        }

        let running_balance = if amounts.len() >= 2 {
            amounts.last().cloned().map(ExtractedAmount::from)
        } else {
            None
        };
        let date: Option<ExtractedDate> = dates.into_iter().next().map(Into::into);
        let amount: ExtractedAmount = amounts.into_iter().next()?.into();

        let confidence = line_confidence(date.is_some(), &description);

        Some(Transaction {
            date,
            transaction_type: infer_transaction_type(line),
            reference: find_reference(line),
            merchant: None,
            suggested_category: None,
            running_balance,
            amount,
            description,
            confidence,
        })
    }
}

impl Default for GenericTransactionParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Type implied by keywords on the line; debit when nothing matches.
pub fn infer_transaction_type(line: &str) -> TransactionType {
    TYPE_KEYWORDS
        .iter()
        .find(|(pattern, _)| pattern.is_match(line))
        .map(|(_, transaction_type)| *transaction_type)
        .unwrap_or_default()
}

/// A `Ref`/`Conf #` style identifier containing at least one digit.
pub fn find_reference(line: &str) -> Option<String> {
    REFERENCE
        .captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|value| value.chars().any(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

fn line_confidence(has_date: bool, description: &str) -> u8 {
    let len = description.chars().count();
    let mut score = 40;
    if has_date {
        score += 30;
    }
    if len > 5 {
        score += 20;
    }
    if len > 15 {
        score += 10;
    }
    clamp_confidence(score)
}

/// Remove the given byte spans and tidy what is left.
fn strip_spans(line: &str, spans: &[(usize, usize)]) -> String {
    let mut kept = String::with_capacity(line.len());
    let mut cursor = 0;
    for &(start, end) in spans {
        if start >= cursor {
            kept.push_str(&line[cursor..start]);
            kept.push(' ');
        }
        cursor = cursor.max(end);
    }
    kept.push_str(&line[cursor..]);

    let collapsed = WHITESPACE.replace_all(&kept, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ',' | ':' | ';' | '|' | '/'))
        .to_string()
}
