//! Balance reconciliation and overall confidence.

use regex::Regex;
use rust_decimal::Decimal;

use super::rules::amounts::AMOUNT_CONFIDENCE;
use super::rules::patterns::{CLOSING_BALANCE, OPENING_BALANCE, TOTAL_CREDITS, TOTAL_DEBITS};
use super::rules::{detect_currency, parse_amount_text};
use crate::models::statement::{ConfidenceLevel, ExtractedAmount, Transaction};

/// Confidence of totals computed from the transactions.
pub const COMPUTED_TOTAL_CONFIDENCE: u8 = 70;

/// Mean transaction confidence below which a warning is raised.
const LOW_MEAN_CONFIDENCE: f32 = 60.0;

/// Opening, closing, and total figures of a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Balances {
    pub opening: Option<ExtractedAmount>,
    pub closing: Option<ExtractedAmount>,
    pub total_credits: Option<ExtractedAmount>,
    pub total_debits: Option<ExtractedAmount>,
}

impl Balances {
    /// Locate labelled balances and totals without any bank knowledge.
    pub fn from_labels(text: &str) -> Self {
        Self {
            opening: labelled_amount(&OPENING_BALANCE, text, false),
            closing: labelled_amount(&CLOSING_BALANCE, text, false),
            total_credits: labelled_amount(&TOTAL_CREDITS, text, true),
            total_debits: labelled_amount(&TOTAL_DEBITS, text, true),
        }
    }

    /// Keep figures already found, fill the gaps from `other`.
    pub fn or(self, other: Balances) -> Self {
        Self {
            opening: self.opening.or(other.opening),
            closing: self.closing.or(other.closing),
            total_credits: self.total_credits.or(other.total_credits),
            total_debits: self.total_debits.or(other.total_debits),
        }
    }

    /// Compute any missing totals from the transactions.
    pub fn fill_totals(&mut self, transactions: &[Transaction]) {
        if transactions.is_empty() {
            return;
        }
        let (credits, debits) = sum_by_direction(transactions);
        if self.total_credits.is_none() {
            self.total_credits = Some(ExtractedAmount::computed(credits, COMPUTED_TOTAL_CONFIDENCE));
        }
        if self.total_debits.is_none() {
            self.total_debits = Some(ExtractedAmount::computed(debits, COMPUTED_TOTAL_CONFIDENCE));
        }
    }
}

fn labelled_amount(pattern: &Regex, text: &str, absolute: bool) -> Option<ExtractedAmount> {
    let caps = pattern.captures(text)?;
    let number = caps.get(1)?;
    let value = parse_amount_text(number.as_str())?;
    let value = if absolute { value.abs() } else { value };
    Some(
        ExtractedAmount::new(
            caps.get(0)?.as_str(),
            value,
            detect_currency(number.as_str()),
            AMOUNT_CONFIDENCE,
        )
        .with_offset(number.start()),
    )
}

/// Credits (money in) and debits (money out), both non-negative.
pub fn sum_by_direction(transactions: &[Transaction]) -> (Decimal, Decimal) {
    transactions
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(credits, debits), tx| {
            if tx.transaction_type.is_credit() {
                (credits + tx.amount.amount, debits)
            } else {
                (credits, debits + tx.amount.amount)
            }
        })
}

/// Opening balance carried forward through every transaction.
pub fn reconciled_balance(opening: Decimal, transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .fold(opening, |balance, tx| balance + tx.signed_amount())
}

/// Whether the reconciled and stated closing balances differ by more than 1%.
pub fn exceeds_tolerance(reconciled: Decimal, closing: Decimal) -> bool {
    (reconciled - closing).abs() > closing.abs() * Decimal::new(1, 2)
}

/// Warning when the stated balances do not reconcile with the transactions.
pub fn running_balance_warning(
    opening: Option<&ExtractedAmount>,
    closing: Option<&ExtractedAmount>,
    transactions: &[Transaction],
) -> Option<String> {
    let (opening, closing) = (opening?, closing?);
    if transactions.is_empty() {
        return None;
    }

    let reconciled = reconciled_balance(opening.amount, transactions);
    exceeds_tolerance(reconciled, closing.amount).then(|| {
        format!(
            "Balances do not reconcile: opening {} plus transactions gives {}, statement shows {}",
            opening.amount, reconciled, closing.amount
        )
    })
}

/// Overall score and level of a parse, plus the warnings that explain it.
#[derive(Debug, Clone, PartialEq)]
pub struct OverallConfidence {
    pub score: f32,
    pub level: ConfidenceLevel,
    pub warnings: Vec<String>,
}

/// Blend text quality with transaction confidence.
///
/// With no transactions the quality score stands alone, less 30. Otherwise
/// quality and the mean transaction confidence are averaged, and every
/// transaction without a date costs 10 points.
pub fn overall_confidence(quality_score: f32, transactions: &[Transaction]) -> OverallConfidence {
    let mut warnings = Vec::new();

    let score = if transactions.is_empty() {
        warnings.push("No transactions found".to_string());
        quality_score - 30.0
    } else {
        let mean = transactions
            .iter()
            .map(|tx| f32::from(tx.confidence))
            .sum::<f32>()
            / transactions.len() as f32;
        if mean < LOW_MEAN_CONFIDENCE {
            warnings.push(format!("Low average transaction confidence: {mean:.0}"));
        }

        let missing_dates = transactions.iter().filter(|tx| !tx.has_date()).count();
        if missing_dates > 0 {
            warnings.push(format!("{missing_dates} transaction(s) missing a valid date"));
        }

        (quality_score + mean) / 2.0 - 10.0 * missing_dates as f32
    };

    let score = score.clamp(0.0, 100.0);
    OverallConfidence {
        score,
        level: ConfidenceLevel::from_score(score),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::models::statement::{CalendarDate, DateFormat, ExtractedDate, TransactionType};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tx(amount: &str, transaction_type: TransactionType, confidence: u8, dated: bool) -> Transaction {
        Transaction {
            date: dated.then(|| ExtractedDate {
                raw_text: "2024-01-05".to_string(),
                date: CalendarDate::new(2024, 1, 5).unwrap(),
                format: DateFormat::YyyyMmDd,
                confidence: 85,
            }),
            description: "TEST".to_string(),
            amount: ExtractedAmount::computed(dec(amount), 80),
            transaction_type,
            reference: None,
            merchant: None,
            suggested_category: None,
            running_balance: None,
            confidence,
        }
    }

    #[test]
    fn test_reconciled_balance() {
        let txs = vec![
            tx("50.00", TransactionType::Debit, 90, true),
            tx("200.00", TransactionType::Credit, 90, true),
        ];
        assert_eq!(reconciled_balance(dec("1000.00"), &txs), dec("1150.00"));
        assert!(!exceeds_tolerance(dec("1150.00"), dec("1150.00")));
        assert!(!exceeds_tolerance(dec("1150.00"), dec("1160.00")));
        assert!(exceeds_tolerance(dec("1150.00"), dec("1300.00")));
    }

    #[test]
    fn test_running_balance_warning() {
        let txs = vec![tx("50.00", TransactionType::Fee, 90, true)];
        let opening = ExtractedAmount::computed(dec("100.00"), 80);
        let good = ExtractedAmount::computed(dec("50.00"), 80);
        let bad = ExtractedAmount::computed(dec("75.00"), 80);

        assert!(running_balance_warning(Some(&opening), Some(&good), &txs).is_none());
        assert!(running_balance_warning(Some(&opening), Some(&bad), &txs).is_some());
        assert!(running_balance_warning(None, Some(&bad), &txs).is_none());
    }

    #[test]
    fn test_labelled_balances() {
        let text = "Opening balance $1,000.00\nTotal deposits 200.00\nTotal withdrawals 50.00\nClosing balance (150.00)";
        let balances = Balances::from_labels(text);
        assert_eq!(balances.opening.unwrap().amount, dec("1000.00"));
        assert_eq!(balances.closing.unwrap().amount, dec("-150.00"));
        assert_eq!(balances.total_credits.unwrap().amount, dec("200.00"));
        assert_eq!(balances.total_debits.unwrap().amount, dec("50.00"));
    }

    #[test]
    fn test_labelled_balances_with_dates() {
        let text = "Previous balance as of 2024-01-01  1,000.00\nNew balance on Jan 31, 2024  $1,150.00";
        let balances = Balances::from_labels(text);
        assert_eq!(balances.opening.unwrap().amount, dec("1000.00"));
        assert_eq!(balances.closing.unwrap().amount, dec("1150.00"));
    }

    #[test]
    fn test_computed_totals() {
        let txs = vec![
            tx("50.00", TransactionType::Withdrawal, 90, true),
            tx("200.00", TransactionType::Deposit, 90, true),
            tx("5.00", TransactionType::Interest, 90, true),
        ];
        let mut balances = Balances::default();
        balances.fill_totals(&txs);

        let credits = balances.total_credits.unwrap();
        assert_eq!(credits.amount, dec("205.00"));
        assert_eq!(credits.confidence, COMPUTED_TOTAL_CONFIDENCE);
        assert_eq!(balances.total_debits.unwrap().amount, dec("50.00"));
    }

    #[test]
    fn test_overall_without_transactions() {
        let overall = overall_confidence(90.0, &[]);
        assert_eq!(overall.score, 60.0);
        assert_eq!(overall.level, ConfidenceLevel::Medium);
        assert_eq!(overall.warnings, vec!["No transactions found".to_string()]);
    }

    #[test]
    fn test_overall_blends_and_penalizes() {
        let txs = vec![
            tx("10.00", TransactionType::Debit, 40, false),
            tx("10.00", TransactionType::Debit, 60, true),
        ];
        let overall = overall_confidence(80.0, &txs);
        // (80 + 50) / 2 - 10
        assert_eq!(overall.score, 55.0);
        assert_eq!(overall.level, ConfidenceLevel::Low);
        assert_eq!(overall.warnings.len(), 2);
        assert!(overall.warnings[1].starts_with("1 transaction(s)"));
    }
}
