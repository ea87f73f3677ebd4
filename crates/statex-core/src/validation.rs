//! Post-hoc validation of finished parse results.
//!
//! Validation is a separate pass: it never changes the result, it scores it
//! and explains what looks wrong.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::config::ValidationConfig;
use crate::models::statement::ParseResult;
use crate::statement::reconcile::{exceeds_tolerance, reconciled_balance};

const NO_TRANSACTIONS_PENALTY: i32 = 40;
const LOW_CONFIDENCE_PENALTY: i32 = 5;
const MISSING_DATE_PENALTY: i32 = 3;
const BALANCE_MISMATCH_PENALTY: i32 = 20;

/// What a validation issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    NoTransactions,
    LowConfidence,
    MissingDate,
    BalanceMismatch,
    MissingBalance,
    MissingAccountInfo,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueType::NoTransactions => "no_transactions",
            IssueType::LowConfidence => "low_confidence",
            IssueType::MissingDate => "missing_date",
            IssueType::BalanceMismatch => "balance_mismatch",
            IssueType::MissingBalance => "missing_balance",
            IssueType::MissingAccountInfo => "missing_account_info",
        };
        write!(f, "{s}")
    }
}

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        write!(f, "{s}")
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: String,
    /// Result field the issue refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationIssue {
    fn new(issue_type: IssueType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity,
            message: message.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

/// Outcome of validating a parse result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Score from 0 to 100.
    pub validation_score: i32,
    pub issues: Vec<ValidationIssue>,
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    pub fn has_issue(&self, issue_type: IssueType) -> bool {
        self.issues.iter().any(|i| i.issue_type == issue_type)
    }
}

/// Scores parse results for completeness and consistency.
#[derive(Debug, Clone)]
pub struct ResultValidator {
    /// Transactions below this confidence are flagged.
    low_confidence_threshold: u8,
    /// Minimum score of a valid result.
    min_valid_score: i32,
}

impl ResultValidator {
    pub fn new() -> Self {
        Self::from_config(&ValidationConfig::default())
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            low_confidence_threshold: config.low_confidence_threshold,
            min_valid_score: config.min_valid_score,
        }
    }

    pub fn with_low_confidence_threshold(mut self, threshold: u8) -> Self {
        self.low_confidence_threshold = threshold;
        self
    }

    pub fn with_min_valid_score(mut self, score: i32) -> Self {
        self.min_valid_score = score;
        self
    }

    /// Validate a finished parse result.
    pub fn validate(&self, result: &ParseResult) -> ValidationReport {
        let mut score = 100;
        let mut issues = Vec::new();
        let transactions = &result.transactions;

        if transactions.is_empty() {
            score -= NO_TRANSACTIONS_PENALTY;
            issues.push(
                ValidationIssue::new(
                    IssueType::NoTransactions,
                    Severity::High,
                    "No transactions were extracted",
                )
                .with_field("transactions"),
            );
        }

        let low_confidence = transactions
            .iter()
            .filter(|tx| tx.confidence < self.low_confidence_threshold)
            .count();
        if low_confidence > 0 {
            score -= LOW_CONFIDENCE_PENALTY * low_confidence as i32;
            issues.push(
                ValidationIssue::new(
                    IssueType::LowConfidence,
                    Severity::Medium,
                    format!(
                        "{low_confidence} transaction(s) below {} confidence",
                        self.low_confidence_threshold
                    ),
                )
                .with_field("transactions"),
            );
        }

        let missing_dates = transactions.iter().filter(|tx| !tx.has_date()).count();
        if missing_dates > 0 {
            score -= MISSING_DATE_PENALTY * missing_dates as i32;
            issues.push(
                ValidationIssue::new(
                    IssueType::MissingDate,
                    Severity::Medium,
                    format!("{missing_dates} transaction(s) missing a valid date"),
                )
                .with_field("transactions.date"),
            );
        }

        match (&result.opening_balance, &result.closing_balance) {
            (Some(opening), Some(closing)) if !transactions.is_empty() => {
                let reconciled = reconciled_balance(opening.amount, transactions);
                if exceeds_tolerance(reconciled, closing.amount) {
                    score -= BALANCE_MISMATCH_PENALTY;
                    issues.push(
                        ValidationIssue::new(
                            IssueType::BalanceMismatch,
                            Severity::High,
                            format!(
                                "Reconciled balance {} differs from closing balance {}",
                                reconciled, closing.amount
                            ),
                        )
                        .with_field("closingBalance"),
                    );
                }
            }
            (Some(_), Some(_)) => {}
            (opening, _) => {
                let field = if opening.is_none() {
                    "openingBalance"
                } else {
                    "closingBalance"
                };
                issues.push(
                    ValidationIssue::new(
                        IssueType::MissingBalance,
                        Severity::Low,
                        "Opening or closing balance not found",
                    )
                    .with_field(field),
                );
            }
        }

        if result.account_info.as_ref().is_none_or(|info| info.is_empty()) {
            issues.push(
                ValidationIssue::new(
                    IssueType::MissingAccountInfo,
                    Severity::Low,
                    "No account details were found",
                )
                .with_field("accountInfo"),
            );
        }

        let score = score.clamp(0, 100);
        let has_high = issues.iter().any(|i| i.severity == Severity::High);
        let recommendations = recommendations(&issues);

        debug!("Validation score {} with {} issues", score, issues.len());

        ValidationReport {
            is_valid: score >= self.min_valid_score && !has_high,
            validation_score: score,
            issues,
            recommendations,
        }
    }
}

impl Default for ResultValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate with the default thresholds.
pub fn validate(result: &ParseResult) -> ValidationReport {
    ResultValidator::new().validate(result)
}

fn recommendations(issues: &[ValidationIssue]) -> Vec<String> {
    let mut recommendations: Vec<String> = Vec::new();
    for issue in issues {
        let text = match issue.issue_type {
            IssueType::NoTransactions => {
                "Check that the document is a statement and that the scan captured the transaction table"
            }
            IssueType::LowConfidence => "Review low-confidence transactions manually",
            IssueType::MissingDate => {
                "Rescan at a higher resolution or supply a bank hint so dates are read from the table layout"
            }
            IssueType::BalanceMismatch => {
                "Compare the transactions against the original document; some may be missing or misread"
            }
            IssueType::MissingBalance => {
                "Confirm the opening and closing balances by hand before reconciling"
            }
            IssueType::MissingAccountInfo => "Add the account details manually",
        };
        if !recommendations.iter().any(|r| r == text) {
            recommendations.push(text.to_string());
        }
    }
    recommendations
}
