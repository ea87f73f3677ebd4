//! Statement data models exchanged with the processing collaborators.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, StatexError};

/// Clamp a raw score into the 0-100 confidence range.
pub fn clamp_confidence(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

/// A calendar date with no time or timezone component.
///
/// Construction rejects impossible dates such as February 30th.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Build a date, returning `None` when it does not exist on the calendar.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Layout a date was recognized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// 03/14/2024
    MmDdYyyy,
    /// 14/03/2024
    DdMmYyyy,
    /// 2024-03-14
    YyyyMmDd,
    /// March 14, 2024
    MonthDdYyyy,
    /// 14 March 2024
    DdMonthYyyy,
}

/// Currency of an extracted amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cad,
    Usd,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Cad => write!(f, "CAD"),
            Currency::Usd => write!(f, "USD"),
        }
    }
}

/// A monetary amount found in the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedAmount {
    /// Text the amount was read from.
    pub raw_text: String,

    /// Parsed value.
    pub amount: Decimal,

    /// Detected currency (CAD unless a USD marker is present).
    pub currency: Currency,

    /// Confidence score (0 - 100).
    pub confidence: u8,

    /// Byte offset of the match in the scanned text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_offset: Option<usize>,
}

impl ExtractedAmount {
    pub fn new(raw_text: impl Into<String>, amount: Decimal, currency: Currency, confidence: u8) -> Self {
        Self {
            raw_text: raw_text.into(),
            amount,
            currency,
            confidence: confidence.min(100),
            source_offset: None,
        }
    }

    /// An amount derived from other figures rather than read from the text.
    pub fn computed(amount: Decimal, confidence: u8) -> Self {
        Self::new("computed", amount, Currency::default(), confidence)
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.source_offset = Some(offset);
        self
    }
}

/// A calendar date found in the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDate {
    /// Text the date was read from.
    pub raw_text: String,

    /// Parsed date.
    pub date: CalendarDate,

    /// Format the date was interpreted with.
    pub format: DateFormat,

    /// Confidence score (0 - 100).
    pub confidence: u8,
}

/// Account details found on the statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Account number masked to its last four digits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number_masked: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_holder: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl AccountInfo {
    /// Check if any account detail was found.
    pub fn is_empty(&self) -> bool {
        self.account_number_masked.is_none()
            && self.institution_name.is_none()
            && self.account_type.is_none()
            && self.account_holder.is_none()
            && self.branch.is_none()
    }
}

/// Direction and nature of a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[default]
    Debit,
    Credit,
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
    Fee,
    Interest,
}

impl TransactionType {
    /// Whether money flows into the account.
    pub fn is_credit(&self) -> bool {
        matches!(
            self,
            TransactionType::Credit | TransactionType::Deposit | TransactionType::Interest
        )
    }

    /// Apply the direction of this type to a non-negative amount.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        if self.is_credit() { amount } else { -amount }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Debit => "debit",
            TransactionType::Credit => "credit",
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::Payment => "payment",
            TransactionType::Fee => "fee",
            TransactionType::Interest => "interest",
        };
        write!(f, "{s}")
    }
}

/// A single statement line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Posting date; absent when the line carried no valid date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<ExtractedDate>,

    pub description: String,

    /// Always non-negative; the direction is carried by `transaction_type`.
    pub amount: ExtractedAmount,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_balance: Option<ExtractedAmount>,

    /// Confidence score (0 - 100).
    pub confidence: u8,
}

impl Transaction {
    /// Amount with the sign implied by the transaction type.
    pub fn signed_amount(&self) -> Decimal {
        self.transaction_type.signed(self.amount.amount)
    }

    pub fn has_date(&self) -> bool {
        self.date.is_some()
    }
}

/// Kind of financial document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    BankStatement,
    CreditCardStatement,
    Receipt,
    Invoice,
    FinancialSummary,
    #[default]
    Unknown,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentType::BankStatement => "bank_statement",
            DocumentType::CreditCardStatement => "credit_card_statement",
            DocumentType::Receipt => "receipt",
            DocumentType::Invoice => "invoice",
            DocumentType::FinancialSummary => "financial_summary",
            DocumentType::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl FromStr for DocumentType {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "bank_statement" => Ok(DocumentType::BankStatement),
            "credit_card_statement" => Ok(DocumentType::CreditCardStatement),
            "receipt" => Ok(DocumentType::Receipt),
            "invoice" => Ok(DocumentType::Invoice),
            "financial_summary" => Ok(DocumentType::FinancialSummary),
            "unknown" => Ok(DocumentType::Unknown),
            _ => Err(ExtractionError::Parse {
                field: "document type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Document-level facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub document_type: DocumentType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<CalendarDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<CalendarDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_date: Option<CalendarDate>,

    pub page_count: u32,

    /// Two-letter language code ("en" or "fr").
    pub language: String,

    /// Text quality score (0 - 100).
    pub quality_score: f32,
}

/// Bucketed overall confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    pub fn from_score(score: f32) -> Self {
        if score >= 80.0 {
            ConfidenceLevel::High
        } else if score >= 60.0 {
            ConfidenceLevel::Medium
        } else if score >= 40.0 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::VeryLow => "very_low",
        };
        write!(f, "{s}")
    }
}

/// A document handed over by the OCR collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    /// OCR output.
    pub raw_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_document_type: Option<DocumentType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_hint: Option<String>,

    /// Echo the raw text back in the result.
    #[serde(default)]
    pub include_raw_text: bool,

    /// Require a date on every candidate transaction line.
    #[serde(default)]
    pub strict_mode: bool,
}

impl ParseRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Self::default()
        }
    }

    /// Decode a request from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, StatexError> {
        let request: Self = serde_json::from_str(json)?;
        Ok(request)
    }

    pub fn with_document_type(mut self, document_type: DocumentType) -> Self {
        self.expected_document_type = Some(document_type);
        self
    }

    pub fn with_bank_hint(mut self, bank: impl Into<String>) -> Self {
        self.bank_name_hint = Some(bank.into());
        self
    }

    pub fn with_language_hint(mut self, language: impl Into<String>) -> Self {
        self.language_hint = Some(language.into());
        self
    }

    pub fn with_raw_text(mut self, include: bool) -> Self {
        self.include_raw_text = include;
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }
}

/// Everything extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub metadata: DocumentMetadata,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_info: Option<AccountInfo>,

    /// Transactions in document order.
    pub transactions: Vec<Transaction>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_balance: Option<ExtractedAmount>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_balance: Option<ExtractedAmount>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_credits: Option<ExtractedAmount>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_debits: Option<ExtractedAmount>,

    /// Present only when the request asked for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,

    /// Code of the bank whose layout was recognized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_bank: Option<String>,

    #[serde(default)]
    pub warnings: Vec<String>,

    pub overall_confidence: ConfidenceLevel,

    pub processing_time_ms: u64,
}

impl ParseResult {
    /// Decode a result from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, StatexError> {
        let result: Self = serde_json::from_str(json)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_date_rejects_invalid() {
        assert!(CalendarDate::new(2024, 2, 30).is_none());
        assert!(CalendarDate::new(2023, 2, 29).is_none());
        assert!(CalendarDate::new(2024, 2, 29).is_some());
    }

    #[test]
    fn test_calendar_date_serializes_as_iso() {
        let date = CalendarDate::new(2024, 3, 5).unwrap();
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-03-05\"");
        assert_eq!(date.to_string(), "2024-03-05");
    }

    #[test]
    fn test_transaction_type_sign() {
        let amount = Decimal::new(5000, 2);
        assert_eq!(TransactionType::Deposit.signed(amount), amount);
        assert_eq!(TransactionType::Debit.signed(amount), -amount);
        assert_eq!(TransactionType::Fee.signed(amount), -amount);
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceLevel::from_score(92.5), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(60.0), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(45.0), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(10.0), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn test_document_type_parsing() {
        assert_eq!(
            "credit-card-statement".parse::<DocumentType>().unwrap(),
            DocumentType::CreditCardStatement
        );
        assert!("bank".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{"rawText":"hello","bankNameHint":"TD","strictMode":true}"#;
        let request = ParseRequest::from_json(json).unwrap();
        assert_eq!(request.raw_text, "hello");
        assert_eq!(request.bank_name_hint.as_deref(), Some("TD"));
        assert!(request.strict_mode);
        assert!(!request.include_raw_text);
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(130), 100);
        assert_eq!(clamp_confidence(-5), 0);
        assert_eq!(clamp_confidence(85), 85);
    }
}
