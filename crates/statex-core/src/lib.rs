//! Core library for bank statement text extraction.
//!
//! This crate provides:
//! - OCR text normalization and document classification
//! - Rule-based field extraction (dates, amounts, account numbers, institutions)
//! - Generic and bank-layout-aware transaction parsing
//! - Balance reconciliation, quality scoring, and post-hoc validation
//!
//! The pipeline is pure and synchronous: one [`ParseRequest`] in, one
//! [`ParseResult`] out, with no state shared between calls beyond the
//! read-only bank profile registry.

pub mod error;
pub mod models;
pub mod document;
pub mod statement;
pub mod validation;

pub use error::{ExtractionError, StatexError, Result};
pub use models::config::StatexConfig;
pub use models::statement::{
    AccountInfo, CalendarDate, ConfidenceLevel, Currency, DateFormat, DocumentMetadata,
    DocumentType, ExtractedAmount, ExtractedDate, ParseRequest, ParseResult, Transaction,
    TransactionType,
};
pub use document::{classify_document, normalize_text};
pub use statement::{HybridStatementParser, StatementParser};
pub use statement::banks::{BankCode, BankProfile};
pub use validation::{IssueType, ResultValidator, Severity, ValidationIssue, ValidationReport, validate};
