//! Keyword-based document classification.

use crate::models::statement::DocumentType;

const BANK_STATEMENT_KEYWORDS: &[&str] = &[
    "bank statement",
    "account statement",
    "statement of account",
    "opening balance",
    "closing balance",
    "chequing",
    "checking account",
    "savings account",
    "relevé de compte",
    "relevé bancaire",
    "solde d'ouverture",
    "solde de clôture",
];

const CREDIT_CARD_KEYWORDS: &[&str] = &[
    "credit card",
    "card statement",
    "minimum payment",
    "credit limit",
    "available credit",
    "carte de crédit",
    "paiement minimum",
];

const RECEIPT_KEYWORDS: &[&str] = &[
    "receipt",
    "subtotal",
    "cashier",
    "change due",
    "thank you for shopping",
    "reçu",
    "sous-total",
];

const INVOICE_KEYWORDS: &[&str] = &["invoice", "bill to", "amount due", "facture"];

/// Classify a document, preferring the caller's hint when one is given.
///
/// Keyword sets are checked in priority order, so a document mentioning both
/// "opening balance" and "credit limit" is a bank statement.
pub fn classify_document(text: &str, hint: Option<DocumentType>) -> DocumentType {
    if let Some(hint) = hint {
        return hint;
    }

    let lower = text.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if has_any(BANK_STATEMENT_KEYWORDS) {
        DocumentType::BankStatement
    } else if has_any(CREDIT_CARD_KEYWORDS) {
        DocumentType::CreditCardStatement
    } else if has_any(RECEIPT_KEYWORDS) {
        DocumentType::Receipt
    } else if has_any(INVOICE_KEYWORDS) {
        DocumentType::Invoice
    } else {
        DocumentType::Unknown
    }
}
