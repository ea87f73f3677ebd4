//! Hybrid statement parser combining generic and bank-specific extraction.

use std::time::Instant;

use tracing::{debug, info};

use crate::document::{classify_document, normalize_text, unify_line_endings};
use crate::models::config::ParserConfig;
use crate::models::statement::{DocumentMetadata, ParseRequest, ParseResult};

use super::banks::detect_bank;
use super::generic::GenericTransactionParser;
use super::metadata::{
    detect_issued_date, detect_language, detect_page_count, detect_period, quality_score,
    sorted_dates,
};
use super::reconcile::{overall_confidence, running_balance_warning, Balances};
use super::refine::refine_transactions;
use super::rules::extract_account_info;

/// Quality bonus for text laid out the way a known bank prints it.
const RECOGNIZED_LAYOUT_BONUS: f32 = 10.0;

/// Trait for statement parsing.
pub trait StatementParser {
    /// Parse one document. Malformed text degrades the result but never fails.
    fn parse(&self, request: &ParseRequest) -> ParseResult;
}

/// Statement parser running generic extraction, then bank layout enhancement.
#[derive(Debug, Clone)]
pub struct HybridStatementParser {
    /// Require a date on every generic transaction line.
    strict_mode: bool,
    /// Always echo the raw text back.
    include_raw_text: bool,
    /// Language assumed when vocabulary counts tie.
    default_language: String,
}

impl HybridStatementParser {
    /// Create a new hybrid parser with default settings.
    pub fn new() -> Self {
        Self::from_config(&ParserConfig::default())
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            strict_mode: config.strict_mode,
            include_raw_text: config.include_raw_text,
            default_language: config.default_language.clone(),
        }
    }

    /// Set strict mode. Requests can still turn it on individually.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Set raw text echo. Requests can still ask for it individually.
    pub fn with_raw_text(mut self, include: bool) -> Self {
        self.include_raw_text = include;
        self
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Parse plain text with no hints.
    pub fn parse_text(&self, text: &str) -> ParseResult {
        self.parse(&ParseRequest::new(text))
    }
}

impl Default for HybridStatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for HybridStatementParser {
    fn parse(&self, request: &ParseRequest) -> ParseResult {
        let start = Instant::now();

        info!("Parsing statement from {} characters of text", request.raw_text.len());

        let text = normalize_text(&request.raw_text);
        let document_type = classify_document(&text, request.expected_document_type);
        debug!("Classified document as {}", document_type);

        let account_info = extract_account_info(&text);

        let strict = self.strict_mode || request.strict_mode;
        let mut transactions = GenericTransactionParser::new()
            .with_strict_mode(strict)
            .parse(&text);
        debug!("Generic parser found {} transactions", transactions.len());

        let bank = detect_bank(&text, request.bank_name_hint.as_deref());
        let mut balances = Balances::default();
        let mut enhanced = false;

        if let Some(profile) = bank {
            let bank_transactions =
                profile.extract_transactions(&unify_line_endings(&request.raw_text));
            if bank_transactions.is_empty() {
                debug!("No {} table rows found, keeping generic transactions", profile.code);
            } else {
                debug!(
                    "{} layout yielded {} transactions",
                    profile.code,
                    bank_transactions.len()
                );
                transactions = bank_transactions;
                enhanced = true;
            }

            let (opening, closing) = profile.extract_balances(&text);
            balances.opening = opening;
            balances.closing = closing;
        }

        if !enhanced {
            refine_transactions(&mut transactions);
        }

        let mut balances = balances.or(Balances::from_labels(&text));
        balances.fill_totals(&transactions);

        let mut quality = quality_score(&request.raw_text);
        if enhanced {
            quality = (quality + RECOGNIZED_LAYOUT_BONUS).min(100.0);
        }
        let quality = (quality * 10.0).round() / 10.0;

        let dates = sorted_dates(&text);
        let (period_start, period_end) = detect_period(&text, &dates);

        let metadata = DocumentMetadata {
            document_type,
            period_start,
            period_end,
            issued_date: detect_issued_date(&text),
            page_count: detect_page_count(&text),
            language: detect_language(
                &text,
                request.language_hint.as_deref(),
                &self.default_language,
            ),
            quality_score: quality,
        };

        let overall = overall_confidence(quality, &transactions);
        let mut warnings = overall.warnings;
        if let Some(warning) = running_balance_warning(
            balances.opening.as_ref(),
            balances.closing.as_ref(),
            &transactions,
        ) {
            warnings.push(warning);
        }

        let include_raw_text = self.include_raw_text || request.include_raw_text;

        let result = ParseResult {
            metadata,
            account_info: (!account_info.is_empty()).then_some(account_info),
            transactions,
            opening_balance: balances.opening,
            closing_balance: balances.closing,
            total_credits: balances.total_credits,
            total_debits: balances.total_debits,
            raw_text: include_raw_text.then(|| request.raw_text.clone()),
            detected_bank: bank.map(|p| p.code.to_string()),
            warnings,
            overall_confidence: overall.level,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Extracted {} transactions with {} confidence ({:.1})",
            result.transactions.len(),
            result.overall_confidence,
            overall.score
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::statement::{ConfidenceLevel, DocumentType, TransactionType};

    const TD_STATEMENT: &str = "TD Canada Trust\n\
        Every Day Chequing Account Statement\n\
        Account: 1234567890\n\
        Statement period: Jan 1, 2024 to Jan 31, 2024\n\
        Date Transaction Details CAD Balance\n\
        Jan 5, 2024  COFFEE SHOP PURCHASE  4.50  995.50\n\
        Closing Balance ... 995.50\n\
        Page 1 of 1";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_td_end_to_end() {
        let result = HybridStatementParser::new().parse_text(TD_STATEMENT);

        assert_eq!(result.detected_bank.as_deref(), Some("TD"));
        assert_eq!(result.transactions.len(), 1);

        let tx = &result.transactions[0];
        assert_eq!(tx.description, "COFFEE SHOP PURCHASE");
        assert_eq!(tx.amount.amount, dec("4.50"));
        assert_eq!(tx.transaction_type, TransactionType::Debit);
        assert_eq!(tx.confidence, 85);

        assert_eq!(result.closing_balance.as_ref().unwrap().amount, dec("995.50"));
        assert!(matches!(
            result.overall_confidence,
            ConfidenceLevel::High | ConfidenceLevel::Medium
        ));

        let account = result.account_info.as_ref().unwrap();
        assert_eq!(account.account_number_masked.as_deref(), Some("******7890"));
        assert_eq!(account.institution_name.as_deref(), Some("TD Canada Trust"));
        assert_eq!(result.metadata.document_type, DocumentType::BankStatement);
        assert_eq!(result.metadata.period_start.unwrap().to_string(), "2024-01-01");
        assert_eq!(result.metadata.period_end.unwrap().to_string(), "2024-01-31");
        assert_eq!(result.metadata.language, "en");
        assert_eq!(result.total_debits.as_ref().unwrap().amount, dec("4.50"));
        assert!(result.raw_text.is_none());
    }

    #[test]
    fn test_unmasked_number_never_serialized() {
        let result = HybridStatementParser::new().parse_text(TD_STATEMENT);
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("1234567890"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = HybridStatementParser::new();
        let request = ParseRequest::new(TD_STATEMENT).with_raw_text(true);

        let mut first = parser.parse(&request);
        let mut second = parser.parse(&request);
        first.processing_time_ms = 0;
        second.processing_time_ms = 0;

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first, second);
        assert_eq!(first.raw_text.as_deref(), Some(TD_STATEMENT));
    }

    #[test]
    fn test_generic_fallback_refines() {
        let text = "Monthly account statement\n\
            2024-02-01 E-TRANSFER TO JOHN 150.00\n\
            2024-02-03 POS PURCHASE LOBLAWS #1234 85.20\n\
            2024-02-05 PAYROLL ACME CORP 2,000.00";
        let result = HybridStatementParser::new().parse_text(text);

        assert!(result.detected_bank.is_none());
        assert_eq!(result.transactions.len(), 3);

        let types: Vec<TransactionType> =
            result.transactions.iter().map(|t| t.transaction_type).collect();
        assert_eq!(
            types,
            vec![
                TransactionType::Transfer,
                TransactionType::Debit,
                TransactionType::Deposit
            ]
        );
        assert_eq!(
            result.transactions[1].suggested_category.as_deref(),
            Some("groceries")
        );
        assert_eq!(result.transactions[1].merchant.as_deref(), Some("LOBLAWS"));
        assert_eq!(result.total_credits.as_ref().unwrap().amount, dec("2000.00"));
        assert_eq!(result.total_credits.as_ref().unwrap().confidence, 70);
    }

    #[test]
    fn test_bank_hint_enables_layout() {
        let text = "Date Transaction Details CAD Balance\n\
            Jan 5, 2024  COFFEE SHOP PURCHASE  4.50  995.50";
        let request = ParseRequest::new(text).with_bank_hint("td");
        let result = HybridStatementParser::new().parse(&request);

        assert_eq!(result.detected_bank.as_deref(), Some("TD"));
        assert_eq!(result.transactions[0].confidence, 85);
    }

    #[test]
    fn test_empty_text_degrades() {
        let result = HybridStatementParser::new().parse_text("");
        assert!(result.transactions.is_empty());
        assert_eq!(result.metadata.page_count, 1);
        assert_eq!(result.metadata.document_type, DocumentType::Unknown);
        assert!(result.warnings.contains(&"No transactions found".to_string()));
    }

    #[test]
    fn test_strict_mode_from_request() {
        let text = "Monthly account statement\nATM WITHDRAWAL DOWNTOWN 60.00";
        let parser = HybridStatementParser::new();

        assert_eq!(parser.parse_text(text).transactions.len(), 1);
        let strict = parser.parse(&ParseRequest::new(text).with_strict_mode(true));
        assert!(strict.transactions.is_empty());
    }

    #[test]
    fn test_balance_mismatch_warning() {
        let text = "Opening balance 1,000.00\n\
            2024-03-01 GROCERY STORE PURCHASE 50.00\n\
            Closing balance 1,300.00";
        let result = HybridStatementParser::new().parse_text(text);
        assert!(result.warnings.iter().any(|w| w.starts_with("Balances do not reconcile")));
    }

    fn round_tenth(score: f32) -> f32 {
        (score * 10.0).round() / 10.0
    }

    #[test]
    fn test_recognized_layout_adds_quality_bonus() {
        let text = "TD Canada Trust\n\
            Date Transaction Details\n\
            Jan 5, 2024  COFFEE SHOP  4.50  995.50";
        let result = HybridStatementParser::new().parse_text(text);

        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].confidence, 85);

        let base = quality_score(text);
        assert!(base + RECOGNIZED_LAYOUT_BONUS < 100.0);
        assert_eq!(
            result.metadata.quality_score,
            round_tenth(base + RECOGNIZED_LAYOUT_BONUS)
        );
    }

    #[test]
    fn test_layout_bonus_capped() {
        let result = HybridStatementParser::new().parse_text(TD_STATEMENT);
        assert!(quality_score(TD_STATEMENT) + RECOGNIZED_LAYOUT_BONUS > 100.0);
        assert_eq!(result.metadata.quality_score, 100.0);
    }

    #[test]
    fn test_detected_bank_without_table_keeps_generic() {
        let text = "TD Canada Trust\n\
            Monthly account statement\n\
            2024-02-03 POS PURCHASE LOBLAWS #1234 85.20\n\
            2024-02-05 PAYROLL ACME CORP 2,000.00";
        let result = HybridStatementParser::new().parse_text(text);

        assert_eq!(result.detected_bank.as_deref(), Some("TD"));
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(
            result.transactions[0].suggested_category.as_deref(),
            Some("groceries")
        );
        assert_eq!(result.transactions[1].transaction_type, TransactionType::Deposit);
        assert_eq!(result.metadata.quality_score, round_tenth(quality_score(text)));
        assert!(
            result
                .account_info
                .as_ref()
                .is_none_or(|a| a.account_number_masked.is_none())
        );
    }

    #[test]
    fn test_closing_balance_after_date() {
        let text = "TD Canada Trust\n\
            Opening Balance as of Jan 1, 2024  1,000.00\n\
            Closing Balance on Jan 31, 2024  995.50";
        let result = HybridStatementParser::new().parse_text(text);

        assert_eq!(result.opening_balance.as_ref().unwrap().amount, dec("1000.00"));
        assert_eq!(result.closing_balance.as_ref().unwrap().amount, dec("995.50"));
    }

    #[test]
    fn test_warnings_always_serialized() {
        let mut result = HybridStatementParser::new().parse_text(TD_STATEMENT);
        result.warnings.clear();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"warnings\":[]"));
    }

    #[test]
    fn test_language_and_document_type_hints() {
        let text = "2024-02-05 COFFEE 4.50";
        let parser = HybridStatementParser::new().with_default_language("fr");

        assert_eq!(parser.parse_text(text).metadata.language, "fr");

        let request = ParseRequest::new(text)
            .with_language_hint("en")
            .with_document_type(DocumentType::Receipt);
        let result = parser.parse(&request);
        assert_eq!(result.metadata.language, "en");
        assert_eq!(result.metadata.document_type, DocumentType::Receipt);
    }
}
