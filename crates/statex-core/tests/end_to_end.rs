//! End-to-end tests through the public API.

use std::str::FromStr;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use statex_core::{
    validate, ConfidenceLevel, Currency, DocumentType, HybridStatementParser, IssueType,
    ParseRequest, ParseResult, StatementParser, TransactionType,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

const RBC_STATEMENT: &str = "RBC Royal Bank\r\n\
    Personal Chequing Account Statement\r\n\
    Account number: 01234-5678901\r\n\
    From January 1, 2024 to January 31, 2024\r\n\
    Opening balance  $1,000.00\r\n\
    \r\n\
    \r\n\
    Date          Description              Withdrawals ($)   Deposits ($)   Balance ($)\r\n\
    Jan 3, 2024   PAYROLL DEPOSIT ACME                       200.00         1,200.00\r\n\
    Jan 9, 2024   INTERAC PURCHASE METRO   50.00                            1,150.00\r\n\
    Closing balance  $1,150.00\r\n\
    Page 1 of 2";

#[test]
fn rbc_statement_through_layout() {
    let request = ParseRequest::new(RBC_STATEMENT).with_raw_text(true);
    let result = HybridStatementParser::new().parse(&request);

    assert_eq!(result.detected_bank.as_deref(), Some("RBC"));
    assert_eq!(result.metadata.document_type, DocumentType::BankStatement);
    assert_eq!(result.metadata.page_count, 2);
    assert_eq!(result.metadata.period_start.unwrap().to_string(), "2024-01-01");
    assert_eq!(result.metadata.period_end.unwrap().to_string(), "2024-01-31");

    let types: Vec<TransactionType> =
        result.transactions.iter().map(|t| t.transaction_type).collect();
    assert_eq!(types, vec![TransactionType::Credit, TransactionType::Debit]);
    assert_eq!(result.transactions[0].amount.amount, dec("200.00"));
    assert_eq!(result.transactions[1].amount.amount, dec("50.00"));
    assert_eq!(result.transactions[1].description, "INTERAC PURCHASE METRO");

    let opening = result.opening_balance.as_ref().unwrap();
    assert_eq!(opening.amount, dec("1000.00"));
    assert_eq!(opening.currency, Currency::Usd);
    assert_eq!(result.closing_balance.as_ref().unwrap().amount, dec("1150.00"));

    let account = result.account_info.as_ref().unwrap();
    assert_eq!(account.account_number_masked.as_deref(), Some("********8901"));
    assert_eq!(account.account_type.as_deref(), Some("Chequing"));

    assert_eq!(result.raw_text.as_deref(), Some(RBC_STATEMENT));
    assert_eq!(result.overall_confidence, ConfidenceLevel::High);

    let report = validate(&result);
    assert!(report.is_valid);
    assert!(!report.has_issue(IssueType::BalanceMismatch));
}

#[test]
fn request_and_result_json_contract() {
    let json = r#"{
        "rawText": "Tangerine\nTransaction Date  Description  Amount  Balance\n01/15/2024  COFFEE  4.50  95.50",
        "expectedDocumentType": "bank_statement",
        "languageHint": "en"
    }"#;
    let request = ParseRequest::from_json(json).unwrap();
    assert!(!request.strict_mode);

    let result = HybridStatementParser::new().parse(&request);
    assert_eq!(result.detected_bank.as_deref(), Some("TANGERINE"));

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["metadata"]["documentType"], "bank_statement");
    assert_eq!(value["transactions"][0]["type"], "debit");
    assert_eq!(value["transactions"][0]["date"]["date"], "2024-01-15");
    assert_eq!(value["transactions"][0]["date"]["format"], "mm_dd_yyyy");
    assert_eq!(value["transactions"][0]["amount"]["currency"], "CAD");
    assert!(value.get("rawText").is_none());

    let back = ParseResult::from_json(&serde_json::to_string(&result).unwrap()).unwrap();
    assert_eq!(back, result);
}

#[test]
fn noisy_text_never_fails() {
    let inputs = [
        "",
        "\u{0}\u{1}\u{2}",
        "~~~~~~~~~~~~~~~~~~~~",
        "02/30/2024 IMPOSSIBLE DATE 10.00",
        "Page 999 of 1",
        "€€€ 12,34 €€€",
    ];
    let parser = HybridStatementParser::new();
    for input in inputs {
        let result = parser.parse_text(input);
        assert!(result.metadata.quality_score >= 0.0);
        assert!(result.metadata.quality_score <= 100.0);
        for tx in &result.transactions {
            assert!(tx.amount.amount >= Decimal::ZERO);
            assert!(tx.confidence <= 100);
        }
    }
}

#[test]
fn impossible_date_line_keeps_amount_without_date() {
    let result = HybridStatementParser::new().parse_text("02/30/2024 IMPOSSIBLE DATE 10.00");
    assert_eq!(result.transactions.len(), 1);
    assert!(result.transactions[0].date.is_none());
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w == "1 transaction(s) missing a valid date")
    );
}
