//! Keyword refinement for transactions parsed without a bank layout.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::statement::{Transaction, TransactionType};

/// Category used when no keyword matches.
pub const UNCATEGORIZED: &str = "uncategorized";

lazy_static! {
    /// Description keywords that pin down the transaction type, in order.
    static ref TYPE_REFINEMENTS: Vec<(Regex, TransactionType)> = vec![
        (Regex::new(r"(?i)\be-?transfer\b|\binterac\s+transfer\b|\bvirement\s+interac\b").unwrap(), TransactionType::Transfer),
        (Regex::new(r"(?i)\bpre-?auth|\bbill\s+(?:payment|pmt)\b|\bpaiement\s+de\s+facture\b").unwrap(), TransactionType::Payment),
        (Regex::new(r"(?i)\bint(?:erest)?\s+earned\b|\bintérêts?\s+gagnés?\b").unwrap(), TransactionType::Interest),
        (Regex::new(r"(?i)\bnsf\b|\bnfs\b|\bfees?\b|\bcharges?\b|\bfrais\b").unwrap(), TransactionType::Fee),
        (Regex::new(r"(?i)\bpayroll\b|\bdirect\s+dep(?:osit)?\b|\bpaie\b").unwrap(), TransactionType::Deposit),
    ];

    /// Description keywords to spending category; the first match wins.
    static ref CATEGORIES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)\b(?:grocery|groceries|loblaws|sobeys|safeway|metro|no\s+frills|iga|superstore|food\s+basics|freshco|épicerie)\b").unwrap(), "groceries"),
        (Regex::new(r"(?i)\b(?:gas|petro[- ]?canada|esso|shell|ultramar|uber|lyft|taxi|transit|presto|parking|via\s+rail)\b").unwrap(), "transportation"),
        (Regex::new(r"(?i)\b(?:restaurant|cafe|café|coffee|tim\s+hortons|starbucks|mcdonald'?s|pizza|sushi|doordash|skip\s+the\s+dishes|ubereats)\b").unwrap(), "restaurants"),
        (Regex::new(r"(?i)\b(?:hydro|enbridge|bell|rogers|telus|fido|videotron|vidéotron|utilit(?:y|ies)|internet|water)\b").unwrap(), "utilities"),
        (Regex::new(r"(?i)\b(?:fees?|nsf|interest|service\s+charge|atm|e-?transfer|frais)\b").unwrap(), "banking"),
        (Regex::new(r"(?i)\b(?:amazon|walmart|costco|canadian\s+tire|best\s+buy|ikea|winners|dollarama|hudson'?s\s+bay)\b").unwrap(), "shopping"),
        (Regex::new(r"(?i)\b(?:pharmacy|pharmacie|shoppers\s+drug|rexall|jean\s+coutu|dental|dentist|clinic|medical|physio)\b").unwrap(), "healthcare"),
        (Regex::new(r"(?i)\b(?:netflix|spotify|disney|cineplex|cinema|theatre|steam|playstation|xbox|crave)\b").unwrap(), "entertainment"),
    ];

    /// Payment channel prefixes that precede the merchant name.
    static ref CHANNEL_PREFIX: Regex = Regex::new(
        r"(?i)^(?:pos\s+(?:purchase|pur|pmt)?|interac\s+(?:purchase|retail|e-?transfer)?|visa\s+debit|debit\s+card|point\s+of\s+sale|pre-?auth(?:orized)?\s*(?:debit|pmt|payment)?|bill\s+(?:payment|pmt)|online\s+(?:banking|purchase)|e-?transfer|purchase|achat|paiement)\b[\s\-:#]*"
    ).unwrap();

    /// Trailing store numbers and card suffixes.
    static ref TRAILING_NOISE: Regex = Regex::new(
        r"(?i)(?:\s+(?:#\s?\d+|\d{3,}|x{2,}\d{2,4}|\*+\d{2,4}))+$"
    ).unwrap();
}

/// Type implied by description keywords, or the parsed type when none match.
pub fn refine_transaction_type(description: &str, parsed: TransactionType) -> TransactionType {
    TYPE_REFINEMENTS
        .iter()
        .find(|(pattern, _)| pattern.is_match(description))
        .map_or(parsed, |(_, refined)| *refined)
}

/// Spending category suggested by description keywords.
pub fn suggest_category(description: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(pattern, _)| pattern.is_match(description))
        .map_or(UNCATEGORIZED, |(_, category)| *category)
}

/// Merchant name left once channel prefixes and trailing numbers are gone.
pub fn derive_merchant(description: &str) -> Option<String> {
    let mut rest = description.trim();
    while let Some(prefix) = CHANNEL_PREFIX.find(rest) {
        if prefix.end() == 0 {
            break;
        }
        rest = rest[prefix.end()..].trim_start();
    }

    let merchant = TRAILING_NOISE.replace(rest, "");
    let merchant = merchant.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | '#'));

    let has_letters = merchant.chars().filter(|c| c.is_alphabetic()).count() >= 2;
    has_letters.then(|| merchant.to_string())
}

/// Apply type refinement, category, and merchant to generic transactions.
pub fn refine_transactions(transactions: &mut [Transaction]) {
    for tx in transactions.iter_mut() {
        tx.transaction_type = refine_transaction_type(&tx.description, tx.transaction_type);
        tx.suggested_category = Some(suggest_category(&tx.description).to_string());
        if tx.merchant.is_none() {
            tx.merchant = derive_merchant(&tx.description);
        }
    }
}
