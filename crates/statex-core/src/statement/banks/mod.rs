//! Bank profile registry.
//!
//! Each profile describes how one institution lays out its statements:
//! the table header that starts the transaction list, the labels used for
//! opening and closing balances, and the date formats found in the date
//! column. The registry is built once and never mutated.

mod enhancer;

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::statement::DateFormat;
use crate::models::statement::DateFormat::{DdMmYyyy, DdMonthYyyy, MmDdYyyy, MonthDdYyyy, YyyyMmDd};

/// Balance amount capture shared by every profile's balance labels.
const BALANCE_AMOUNT: &str = r"[^\n]{0,40}?(\(?-?\$?\s?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}\)?)";

const OPENING_KEYWORDS: &[&str] = &["beginning", "opening", "previous", "précédent", "ouverture"];
const CLOSING_KEYWORDS: &[&str] = &["ending", "closing", "current", "new", "clôture", "nouveau", "actuel"];

/// Supported banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BankCode {
    Rbc,
    Td,
    Scotia,
    Bmo,
    Cibc,
    National,
    Desjardins,
    Tangerine,
}

impl BankCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankCode::Rbc => "RBC",
            BankCode::Td => "TD",
            BankCode::Scotia => "SCOTIA",
            BankCode::Bmo => "BMO",
            BankCode::Cibc => "CIBC",
            BankCode::National => "NATIONAL",
            BankCode::Desjardins => "DESJARDINS",
            BankCode::Tangerine => "TANGERINE",
        }
    }
}

impl fmt::Display for BankCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which balance a label reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceKind {
    Opening,
    Closing,
}

impl BalanceKind {
    /// Classify a balance label pattern by the keywords in its source.
    pub fn from_pattern(source: &str) -> Option<Self> {
        let source = source.to_lowercase();
        if OPENING_KEYWORDS.iter().any(|k| source.contains(k)) {
            Some(BalanceKind::Opening)
        } else if CLOSING_KEYWORDS.iter().any(|k| source.contains(k)) {
            Some(BalanceKind::Closing)
        } else {
            None
        }
    }
}

/// Layout rules for one institution.
#[derive(Debug)]
pub struct BankProfile {
    pub code: BankCode,
    pub name: &'static str,
    /// Lowercase keywords identifying the institution.
    pub keywords: &'static [&'static str],
    /// Accepted date formats for the date column, in order.
    pub date_formats: &'static [DateFormat],
    header_patterns: Vec<Regex>,
    balance_patterns: Vec<(Regex, BalanceKind)>,
    keyword_patterns: Vec<Regex>,
}

impl BankProfile {
    fn new(
        code: BankCode,
        name: &'static str,
        keywords: &'static [&'static str],
        headers: &[&str],
        balance_labels: &[&str],
        date_formats: &'static [DateFormat],
    ) -> Self {
        let header_patterns = headers
            .iter()
            .map(|h| Regex::new(&format!("(?i){h}")).unwrap())
            .collect();

        let balance_patterns = balance_labels
            .iter()
            .filter_map(|label| {
                let kind = BalanceKind::from_pattern(label)?;
                let pattern = Regex::new(&format!("(?i){label}{BALANCE_AMOUNT}")).unwrap();
                Some((pattern, kind))
            })
            .collect();

        let keyword_patterns = keywords
            .iter()
            .map(|k| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(k))).unwrap())
            .collect();

        Self {
            code,
            name,
            keywords,
            date_formats,
            header_patterns,
            balance_patterns,
            keyword_patterns,
        }
    }

    /// Whether the line is this bank's transaction table header.
    pub fn is_header(&self, line: &str) -> bool {
        self.header_patterns.iter().any(|p| p.is_match(line))
    }

    /// Whether the text mentions this institution.
    pub fn matches_text(&self, text: &str) -> bool {
        self.keyword_patterns.iter().any(|p| p.is_match(text))
    }

    /// Balance label patterns with the balance each reports.
    pub fn balance_patterns(&self) -> &[(Regex, BalanceKind)] {
        &self.balance_patterns
    }

    fn matches_hint(&self, hint: &str) -> bool {
        let hint = hint.trim().to_lowercase();
        if hint.is_empty() {
            return false;
        }
        hint == self.code.as_str().to_lowercase()
            || hint == self.name.to_lowercase()
            || self.keywords.iter().any(|k| hint == *k || hint.contains(k))
    }
}

lazy_static! {
    static ref REGISTRY: Vec<BankProfile> = vec![
        BankProfile::new(
            BankCode::Rbc,
            "Royal Bank of Canada",
            &["royal bank of canada", "rbc royal bank", "rbc"],
            &[
                r"^date\s+description\s+withdrawals",
                r"^date\s+description\s+cheques\s*(?:&|and)\s*debits",
            ],
            &[r"opening\s+balance", r"closing\s+balance"],
            &[MonthDdYyyy, DdMonthYyyy, MmDdYyyy],
        ),
        BankProfile::new(
            BankCode::Td,
            "TD Canada Trust",
            &["td canada trust", "toronto-dominion", "td bank"],
            &[
                r"^date\s+transaction\s+details",
                r"^date\s+description\s+withdrawals\s+deposits",
            ],
            &[
                r"(?:opening|starting|previous)\s+balance",
                r"(?:closing|ending)\s+balance",
            ],
            &[MonthDdYyyy, MmDdYyyy, YyyyMmDd],
        ),
        BankProfile::new(
            BankCode::Scotia,
            "Scotiabank",
            &["scotiabank", "bank of nova scotia"],
            &[r"^date\s+transactions?\b.*\bwithdrawn"],
            &[r"opening\s+balance", r"closing\s+balance"],
            &[MonthDdYyyy, DdMonthYyyy, MmDdYyyy],
        ),
        BankProfile::new(
            BankCode::Bmo,
            "BMO Bank of Montreal",
            &["bank of montreal", "bmo"],
            &[r"^date\s+description\s+amounts?\s+deducted"],
            &[r"opening\s+balance", r"closing\s+(?:totals?|balance)"],
            &[MonthDdYyyy, MmDdYyyy],
        ),
        BankProfile::new(
            BankCode::Cibc,
            "CIBC",
            &["cibc", "canadian imperial bank of commerce"],
            &[r"^date\s+description\s+withdrawals\s*(?:\(\$\))?\s+deposits"],
            &[r"opening\s+balance", r"closing\s+balance"],
            &[MonthDdYyyy, MmDdYyyy, YyyyMmDd],
        ),
        BankProfile::new(
            BankCode::National,
            "National Bank of Canada",
            &["national bank", "banque nationale"],
            &[
                r"^date\s+(?:code\s+)?description\s+(?:withdrawals?|debits?)",
                r"^date\s+(?:code\s+)?description\s+retraits?",
            ],
            &[
                r"previous\s+balance",
                r"new\s+balance",
                r"solde\s+précédent",
                r"nouveau\s+solde",
            ],
            &[YyyyMmDd, DdMonthYyyy, MmDdYyyy],
        ),
        BankProfile::new(
            BankCode::Desjardins,
            "Desjardins",
            &["desjardins", "caisse populaire"],
            &[r"^date\s+(?:code\s+)?(?:description|transaction)\s+(?:retraits?|withdrawals?)"],
            &[
                r"solde\s+(?:d')?ouverture",
                r"solde\s+(?:de\s+)?clôture",
                r"opening\s+balance",
                r"closing\s+balance",
            ],
            &[DdMonthYyyy, YyyyMmDd, DdMmYyyy],
        ),
        BankProfile::new(
            BankCode::Tangerine,
            "Tangerine",
            &["tangerine"],
            &[r"^(?:transaction\s+)?date\s+(?:transaction\s+)?description\s+amount"],
            &[r"opening\s+balance", r"closing\s+balance"],
            &[MmDdYyyy, MonthDdYyyy, YyyyMmDd],
        ),
    ];
}

/// All profiles in detection order.
pub fn profiles() -> &'static [BankProfile] {
    &REGISTRY
}

/// Look up the profile for a bank code.
pub fn profile(code: BankCode) -> &'static BankProfile {
    REGISTRY
        .iter()
        .find(|p| p.code == code)
        .unwrap_or(&REGISTRY[0])
}

/// Resolve a caller hint (code, name, or keyword) to a profile.
pub fn resolve_hint(hint: &str) -> Option<&'static BankProfile> {
    REGISTRY.iter().find(|p| p.matches_hint(hint))
}

/// Detect the issuing bank.
///
/// A hint that resolves to a profile wins; otherwise the first profile
/// whose keywords appear in the text.
pub fn detect_bank(text: &str, hint: Option<&str>) -> Option<&'static BankProfile> {
    if let Some(hint) = hint {
        if let Some(profile) = resolve_hint(hint) {
            debug!("Bank hint '{}' resolved to {}", hint, profile.code);
            return Some(profile);
        }
        debug!("Bank hint '{}' not recognized, detecting from text", hint);
    }

    let detected = REGISTRY.iter().find(|p| p.matches_text(text));
    if let Some(profile) = detected {
        debug!("Detected bank {}", profile.code);
    }
    detected
}
