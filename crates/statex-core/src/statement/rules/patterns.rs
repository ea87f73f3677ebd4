//! Common regex patterns for statement extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// English and French month names, full and abbreviated.
const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|\
janvier|février|fevrier|mars|avril|mai|juin|juillet|août|aout|septembre|octobre|novembre|décembre|decembre|\
sept|janv|févr|fevr|avr|juil|déc|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec";

/// Amount body: comma-grouped thousands or plain digits, two decimals.
const AMOUNT_BODY: &str = r"\d{1,3}(?:,\d{3})+\.\d{2}|\d+\.\d{2}";

lazy_static! {
    // Dates, in the order they are tried
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_MONTH_FIRST: Regex = Regex::new(&format!(
        r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"
    )).unwrap();

    pub static ref DATE_DAY_FIRST: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:er)?\s+({MONTHS})\.?,?\s+(\d{{4}})\b"
    )).unwrap();

    // Amounts: marker before, marker after, bare
    pub static ref AMOUNT_MARKER_BEFORE: Regex = Regex::new(
        r"(?i)(CA\$|C\$|US\$|\$|\bCAD\s?\$?|\bUSD\s?\$?)\s?(\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\d+(?:\.\d{2})?)\b"
    ).unwrap();

    pub static ref AMOUNT_MARKER_AFTER: Regex = Regex::new(&format!(
        r"(?i)\b({AMOUNT_BODY}|\d{{1,3}}(?:,\d{{3}})+)\s?(?:(?:CAD|USD)\b|\$)"
    )).unwrap();

    pub static ref AMOUNT_BARE: Regex = Regex::new(&format!(
        r"\b({AMOUNT_BODY})\b"
    )).unwrap();

    /// A whole table cell holding one amount, with optional sign, parentheses,
    /// currency marker, and CR/DR suffix.
    pub static ref AMOUNT_CELL: Regex = Regex::new(
        r"(?i)^\(?-?\s?(?:CA\$|C\$|US\$|\$|CAD\s?|USD\s?)?\s?-?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}\)?\s?-?(?:\s?(?:CR|DR))?$"
    ).unwrap();

    // Account numbers
    pub static ref ACCOUNT_LABEL: Regex = Regex::new(
        r"(?i)\b(?:account|acct|compte)[ \t]*(?:number|no\.?|numéro|num|#|n°)?[ \t]*[:#]?[ \t]*(\d+(?:[ \-]\d+){0,4})\b"
    ).unwrap();

    pub static ref ACCOUNT_GROUPED: Regex = Regex::new(
        r"\b(\d{3,6}(?:[ \-]\d{2,7}){1,3})\b"
    ).unwrap();

    // Account details
    pub static ref ACCOUNT_HOLDER: Regex = Regex::new(
        r"(?im)^\s*(?:account\s+holder|customer\s+name|primary\s+cardholder|titulaire(?:\s+du\s+compte)?)\s*:\s*(.+?)\s*$"
    ).unwrap();

    pub static ref BRANCH: Regex = Regex::new(
        r"(?im)\b(?:branch|transit|succursale)\s*(?:no\.?|number|#)?\s*:\s*(.+?)\s*$"
    ).unwrap();

    // Transaction references
    pub static ref REFERENCE: Regex = Regex::new(
        r"(?i)\b(?:ref(?:erence)?|conf(?:irmation)?)\s*(?:#|no\.?|number)?\s*:?\s*([A-Z0-9][A-Z0-9\-]{3,})"
    ).unwrap();

    // Document metadata
    pub static ref STATEMENT_PERIOD: Regex = Regex::new(
        r"(?im)\b(?:statement\s+period|period\s+covered|période|from|du)\b\s*:?\s*(.+?)\s+(?:to|through|au|-)\s+(.+?)\s*$"
    ).unwrap();

    pub static ref STATEMENT_DATE: Regex = Regex::new(
        r"(?im)(?:statement\s+date|date\s+of\s+statement|date\s+du\s+relevé|issued\s+on)\s*:?\s*(.+?)\s*$"
    ).unwrap();

    pub static ref PAGE_MARKER: Regex = Regex::new(
        r"(?i)\bpage\s+(\d{1,3})(?:\s*(?:of|/|de|sur)\s*(\d{1,3}))?\b"
    ).unwrap();

    // Labelled balances and totals, bank agnostic
    pub static ref OPENING_BALANCE: Regex = Regex::new(
        r"(?i)(?:(?:opening|beginning|previous|starting)\s+balance|solde\s+(?:d'ouverture|précédent|initial)|ancien\s+solde)[^\n]{0,40}?(\(?-?\$?\s?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}\)?)"
    ).unwrap();

    pub static ref CLOSING_BALANCE: Regex = Regex::new(
        r"(?i)(?:(?:closing|ending|new|current|final)\s+balance|solde\s+(?:de\s+clôture|final|actuel)|nouveau\s+solde)[^\n]{0,40}?(\(?-?\$?\s?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}\)?)"
    ).unwrap();

    pub static ref TOTAL_CREDITS: Regex = Regex::new(
        r"(?i)(?:total\s+(?:credits|deposits)|total\s+des\s+(?:dépôts|crédits))[^\n]{0,40}?(\$?\s?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})"
    ).unwrap();

    pub static ref TOTAL_DEBITS: Regex = Regex::new(
        r"(?i)(?:total\s+(?:debits|withdrawals|cheques\s*(?:&|and)\s*debits)|total\s+des\s+(?:retraits|débits))[^\n]{0,40}?(\$?\s?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})"
    ).unwrap();

    /// Column separator for statement tables: a tab or two or more spaces.
    pub static ref COLUMN_GAP: Regex = Regex::new(r"\t+| {2,}").unwrap();

    /// Whitespace runs.
    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Map an English or French month name (full or abbreviated) to its number.
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.trim_end_matches('.').to_lowercase();
    let month = match name.as_str() {
        "january" | "jan" | "janvier" | "janv" => 1,
        "february" | "feb" | "février" | "fevrier" | "févr" | "fevr" => 2,
        "march" | "mar" | "mars" => 3,
        "april" | "apr" | "avril" | "avr" => 4,
        "may" | "mai" => 5,
        "june" | "jun" | "juin" => 6,
        "july" | "jul" | "juillet" | "juil" => 7,
        "august" | "aug" | "août" | "aout" => 8,
        "september" | "sep" | "sept" | "septembre" => 9,
        "october" | "oct" | "octobre" => 10,
        "november" | "nov" | "novembre" => 11,
        "december" | "dec" | "décembre" | "decembre" | "déc" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_number() {
        assert_eq!(month_number("Jan"), Some(1));
        assert_eq!(month_number("SEPT."), Some(9));
        assert_eq!(month_number("juillet"), Some(7));
        assert_eq!(month_number("Août"), Some(8));
        assert_eq!(month_number("Foo"), None);
    }

    #[test]
    fn test_column_gap_split() {
        let cols: Vec<&str> = COLUMN_GAP.split("Jan 5, 2024  COFFEE SHOP\t4.50").collect();
        assert_eq!(cols, vec!["Jan 5, 2024", "COFFEE SHOP", "4.50"]);
    }
}
