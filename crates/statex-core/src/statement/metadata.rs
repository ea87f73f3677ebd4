//! Document metadata: text quality, language, statement period, pages.

use lazy_static::lazy_static;
use regex::Regex;

use super::rules::patterns::{PAGE_MARKER, STATEMENT_DATE, STATEMENT_PERIOD};
use super::rules::{DateExtractor, FieldExtractor};
use crate::models::statement::CalendarDate;

/// Texts shorter than this are penalized as likely truncated.
const SHORT_TEXT_LEN: usize = 100;

/// Identical characters repeated this many times signal an OCR artifact.
const ARTIFACT_RUN_LEN: usize = 6;

const FRENCH_VOCABULARY: &[&str] = &[
    "relevé", "solde", "dépôt", "dépôts", "retrait", "retraits", "compte", "montant", "frais",
    "intérêts", "virement", "période", "chèque", "opérations", "crédit", "débit",
];

const ENGLISH_VOCABULARY: &[&str] = &[
    "statement", "balance", "deposit", "deposits", "withdrawal", "withdrawals", "account",
    "amount", "fee", "fees", "interest", "transfer", "period", "cheque", "transactions", "total",
];

lazy_static! {
    static ref FRENCH_WORDS: Vec<Regex> = word_patterns(FRENCH_VOCABULARY);
    static ref ENGLISH_WORDS: Vec<Regex> = word_patterns(ENGLISH_VOCABULARY);
}

fn word_patterns(words: &[&str]) -> Vec<Regex> {
    words
        .iter()
        .map(|w| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(w))).unwrap())
        .collect()
}

/// Heuristic OCR quality score (0 - 100).
///
/// Starts at 100 and loses up to 50 points for the share of non-alphanumeric
/// characters, 30 points for very short text, and 10 points per run of six
/// or more identical visible characters. Whitespace never counts as noise.
pub fn quality_score(text: &str) -> f32 {
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();

    let mut score = 100.0f32;

    if !visible.is_empty() {
        let noise = visible.iter().filter(|c| !c.is_alphanumeric()).count();
        score -= noise as f32 / visible.len() as f32 * 50.0;
    }

    if text.chars().count() < SHORT_TEXT_LEN {
        score -= 30.0;
    }

    score -= 10.0 * repeated_runs(text) as f32;

    score.clamp(0.0, 100.0)
}

fn repeated_runs(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunk_by(|a, b| a == b)
        .filter(|run| run.len() >= ARTIFACT_RUN_LEN && !run[0].is_whitespace())
        .count()
}

/// Guess the document language ("en" or "fr").
///
/// A recognizable hint wins. Otherwise finance vocabulary hits are counted
/// and ties fall back to `default_language`.
pub fn detect_language(text: &str, hint: Option<&str>, default_language: &str) -> String {
    if let Some(language) = hint.and_then(normalize_language) {
        return language.to_string();
    }

    let french = count_hits(&FRENCH_WORDS, text);
    let english = count_hits(&ENGLISH_WORDS, text);

    if french > english {
        "fr".to_string()
    } else if english > french {
        "en".to_string()
    } else {
        default_language.to_string()
    }
}

fn normalize_language(hint: &str) -> Option<&'static str> {
    let hint = hint.trim().to_lowercase();
    if hint.starts_with("fr") {
        Some("fr")
    } else if hint.starts_with("en") {
        Some("en")
    } else {
        None
    }
}

fn count_hits(patterns: &[Regex], text: &str) -> usize {
    patterns.iter().map(|p| p.find_iter(text).count()).sum()
}

/// Statement period from a labelled range, else the span of `dates`.
///
/// `dates` must be sorted chronologically.
pub fn detect_period(
    text: &str,
    dates: &[CalendarDate],
) -> (Option<CalendarDate>, Option<CalendarDate>) {
    let extractor = DateExtractor::new();
    for caps in STATEMENT_PERIOD.captures_iter(text) {
        let start = caps.get(1).and_then(|m| extractor.extract(m.as_str()));
        let end = caps.get(2).and_then(|m| extractor.extract(m.as_str()));
        if let (Some(start), Some(end)) = (start, end) {
            return (Some(start.value.date), Some(end.value.date));
        }
    }

    (dates.first().copied(), dates.last().copied())
}

/// Every date in the text, sorted chronologically.
pub fn sorted_dates(text: &str) -> Vec<CalendarDate> {
    let mut dates: Vec<CalendarDate> = DateExtractor::new()
        .extract_all(text)
        .into_iter()
        .map(|m| m.value.date)
        .collect();
    dates.sort();
    dates
}

/// Date following a `Statement date` label.
pub fn detect_issued_date(text: &str) -> Option<CalendarDate> {
    let extractor = DateExtractor::new();
    STATEMENT_DATE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| extractor.extract(m.as_str()))
        .map(|m| m.value.date)
}

/// Highest page number announced by `Page N of M` / `Page N` markers.
pub fn detect_page_count(text: &str) -> u32 {
    PAGE_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let current: u32 = caps.get(1)?.as_str().parse().ok()?;
            let total = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(current);
            Some(current.max(total))
        })
        .max()
        .unwrap_or(1)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> CalendarDate {
        CalendarDate::new(y, m, d).unwrap()
    }

    #[test]
    fn test_clean_long_text_scores_high() {
        let text = "Your monthly statement lists every deposit and withdrawal made on \
                    this account along with the opening and closing balance figures";
        assert!(text.len() >= 100);
        assert!(quality_score(text) > 95.0);
    }

    #[test]
    fn test_short_text_penalized() {
        let score = quality_score("Deposit received");
        assert!((score - 70.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_repeated_characters_penalized() {
        let clean = quality_score("Deposit received today");
        let noisy = quality_score("Deposit ######## received ~~~~~~~~ today");
        assert!(noisy < clean - 20.0);
    }

    #[test]
    fn test_runs_do_not_span_spaces() {
        assert_eq!(repeated_runs("Reference 11 11 11 confirmed"), 0);
        assert_eq!(repeated_runs("Reference 111111 confirmed"), 1);
        assert_eq!(repeated_runs("Total            due"), 0);
        assert!((quality_score("Reference 11 11 11 confirmed") - 70.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_score_clamped() {
        assert_eq!(quality_score("######|||||||~~~~~~~!!!!!!!@@@@@@@"), 0.0);
    }

    #[test]
    fn test_language_detection() {
        assert_eq!(detect_language("Relevé de compte, solde et retraits", None, "en"), "fr");
        assert_eq!(detect_language("Account statement, balance", None, "en"), "en");
        assert_eq!(detect_language("Compte account", None, "en"), "en");
        assert_eq!(detect_language("Account statement", Some("fr-CA"), "en"), "fr");
        assert_eq!(detect_language("nothing here", Some("de"), "fr"), "fr");
    }

    #[test]
    fn test_labelled_period() {
        let text = "Statement period: Jan 1, 2024 to Jan 31, 2024\nFeb 02, 2024 late fee";
        let (start, end) = detect_period(text, &sorted_dates(text));
        assert_eq!(start, Some(date(2024, 1, 1)));
        assert_eq!(end, Some(date(2024, 1, 31)));
    }

    #[test]
    fn test_period_from_dates() {
        let text = "2024-03-09 late\n2024-03-01 early\n2024-03-05 middle";
        let dates = sorted_dates(text);
        assert_eq!(dates, vec![date(2024, 3, 1), date(2024, 3, 5), date(2024, 3, 9)]);
        assert_eq!(
            detect_period(text, &dates),
            (Some(date(2024, 3, 1)), Some(date(2024, 3, 9)))
        );
    }

    #[test]
    fn test_issued_date() {
        assert_eq!(
            detect_issued_date("Statement date: February 2, 2024"),
            Some(date(2024, 2, 2))
        );
        assert_eq!(detect_issued_date("no label here"), None);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(detect_page_count("Page 1 of 3\n...\nPage 2 of 3"), 3);
        assert_eq!(detect_page_count("Page 1\nPage 2\nPage 4"), 4);
        assert_eq!(detect_page_count("no markers"), 1);
    }
}
