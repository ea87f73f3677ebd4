//! Date extraction for statement text.
//!
//! Numeric dates written with slashes are ambiguous between month-first and
//! day-first layouts. A first token above 12 can only be a day, a second
//! token above 12 can only be a day, and anything else is read month-first.
//! That last rule is a North-American default; it will misread day-first
//! statements whose day is 12 or less.

use regex::{Captures, Regex};

use super::patterns::{month_number, DATE_DAY_FIRST, DATE_ISO, DATE_MONTH_FIRST, DATE_NUMERIC};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::statement::{CalendarDate, DateFormat, ExtractedDate};

/// Confidence for dates found by pattern scanning.
pub const PATTERN_DATE_CONFIDENCE: u8 = 85;

/// Confidence for dates read with a bank profile's declared format.
pub const PROFILE_DATE_CONFIDENCE: u8 = 95;

/// A parsed date together with the layout it was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateValue {
    pub date: CalendarDate,
    pub format: DateFormat,
}

impl From<ExtractionMatch<DateValue>> for ExtractedDate {
    fn from(m: ExtractionMatch<DateValue>) -> Self {
        ExtractedDate {
            raw_text: m.source,
            date: m.value.date,
            format: m.value.format,
            confidence: m.confidence,
        }
    }
}

type DateParser = fn(&Captures) -> Option<DateValue>;

/// Patterns in the order they are tried.
fn date_patterns() -> [(&'static Regex, DateParser); 4] {
    [
        (&*DATE_NUMERIC, parse_numeric),
        (&*DATE_ISO, parse_iso),
        (&*DATE_MONTH_FIRST, parse_month_first),
        (&*DATE_DAY_FIRST, parse_day_first),
    ]
}

/// Date field extractor.
pub struct DateExtractor {
    confidence: u8,
}

impl DateExtractor {
    pub fn new() -> Self {
        Self {
            confidence: PATTERN_DATE_CONFIDENCE,
        }
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<DateValue>;

    /// First valid date of the first pattern that yields one.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        for (pattern, parse) in date_patterns() {
            for caps in pattern.captures_iter(text) {
                if let Some(value) = parse(&caps) {
                    return Some(self.to_match(value, &caps));
                }
            }
        }
        None
    }

    /// Every valid date in text order. Where two patterns overlap the
    /// earlier pattern keeps the span.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for (pattern, parse) in date_patterns() {
            for caps in pattern.captures_iter(text) {
                let full_match = caps.get(0).unwrap();
                if results
                    .iter()
                    .any(|r| r.overlaps(full_match.start(), full_match.end()))
                {
                    continue;
                }
                if let Some(value) = parse(&caps) {
                    results.push(self.to_match(value, &caps));
                }
            }
        }

        results.sort_by_key(|r| r.position.map(|(start, _)| start));
        results
    }
}

impl DateExtractor {
    fn to_match(&self, value: DateValue, caps: &Captures) -> ExtractionMatch<DateValue> {
        let full_match = caps.get(0).unwrap();
        ExtractionMatch::new(value, self.confidence, full_match.as_str())
            .with_position(full_match.start(), full_match.end())
    }
}

/// Resolve the two leading tokens of a slash date into (month, day, format).
pub fn disambiguate_numeric(first: u32, second: u32) -> (u32, u32, DateFormat) {
    if first > 12 {
        (second, first, DateFormat::DdMmYyyy)
    } else {
        // Covers both "second > 12" and the ambiguous default.
        (first, second, DateFormat::MmDdYyyy)
    }
}

/// Parse a whole cell using one explicitly declared format.
///
/// Unlike scanning, slash dates are not disambiguated here: the format says
/// which token is the month.
pub fn parse_date_with_format(text: &str, format: DateFormat) -> Option<CalendarDate> {
    let text = text.trim();
    let pattern: &Regex = match format {
        DateFormat::MmDdYyyy | DateFormat::DdMmYyyy => &*DATE_NUMERIC,
        DateFormat::YyyyMmDd => &*DATE_ISO,
        DateFormat::MonthDdYyyy => &*DATE_MONTH_FIRST,
        DateFormat::DdMonthYyyy => &*DATE_DAY_FIRST,
    };

    let caps = pattern.captures(text)?;
    let full_match = caps.get(0)?;
    if full_match.start() != 0 || full_match.end() != text.len() {
        return None;
    }

    match format {
        DateFormat::MmDdYyyy => {
            CalendarDate::new(number(&caps, 3)? as i32, number(&caps, 1)?, number(&caps, 2)?)
        }
        DateFormat::DdMmYyyy => {
            CalendarDate::new(number(&caps, 3)? as i32, number(&caps, 2)?, number(&caps, 1)?)
        }
        DateFormat::YyyyMmDd => parse_iso(&caps).map(|v| v.date),
        DateFormat::MonthDdYyyy => parse_month_first(&caps).map(|v| v.date),
        DateFormat::DdMonthYyyy => parse_day_first(&caps).map(|v| v.date),
    }
}

fn number(caps: &Captures, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

fn parse_numeric(caps: &Captures) -> Option<DateValue> {
    let (month, day, format) = disambiguate_numeric(number(caps, 1)?, number(caps, 2)?);
    let date = CalendarDate::new(number(caps, 3)? as i32, month, day)?;
    Some(DateValue { date, format })
}

fn parse_iso(caps: &Captures) -> Option<DateValue> {
    let date = CalendarDate::new(number(caps, 1)? as i32, number(caps, 2)?, number(caps, 3)?)?;
    Some(DateValue {
        date,
        format: DateFormat::YyyyMmDd,
    })
}

fn parse_month_first(caps: &Captures) -> Option<DateValue> {
    let month = month_number(caps.get(1)?.as_str())?;
    let date = CalendarDate::new(number(caps, 3)? as i32, month, number(caps, 2)?)?;
    Some(DateValue {
        date,
        format: DateFormat::MonthDdYyyy,
    })
}

fn parse_day_first(caps: &Captures) -> Option<DateValue> {
    let month = month_number(caps.get(2)?.as_str())?;
    let date = CalendarDate::new(number(caps, 3)? as i32, month, number(caps, 1)?)?;
    Some(DateValue {
        date,
        format: DateFormat::DdMonthYyyy,
    })
}
