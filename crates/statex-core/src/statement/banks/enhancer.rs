//! Profile-driven re-parsing of statement tables.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::{BalanceKind, BankProfile};
use crate::models::statement::{ExtractedAmount, ExtractedDate, Transaction, TransactionType};
use crate::statement::generic::find_reference;
use crate::statement::rules::dates::PROFILE_DATE_CONFIDENCE;
use crate::statement::rules::patterns::{AMOUNT_CELL, COLUMN_GAP};
use crate::statement::rules::{detect_currency, parse_amount_text, parse_date_with_format};

/// Confidence of a row read from a recognized table.
pub const ENHANCED_CONFIDENCE: u8 = 85;

/// Confidence of amounts read from a recognized table.
pub const ENHANCED_AMOUNT_CONFIDENCE: u8 = 90;

/// Words that end the transaction table.
const SENTINELS: &[&str] = &["summary", "total", "balance forward"];

const CREDIT_LABELS: &[&str] = &["credit", "deposit", "dépôt", "crédit"];
const DEBIT_LABELS: &[&str] = &["debit", "withdraw", "cheque", "retrait", "débit", "deducted"];

/// A column cell with its byte offset in the line.
#[derive(Debug, Clone, Copy)]
struct Cell<'a> {
    start: usize,
    text: &'a str,
}

impl Cell<'_> {
    fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Split a line into cells on tabs or runs of two or more spaces.
fn split_columns(line: &str) -> Vec<Cell<'_>> {
    let mut cells = Vec::new();
    let mut cursor = 0;
    for gap in COLUMN_GAP.find_iter(line) {
        push_cell(&mut cells, line, cursor, gap.start());
        cursor = gap.end();
    }
    push_cell(&mut cells, line, cursor, line.len());
    cells
}

fn push_cell<'a>(cells: &mut Vec<Cell<'a>>, line: &'a str, start: usize, end: usize) {
    let raw = &line[start..end];
    let text = raw.trim();
    if !text.is_empty() {
        let leading = raw.len() - raw.trim_start().len();
        cells.push(Cell {
            start: start + leading,
            text,
        });
    }
}

/// Lines with the byte offset where each starts.
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split('\n').scan(0, |offset, line| {
        let start = *offset;
        *offset += line.len() + 1;
        Some((start, line))
    })
}

fn is_sentinel(line: &str) -> bool {
    let lower = line.to_lowercase();
    SENTINELS.iter().any(|s| lower.contains(s))
}

/// Column labels of the header line, positioned like the row cells.
struct Header<'a> {
    cells: Vec<Cell<'a>>,
}

impl<'a> Header<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            cells: split_columns(line),
        }
    }

    /// Label of the header column sitting over the given span.
    fn label_over(&self, cell: &Cell<'_>) -> Option<String> {
        if self.cells.len() < 2 {
            return None;
        }
        self.cells
            .iter()
            .find(|h| h.start < cell.end() && cell.start < h.end())
            .map(|h| h.text.to_lowercase())
    }
}

/// Transaction direction from cell markers, then the column label.
fn classify_amount(cell: &str, label: Option<&str>) -> TransactionType {
    let upper = cell.to_uppercase();
    if upper.ends_with("CR") {
        return TransactionType::Credit;
    }
    if upper.ends_with("DR") || cell.contains('-') || cell.starts_with('(') {
        return TransactionType::Debit;
    }

    match label {
        Some(label) if CREDIT_LABELS.iter().any(|l| label.contains(l)) => TransactionType::Credit,
        Some(label) if DEBIT_LABELS.iter().any(|l| label.contains(l)) => TransactionType::Debit,
        _ => TransactionType::Debit,
    }
}

impl BankProfile {
    /// Parse a date cell using only this bank's declared formats.
    pub fn parse_date(&self, cell: &str) -> Option<ExtractedDate> {
        self.date_formats.iter().find_map(|format| {
            parse_date_with_format(cell, *format).map(|date| ExtractedDate {
                raw_text: cell.trim().to_string(),
                date,
                format: *format,
                confidence: PROFILE_DATE_CONFIDENCE,
            })
        })
    }

    /// Re-parse the transaction table that follows this bank's header.
    ///
    /// `text` should keep its original spacing: header labels are matched to
    /// amount cells by column position. Returns nothing when no header line
    /// is present.
    pub fn extract_transactions(&self, text: &str) -> Vec<Transaction> {
        let mut lines = lines_with_offsets(text);
        let Some((_, header_line)) = lines.find(|(_, line)| self.is_header(line.trim())) else {
            return Vec::new();
        };
        debug!("Found {} transaction header: {}", self.code, header_line.trim());
        let header = Header::new(header_line);

        let mut transactions = Vec::new();
        for (line_offset, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            if is_sentinel(line) {
                debug!("Transaction table ended at: {}", line.trim());
                break;
            }
            match self.parse_row(line, line_offset, &header) {
                Some(tx) => transactions.push(tx),
                None => trace!("Skipping non-transaction row: {}", line.trim()),
            }
        }

        transactions
    }

    fn parse_row(&self, line: &str, line_offset: usize, header: &Header<'_>) -> Option<Transaction> {
        let cells = split_columns(line);
        if cells.len() < 3 {
            return None;
        }

        let date = self.parse_date(cells[0].text)?;
        let description = cells[1].text.to_string();

        let amount_cells: Vec<&Cell<'_>> = cells[2..]
            .iter()
            .filter(|c| AMOUNT_CELL.is_match(c.text))
            .collect();

        let (amount_cell, balance_cell) = match amount_cells.as_slice() {
            [] => return None,
            [only] => (*only, None),
            [.., amount, balance] => (*amount, Some(*balance)),
        };

        let value = parse_amount_text(amount_cell.text)?.abs();
        if value == Decimal::ZERO {
            return None;
        }

        let label = header.label_over(amount_cell);
        let transaction_type = classify_amount(amount_cell.text, label.as_deref());

        let amount = self.cell_amount(amount_cell, value, line_offset);
        let running_balance = balance_cell.and_then(|cell| {
            parse_amount_text(cell.text).map(|v| self.cell_amount(cell, v, line_offset))
        });

        Some(Transaction {
            date: Some(date),
            reference: find_reference(&description),
            description,
            amount,
            transaction_type,
            merchant: None,
            suggested_category: None,
            running_balance,
            confidence: ENHANCED_CONFIDENCE,
        })
    }

    fn cell_amount(&self, cell: &Cell<'_>, value: Decimal, line_offset: usize) -> ExtractedAmount {
        ExtractedAmount::new(
            cell.text,
            value,
            detect_currency(cell.text),
            ENHANCED_AMOUNT_CONFIDENCE,
        )
        .with_offset(line_offset + cell.start)
    }

    /// Opening and closing balances found with this bank's labels.
    ///
    /// The first label of each kind that matches wins.
    pub fn extract_balances(&self, text: &str) -> (Option<ExtractedAmount>, Option<ExtractedAmount>) {
        let mut opening = None;
        let mut closing = None;

        for (pattern, kind) in self.balance_patterns() {
            let slot = match kind {
                BalanceKind::Opening => &mut opening,
                BalanceKind::Closing => &mut closing,
            };
            if slot.is_some() {
                continue;
            }

            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            let Some(number) = caps.get(1) else {
                continue;
            };
            if let Some(value) = parse_amount_text(number.as_str()) {
                let raw = caps.get(0).map_or(number.as_str(), |m| m.as_str());
                *slot = Some(
                    ExtractedAmount::new(
                        raw,
                        value,
                        detect_currency(number.as_str()),
                        ENHANCED_AMOUNT_CONFIDENCE,
                    )
                    .with_offset(number.start()),
                );
            }
        }

        (opening, closing)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::models::statement::CalendarDate;
    use crate::statement::banks::{profile, BankCode};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const TD_TEXT: &str = "TD Canada Trust\n\
        Date Transaction Details CAD Balance\n\
        Jan 5, 2024  COFFEE SHOP PURCHASE  4.50  995.50\n\
        Closing Balance ... 995.50";

    #[test]
    fn test_split_columns_offsets() {
        let cells = split_columns("Jan 5, 2024  COFFEE SHOP\t4.50");
        let texts: Vec<&str> = cells.iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["Jan 5, 2024", "COFFEE SHOP", "4.50"]);
        assert_eq!(cells[1].start, 13);
        assert_eq!(cells[2].start, 25);
    }

    #[test]
    fn test_td_row() {
        let txs = profile(BankCode::Td).extract_transactions(TD_TEXT);
        assert_eq!(txs.len(), 1);

        let tx = &txs[0];
        assert_eq!(tx.description, "COFFEE SHOP PURCHASE");
        assert_eq!(tx.amount.amount, dec("4.50"));
        assert_eq!(tx.amount.confidence, ENHANCED_AMOUNT_CONFIDENCE);
        assert_eq!(tx.transaction_type, TransactionType::Debit);
        assert_eq!(tx.confidence, ENHANCED_CONFIDENCE);
        assert_eq!(tx.running_balance.as_ref().unwrap().amount, dec("995.50"));

        let date = tx.date.as_ref().unwrap();
        assert_eq!(date.date, CalendarDate::new(2024, 1, 5).unwrap());
        assert_eq!(date.confidence, PROFILE_DATE_CONFIDENCE);
    }

    #[test]
    fn test_no_header_no_rows() {
        let text = "Jan 5, 2024  COFFEE SHOP PURCHASE  4.50  995.50";
        assert!(profile(BankCode::Td).extract_transactions(text).is_empty());
    }

    #[test]
    fn test_sentinel_stops_scan() {
        let text = "Date Transaction Details CAD Balance\n\
            Jan 5, 2024  COFFEE SHOP  4.50  995.50\n\
            Total  4.50  995.50\n\
            Jan 9, 2024  BOOKSTORE  20.00  975.50";
        let txs = profile(BankCode::Td).extract_transactions(text);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].description, "COFFEE SHOP");
    }

    #[test]
    fn test_profile_formats_only() {
        // Day-first dotted dates are not a TD format.
        let text = "Date Transaction Details CAD Balance\n\
            05.01.2024  COFFEE SHOP  4.50  995.50";
        assert!(profile(BankCode::Td).extract_transactions(text).is_empty());
    }

    #[test]
    fn test_column_labels_set_type() {
        let text = "Date        Description     Withdrawals   Deposits   Balance\n\
            Jan 3, 2024  PAYROLL                      1,200.00   2,200.00\n\
            Jan 4, 2024  GROCERY        85.10                    2,114.90";
        let txs = profile(BankCode::Td).extract_transactions(text);
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].transaction_type, TransactionType::Credit);
        assert_eq!(txs[0].amount.amount, dec("1200.00"));
        assert_eq!(txs[1].transaction_type, TransactionType::Debit);
    }

    #[test]
    fn test_markers_set_type() {
        let text = "Date Transaction Details CAD Balance\n\
            Jan 5, 2024  REFUND  12.00 CR  1,007.50\n\
            Jan 6, 2024  CORRECTION  -3.00  1,004.50";
        let txs = profile(BankCode::Td).extract_transactions(text);
        assert_eq!(txs[0].transaction_type, TransactionType::Credit);
        assert_eq!(txs[1].transaction_type, TransactionType::Debit);
        assert_eq!(txs[1].amount.amount, dec("3.00"));
    }

    #[test]
    fn test_single_amount_defaults_to_debit() {
        let text = "Date Transaction Details CAD Balance\n\
            Jan 5, 2024  SERVICE  9.95";
        let txs = profile(BankCode::Td).extract_transactions(text);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].transaction_type, TransactionType::Debit);
        assert!(txs[0].running_balance.is_none());
    }

    #[test]
    fn test_extract_balances() {
        let text = "Opening Balance  1,000.00\nClosing Balance ... 995.50";
        let (opening, closing) = profile(BankCode::Td).extract_balances(text);
        assert_eq!(opening.unwrap().amount, dec("1000.00"));
        assert_eq!(closing.unwrap().amount, dec("995.50"));
    }

    #[test]
    fn test_balance_label_followed_by_date() {
        let text = "Opening Balance Jan 1, 2024  1,000.00\nClosing Balance on Jan 31, 2024  995.50";
        let (opening, closing) = profile(BankCode::Td).extract_balances(text);
        assert_eq!(opening.unwrap().amount, dec("1000.00"));
        assert_eq!(closing.unwrap().amount, dec("995.50"));
    }
}
