//! OCR text cleanup.

/// Punctuation kept verbatim; everything else that is not alphanumeric or
/// whitespace becomes a space.
const ALLOWED_PUNCTUATION: &[char] = &[
    '.', ',', ':', ';', '/', '-', '$', '(', ')', '#', '&', '\'', '"', '@', '%', '+', '*', '_',
    '!', '?', '[', ']',
];

/// Normalize raw OCR text.
///
/// Line endings become `\n`, stray symbols become spaces, and whitespace is
/// collapsed per line: a single blank stays one space while any wider gap
/// (or a tab) becomes exactly two spaces, so table columns remain separable.
/// Consecutive blank lines collapse to one.
pub fn normalize_text(raw: &str) -> String {
    let unified = unify_line_endings(raw);

    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for line in unified.split('\n') {
        let cleaned = collapse_line(line);
        if cleaned.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(cleaned);
            previous_blank = false;
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Convert `\r\n` and lone `\r` line endings to `\n`, leaving the rest intact.
///
/// Column positions survive, which table layout parsing relies on.
pub fn unify_line_endings(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

fn collapse_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut gap = 0usize;
    let mut saw_tab = false;
    let mut replaced = false;

    for c in line.chars() {
        if !is_allowed(c) {
            replaced = true;
            continue;
        }

        if c.is_whitespace() {
            gap += 1;
            saw_tab |= c == '\t';
            continue;
        }

        if (gap > 0 || replaced) && !out.is_empty() {
            out.push_str(if gap >= 2 || saw_tab { "  " } else { " " });
        }
        gap = 0;
        saw_tab = false;
        replaced = false;
        out.push(c);
    }

    out
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(&c)
}
