//! FileMaker date/time pattern → chrono strftime translation.
//!
//! The DATABASE element declares how the export wrote its temporal data,
//! using FileMaker's own pattern letters (`M/d/yyyy`, `h:mm:ss a`). Those
//! patterns have to become chrono layouts before any DATE/TIME/TIMESTAMP
//! datum can be parsed.
//!
//! Translation scans the pattern left to right and takes the longest
//! matching rule at each position, so `mm` becomes `%m` in one step and is
//! never re-visited by the single-letter `m` rule. Characters that match no
//! rule pass through as literals (separators like `/` and `:`), except `%`,
//! which is escaped so it cannot be misread as a chrono specifier.

/// Canonical output layout for dates.
pub const CANONICAL_DATE: &str = "%Y-%m-%d";

/// Canonical output layout for times (24-hour).
pub const CANONICAL_TIME: &str = "%H:%M:%S";

/// Canonical output layout for timestamps.
pub const CANONICAL_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S";

// Ordered longest-first within each letter family, so the scanner can try
// rules top to bottom and stop at the first hit.
const DATE_RULES: &[(&str, &str)] = &[
    ("yyyy", "%Y"),
    ("yy", "%y"),
    ("MM", "%m"),
    ("mm", "%m"),
    ("M", "%-m"),
    ("m", "%-m"),
    ("dd", "%d"),
    ("d", "%-d"),
];

const TIME_RULES: &[(&str, &str)] = &[
    ("kk", "%H"),
    ("k", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("a", "%p"),
];

fn translate(pattern: &str, rules: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    'scan: while !rest.is_empty() {
        for (from, to) in rules {
            if let Some(tail) = rest.strip_prefix(from) {
                out.push_str(to);
                rest = tail;
                continue 'scan;
            }
        }

        // No rule matched; copy one literal character.
        let ch = rest.chars().next().unwrap_or_default();
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// Translate a FileMaker date pattern into a chrono layout.
pub fn translate_date_format(pattern: &str) -> String {
    translate(pattern, DATE_RULES)
}

/// Translate a FileMaker time pattern into a chrono layout.
pub fn translate_time_format(pattern: &str) -> String {
    translate(pattern, TIME_RULES)
}

/// The translated chrono layouts for one database's temporal formats.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemporalLayouts {
    pub date: String,
    pub time: String,
    pub timestamp: String,
}

impl TemporalLayouts {
    /// Build the three input layouts from the DATABASE format attributes.
    ///
    /// The timestamp layout is the date and time layouts joined by a single
    /// space. No real timestamp-bearing export has been available to verify
    /// that joining rule, so treat it as a placeholder.
    pub fn from_formats(date_format: &str, time_format: &str) -> Self {
        let date = translate_date_format(date_format);
        let time = translate_time_format(time_format);
        let timestamp = format!("{date} {time}");

        TemporalLayouts {
            date,
            time,
            timestamp,
        }
    }
}
