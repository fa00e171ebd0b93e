//! NUMBER datum encoding.
//!
//! FileMaker does not distinguish integers from floats, so parse mode tries
//! a 64-bit integer first (keeping full precision for large values) and
//! falls back to a float. Raw mode goes further for plain decimal numerals:
//! the datum is validated and embedded verbatim, so an integer wider than
//! 53 bits survives untouched instead of rounding through an f64.

use serde_json::{Number, Value};

use crate::error::EncodeError;

/// How NUMBER data becomes JSON numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberMode {
    /// Integer-then-float parsing. The default.
    #[default]
    Parse,
    /// Embed plain decimal numerals verbatim; parse everything else.
    Raw,
}

/// Encode one NUMBER datum under the given mode.
pub fn encode_number(datum: &str, mode: NumberMode) -> Result<Value, EncodeError> {
    if mode == NumberMode::Raw && is_plain_decimal(datum) {
        // JSON forbids a handful of shapes the validator allows (leading
        // zeros), so a rejected literal falls back to the parsing path.
        if let Ok(n) = datum.parse::<Number>() {
            return Ok(Value::Number(n));
        }
    }

    if let Some(i) = parse_integer(datum) {
        return Ok(Value::Number(Number::from(i)));
    }

    if let Ok(f) = datum.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Ok(Value::Number(n));
        }
    }

    Err(EncodeError::NumberDecode {
        original: datum.to_string(),
    })
}

/// Base-agnostic 64-bit integer parse: `0x`/`0o`/`0b` prefixes (either
/// case) after an optional sign, decimal otherwise. A bare leading zero
/// stays decimal.
fn parse_integer(s: &str) -> Option<i64> {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);

    let radix = match unsigned.get(..2) {
        Some("0x") | Some("0X") => 16,
        Some("0o") | Some("0O") => 8,
        Some("0b") | Some("0B") => 2,
        _ => return s.parse::<i64>().ok(),
    };

    let digits = &unsigned[2..];
    if digits.is_empty() {
        return None;
    }

    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    if s.starts_with('-') {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

/// Whether a datum is a plain decimal numeral: optional leading minus, one
/// or more digits, optionally one decimal point with one or more digits.
fn is_plain_decimal(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };

    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    all_digits(int_part) && frac_part.map_or(true, all_digits)
}
