//! Per-field encoders: type dispatch plus cardinality guards.
//!
//! A `FieldEncoder` is the compiled form of one FIELD declaration. Building
//! one resolves the field's TYPE to a datum conversion and its MAXREPEAT to
//! a scalar or array guard; encoding then turns a whole column (the list of
//! DATA strings for one row) into a single JSON value.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use fmpxml_model::Field;

use crate::error::EncodeError;
use crate::layout::{TemporalLayouts, CANONICAL_DATE, CANONICAL_TIME, CANONICAL_TIMESTAMP};
use crate::number::{encode_number, NumberMode};

/// The recognized TYPE values. Anything else encodes as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Time,
    Timestamp,
    Other,
}

impl FieldKind {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "TEXT" => FieldKind::Text,
            "NUMBER" => FieldKind::Number,
            "DATE" => FieldKind::Date,
            "TIME" => FieldKind::Time,
            "TIMESTAMP" => FieldKind::Timestamp,
            _ => FieldKind::Other,
        }
    }
}

/// Scalar or repeating, from the field's MAXREPEAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Scalar,
    Array,
}

impl Cardinality {
    pub fn from_max_repeat(max_repeat: i64) -> Self {
        if max_repeat == 1 {
            Cardinality::Scalar
        } else {
            Cardinality::Array
        }
    }
}

/// Converts one datum string into one JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum DatumEncoder {
    Text,
    Number(NumberMode),
    Date(String),
    Time(String),
    Timestamp(String),
}

impl DatumEncoder {
    /// Pick the conversion for a field kind, binding the temporal layouts
    /// and numeric mode it will need.
    pub fn for_kind(kind: FieldKind, layouts: &TemporalLayouts, numbers: NumberMode) -> Self {
        match kind {
            FieldKind::Number => DatumEncoder::Number(numbers),
            FieldKind::Date => DatumEncoder::Date(layouts.date.clone()),
            FieldKind::Time => DatumEncoder::Time(layouts.time.clone()),
            FieldKind::Timestamp => DatumEncoder::Timestamp(layouts.timestamp.clone()),
            FieldKind::Text | FieldKind::Other => DatumEncoder::Text,
        }
    }

    /// Encode a single datum.
    pub fn encode(&self, datum: &str) -> Result<Value, EncodeError> {
        match self {
            DatumEncoder::Text => Ok(Value::String(datum.to_string())),
            DatumEncoder::Number(mode) => encode_number(datum, *mode),
            DatumEncoder::Date(layout) => {
                let date = parse_temporal(datum, layout, NaiveDate::parse_from_str)?;
                Ok(Value::String(date.format(CANONICAL_DATE).to_string()))
            }
            DatumEncoder::Time(layout) => {
                let time = parse_temporal(datum, layout, NaiveTime::parse_from_str)?;
                Ok(Value::String(time.format(CANONICAL_TIME).to_string()))
            }
            DatumEncoder::Timestamp(layout) => {
                let ts = parse_temporal(datum, layout, NaiveDateTime::parse_from_str)?;
                Ok(Value::String(ts.format(CANONICAL_TIMESTAMP).to_string()))
            }
        }
    }
}

fn parse_temporal<T>(
    datum: &str,
    layout: &str,
    parse: impl Fn(&str, &str) -> chrono::ParseResult<T>,
) -> Result<T, EncodeError> {
    if layout.is_empty() {
        return Err(EncodeError::MissingLayout);
    }

    parse(datum, layout).map_err(|source| EncodeError::DateTimeParse {
        input: datum.to_string(),
        layout: layout.to_string(),
        source,
    })
}

/// The compiled encoder for one declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEncoder {
    name: String,
    cardinality: Cardinality,
    datum: DatumEncoder,
}

impl FieldEncoder {
    pub fn new(field: &Field, layouts: &TemporalLayouts, numbers: NumberMode) -> Self {
        let kind = FieldKind::from_type_name(&field.field_type);

        FieldEncoder {
            name: field.name.clone(),
            cardinality: Cardinality::from_max_repeat(field.max_repeat),
            datum: DatumEncoder::for_kind(kind, layouts, numbers),
        }
    }

    /// The declared field name, which becomes the record key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encode a whole column for one row.
    ///
    /// Scalar fields map an empty column to null, a single datum to its
    /// converted value, and anything longer to a cardinality error. Array
    /// fields convert every datum in order; one bad datum fails the column.
    pub fn encode(&self, column: &[String]) -> Result<Value, EncodeError> {
        match self.cardinality {
            Cardinality::Scalar => match column {
                [] => Ok(Value::Null),
                [datum] => self.datum.encode(datum),
                _ => Err(EncodeError::MultipleScalarValues {
                    count: column.len(),
                }),
            },
            Cardinality::Array => {
                let items = column
                    .iter()
                    .map(|datum| self.datum.encode(datum))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(items))
            }
        }
    }
}

/// Compile the encoder table for a closed field list.
pub fn build_encoders(
    fields: &[Field],
    layouts: &TemporalLayouts,
    numbers: NumberMode,
) -> Vec<FieldEncoder> {
    fields
        .iter()
        .map(|field| FieldEncoder::new(field, layouts, numbers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, field_type: &str, max_repeat: i64) -> Field {
        Field {
            name: name.to_string(),
            field_type: field_type.to_string(),
            max_repeat,
            empty_ok: true,
        }
    }

    fn layouts() -> TemporalLayouts {
        TemporalLayouts::from_formats("M/d/yyyy", "h:mm:ss a")
    }

    fn strings(data: &[&str]) -> Vec<String> {
        data.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scalar_cardinality_guard() {
        let enc = FieldEncoder::new(&field("First", "TEXT", 1), &layouts(), NumberMode::Parse);

        assert_eq!(enc.encode(&[]).unwrap(), Value::Null);
        assert_eq!(enc.encode(&strings(&["Adam"])).unwrap(), json!("Adam"));
        assert!(matches!(
            enc.encode(&strings(&["a", "b"])),
            Err(EncodeError::MultipleScalarValues { count: 2 })
        ));
    }

    #[test]
    fn test_array_guard_preserves_length_and_order() {
        let enc = FieldEncoder::new(&field("Email", "TEXT", 2), &layouts(), NumberMode::Parse);

        assert_eq!(enc.encode(&[]).unwrap(), json!([]));
        assert_eq!(
            enc.encode(&strings(&["a@example.org", "b@example.org"]))
                .unwrap(),
            json!(["a@example.org", "b@example.org"])
        );
    }

    #[test]
    fn test_array_failure_aborts_column() {
        let enc = FieldEncoder::new(&field("Nums", "NUMBER", 3), &layouts(), NumberMode::Parse);

        assert!(matches!(
            enc.encode(&strings(&["1", "pie", "3"])),
            Err(EncodeError::NumberDecode { .. })
        ));
    }

    #[test]
    fn test_number_array_mixes_ints_and_floats() {
        let enc = FieldEncoder::new(&field("Nums", "NUMBER", 2), &layouts(), NumberMode::Parse);

        let value = enc.encode(&strings(&["42", "41.1"])).unwrap();
        assert_eq!(value.to_string(), "[42,41.1]");
    }

    #[test]
    fn test_date_round_trip() {
        let enc = FieldEncoder::new(&field("Birthday", "DATE", 1), &layouts(), NumberMode::Parse);

        assert_eq!(
            enc.encode(&strings(&["1/11/1986"])).unwrap(),
            json!("1986-01-11")
        );
    }

    #[test]
    fn test_time_round_trip_is_24_hour() {
        let enc = FieldEncoder::new(&field("At", "TIME", 1), &layouts(), NumberMode::Parse);

        assert_eq!(
            enc.encode(&strings(&["8:09:21 PM"])).unwrap(),
            json!("20:09:21")
        );
        assert_eq!(
            enc.encode(&strings(&["8:09:21 AM"])).unwrap(),
            json!("08:09:21")
        );
    }

    #[test]
    fn test_timestamp_round_trip_joins_with_t() {
        let enc = FieldEncoder::new(&field("Seen", "TIMESTAMP", 1), &layouts(), NumberMode::Parse);

        assert_eq!(
            enc.encode(&strings(&["1/11/1986 8:09:21 PM"])).unwrap(),
            json!("1986-01-11T20:09:21")
        );
    }

    #[test]
    fn test_bad_date_reports_input_and_layout() {
        let enc = FieldEncoder::new(&field("Birthday", "DATE", 1), &layouts(), NumberMode::Parse);

        match enc.encode(&strings(&["pie"])) {
            Err(EncodeError::DateTimeParse { input, layout, .. }) => {
                assert_eq!(input, "pie");
                assert_eq!(layout, "%-m/%-d/%Y");
            }
            other => panic!("expected date parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_layout_is_an_error() {
        let empty = TemporalLayouts::default();
        let enc = FieldEncoder::new(&field("Birthday", "DATE", 1), &empty, NumberMode::Parse);

        assert!(matches!(
            enc.encode(&strings(&["1/11/1986"])),
            Err(EncodeError::MissingLayout)
        ));
    }

    #[test]
    fn test_unrecognized_type_encodes_as_text() {
        let enc = FieldEncoder::new(&field("Blob", "CONTAINER", 1), &layouts(), NumberMode::Parse);

        assert_eq!(enc.encode(&strings(&["raw"])).unwrap(), json!("raw"));
    }

    #[test]
    fn test_zero_max_repeat_is_an_array() {
        let enc = FieldEncoder::new(&field("Odd", "TEXT", 0), &layouts(), NumberMode::Parse);

        assert_eq!(enc.encode(&strings(&["x"])).unwrap(), json!(["x"]));
    }
}
