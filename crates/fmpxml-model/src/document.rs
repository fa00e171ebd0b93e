//! Singleton document metadata: error code, product, database, fields.

use serde::{Deserialize, Serialize};

/// The export-wide status code from the `ERRORCODE` text node.
///
/// Zero means the export completed without errors; anything else is a
/// FileMaker error number. The parser rejects non-integer text outright,
/// so the value is always a real number here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i64);

/// Identity of the exporting application, from the `PRODUCT` element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub build: String,
    pub name: String,
    pub version: String,
}

/// Export-level metadata from the `DATABASE` element.
///
/// `date_format` and `time_format` are FileMaker layout patterns
/// (e.g. `M/d/yyyy`, `h:mm:ss a`) and drive how DATE/TIME/TIMESTAMP data
/// is parsed. `records` is the declared record count; it is informational
/// and never used to validate the result set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub date_format: String,
    pub time_format: String,
    pub layout: String,
    pub name: String,
    pub records: i64,
}

/// One column's type contract from a `FIELD` element.
///
/// `max_repeat == 1` declares a scalar column; anything else declares a
/// repeating (array) column. `field_type` is kept as the raw TYPE string
/// so unrecognized types survive serialization unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "emptyOK")]
    pub empty_ok: bool,
    #[serde(rename = "maxRepeat")]
    pub max_repeat: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_serializes_with_wire_names() {
        let db = Database {
            date_format: "M/d/yyyy".to_string(),
            time_format: "h:mm:ss a".to_string(),
            layout: "summary".to_string(),
            name: "people".to_string(),
            records: 42,
        };

        let value = serde_json::to_value(&db).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "dateFormat": "M/d/yyyy",
                "timeFormat": "h:mm:ss a",
                "layout": "summary",
                "name": "people",
                "records": 42,
            })
        );
    }

    #[test]
    fn test_field_serializes_with_wire_names() {
        let field = Field {
            empty_ok: true,
            max_repeat: 2,
            name: "Email".to_string(),
            field_type: "TEXT".to_string(),
        };

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "emptyOK": true,
                "maxRepeat": 2,
                "name": "Email",
                "type": "TEXT",
            })
        );
    }

    #[test]
    fn test_error_code_is_transparent() {
        let value = serde_json::to_value(ErrorCode(0)).unwrap();
        assert_eq!(value, serde_json::json!(0));
    }

    #[test]
    fn test_unrecognized_field_type_round_trips() {
        let field = Field {
            field_type: "CONTAINER".to_string(),
            ..Field::default()
        };

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "CONTAINER");
    }
}
